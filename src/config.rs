//! # Configuration
//!
//! YAML-driven configuration for the orchestration core with environment
//! variable interpolation and environment-specific overlays.
//!
//! ```yaml
//! # conductor-config.yaml
//! execution:
//!   max_concurrent_tasks: 10
//!   task_timeout_seconds: 300
//!
//! blast_radius:
//!   default_max_depth: 5
//!
//! environments:
//!   test:
//!     execution:
//!       task_timeout_seconds: 2
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::orchestration::errors::{OrchestrationError, OrchestrationResult};

/// Top-level configuration for the orchestration core
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConductorConfig {
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub blast_radius: BlastRadiusConfig,
    #[serde(default)]
    pub events: EventConfig,
    /// Environment-specific overlays applied on top of the base sections
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environments: HashMap<String, EnvironmentOverlay>,
}

/// Execution-related settings consumed by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Upper bound on concurrently running tasks within one group (0 = unbounded)
    pub max_concurrent_tasks: usize,
    /// Per-task wall-clock timeout in seconds (0 = no timeout)
    pub task_timeout_seconds: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 10,
            task_timeout_seconds: 300,
        }
    }
}

impl ExecutionConfig {
    /// Task timeout as a `Duration`, `None` when disabled
    pub fn task_timeout(&self) -> Option<Duration> {
        (self.task_timeout_seconds > 0).then(|| Duration::from_secs(self.task_timeout_seconds))
    }
}

/// Settings for blast radius traversal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlastRadiusConfig {
    /// Depth bound applied when a caller does not request one
    pub default_max_depth: u32,
}

impl Default for BlastRadiusConfig {
    fn default() -> Self {
        Self {
            default_max_depth: 5,
        }
    }
}

/// Settings for the lifecycle event publisher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: crate::constants::system::DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Partial override applied when the matching environment is active
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnvironmentOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionOverlay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blast_radius: Option<BlastRadiusOverlay>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_tasks: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlastRadiusOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_depth: Option<u32>,
}

impl ConductorConfig {
    /// Load configuration from a YAML file, interpolating `${VAR}` references
    /// and applying the overlay for the active environment.
    pub async fn load_from_file(path: impl AsRef<Path>) -> OrchestrationResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            OrchestrationError::configuration(
                path.display().to_string(),
                format!("Failed to read configuration file: {e}"),
            )
        })?;

        let config = Self::load_from_yaml(&content)?;

        info!(
            path = %path.display(),
            max_concurrent_tasks = config.execution.max_concurrent_tasks,
            "Loaded conductor configuration"
        );

        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn load_from_yaml(content: &str) -> OrchestrationResult<Self> {
        let interpolated = Self::interpolate_env_vars(content);
        let mut config: ConductorConfig = serde_yaml::from_str(&interpolated).map_err(|e| {
            OrchestrationError::configuration(
                "yaml_string",
                format!("Failed to parse configuration YAML: {e}"),
            )
        })?;

        let environment = current_environment();
        if let Some(overlay) = config.environments.remove(&environment) {
            debug!(environment = %environment, "Applying environment overlay");
            config.apply_overlay(overlay);
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_overlay(&mut self, overlay: EnvironmentOverlay) {
        if let Some(execution) = overlay.execution {
            if let Some(v) = execution.max_concurrent_tasks {
                self.execution.max_concurrent_tasks = v;
            }
            if let Some(v) = execution.task_timeout_seconds {
                self.execution.task_timeout_seconds = v;
            }
        }
        if let Some(blast_radius) = overlay.blast_radius {
            if let Some(v) = blast_radius.default_max_depth {
                self.blast_radius.default_max_depth = v;
            }
        }
    }

    /// Interpolate environment variables in configuration strings
    fn interpolate_env_vars(template: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
        re.replace_all(template, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{var_name}}}"))
        })
        .to_string()
    }

    /// Validate configuration invariants
    pub fn validate(&self) -> OrchestrationResult<()> {
        if self.events.channel_capacity == 0 {
            return Err(OrchestrationError::configuration(
                "events.channel_capacity",
                "Event channel capacity must be greater than zero",
            ));
        }
        if self.blast_radius.default_max_depth == 0 {
            return Err(OrchestrationError::configuration(
                "blast_radius.default_max_depth",
                "Default blast radius depth must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Active environment name (`CONDUCTOR_ENV`, falling back to `APP_ENV`)
pub fn current_environment() -> String {
    std::env::var("CONDUCTOR_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConductorConfig::default();
        assert_eq!(config.execution.max_concurrent_tasks, 10);
        assert_eq!(config.execution.task_timeout_seconds, 300);
        assert_eq!(config.blast_radius.default_max_depth, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
execution:
  max_concurrent_tasks: 4
  task_timeout_seconds: 30
blast_radius:
  default_max_depth: 3
"#;
        let config = ConductorConfig::load_from_yaml(yaml).unwrap();
        assert_eq!(config.execution.max_concurrent_tasks, 4);
        assert_eq!(config.execution.task_timeout_seconds, 30);
        assert_eq!(config.blast_radius.default_max_depth, 3);
    }

    #[test]
    fn test_env_var_interpolation() {
        std::env::set_var("CONDUCTOR_TEST_TIMEOUT", "17");
        let yaml = r#"
execution:
  task_timeout_seconds: ${CONDUCTOR_TEST_TIMEOUT}
"#;
        let config = ConductorConfig::load_from_yaml(yaml).unwrap();
        assert_eq!(config.execution.task_timeout_seconds, 17);
        std::env::remove_var("CONDUCTOR_TEST_TIMEOUT");
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = ExecutionConfig {
            max_concurrent_tasks: 1,
            task_timeout_seconds: 0,
        };
        assert!(config.task_timeout().is_none());
    }

    #[test]
    fn test_invalid_capacity_rejected() {
        let yaml = r#"
events:
  channel_capacity: 0
"#;
        let err = ConductorConfig::load_from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "execution:\n  max_concurrent_tasks: 2").unwrap();
        let config = ConductorConfig::load_from_file(file.path()).await.unwrap();
        assert_eq!(config.execution.max_concurrent_tasks, 2);
    }
}
