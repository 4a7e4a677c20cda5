//! # Workflow Orchestrator
//!
//! Executes a validated execution graph: groups run in dependency order,
//! tasks within a group run concurrently, and a strict barrier separates
//! groups. Each task's input is resolved against the accumulated execution
//! context immediately before dispatch, which is safe because every
//! dependency completed in a strictly earlier group.
//!
//! Failure semantics: a dispatched task's failure is a captured outcome on
//! its execution record, never an unwound error. When any task in a group
//! fails, groups after it are not started, but siblings already dispatched
//! in the failing group run to their terminal state and their results are
//! recorded. Control flow decides from recorded status, not exceptions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ConductorConfig;
use crate::constants::ExecutionStatus;
use crate::events::EventPublisher;
use crate::models::execution::{ExecutionRecord, TaskExecutionRecord};
use crate::models::workflow::WorkflowDefinition;
use crate::orchestration::errors::{OrchestrationError, OrchestrationResult};
use crate::orchestration::graph_builder::ExecutionGraph;
use crate::orchestration::task_executor::TaskExecutor;
use crate::orchestration::template;
use crate::orchestration::types::{ExecutionContext, TaskInvocation, TaskOutput};

/// Configuration for workflow execution
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on concurrently running tasks within one group (0 = unbounded)
    pub max_concurrent_tasks: usize,
    /// Per-task wall-clock deadline; a timed-out task is a failed task
    pub task_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 10,
            task_timeout: Some(Duration::from_secs(300)),
        }
    }
}

impl OrchestratorConfig {
    /// Configuration with short timeouts for tests
    pub fn for_testing() -> Self {
        Self {
            max_concurrent_tasks: 4,
            task_timeout: Some(Duration::from_secs(2)),
        }
    }
}

impl From<&ConductorConfig> for OrchestratorConfig {
    fn from(config: &ConductorConfig) -> Self {
        Self {
            max_concurrent_tasks: config.execution.max_concurrent_tasks,
            task_timeout: config.execution.task_timeout(),
        }
    }
}

/// Outcome of one dispatched task, produced inside its spawned future
struct DispatchOutcome {
    started_at: chrono::DateTime<Utc>,
    duration: Duration,
    invocation: TaskInvocation,
}

/// Main orchestration engine: executes execution graphs group by group
pub struct WorkflowOrchestrator {
    executor: Arc<dyn TaskExecutor>,
    recorder: Arc<dyn crate::orchestration::recorder::ExecutionRecorder>,
    event_publisher: EventPublisher,
    config: OrchestratorConfig,
}

impl WorkflowOrchestrator {
    /// Create an orchestrator with default configuration
    pub fn new(
        executor: Arc<dyn TaskExecutor>,
        recorder: Arc<dyn crate::orchestration::recorder::ExecutionRecorder>,
    ) -> Self {
        Self::with_config(
            executor,
            recorder,
            EventPublisher::default(),
            OrchestratorConfig::default(),
        )
    }

    /// Create an orchestrator with explicit collaborators and configuration
    pub fn with_config(
        executor: Arc<dyn TaskExecutor>,
        recorder: Arc<dyn crate::orchestration::recorder::ExecutionRecorder>,
        event_publisher: EventPublisher,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            executor,
            recorder,
            event_publisher,
            config,
        }
    }

    /// Execute a workflow against a pre-built execution graph.
    ///
    /// Returns the finalized execution record; it has also been handed to
    /// the execution recorder by the time this returns. A task-level failure
    /// yields a `Failed` record, not an `Err` -- errors are reserved for the
    /// orchestration machinery itself.
    #[instrument(skip_all, fields(workflow = %workflow.name))]
    pub async fn execute(
        &self,
        graph: &ExecutionGraph,
        workflow: &WorkflowDefinition,
        input: Value,
    ) -> OrchestrationResult<ExecutionRecord> {
        let mut ctx = ExecutionContext::new(input);
        let mut record = ExecutionRecord::started(&workflow.name);
        let execution_id = record.execution_id;

        info!(
            execution_id = %execution_id,
            groups = graph.groups().len(),
            tasks = graph.task_count(),
            "Starting workflow execution"
        );

        self.event_publisher
            .publish_execution_started(execution_id, &workflow.name, graph.groups().len())
            .await?;

        let semaphore = (self.config.max_concurrent_tasks > 0)
            .then(|| Arc::new(Semaphore::new(self.config.max_concurrent_tasks)));

        let mut group_failed = false;
        for (group_index, group) in graph.groups().iter().enumerate() {
            debug!(
                execution_id = %execution_id,
                group_index,
                task_count = group.tasks.len(),
                "Dispatching execution group"
            );

            let outcomes = self
                .run_group(workflow, &group.tasks, &ctx, semaphore.clone())
                .await?;

            for (task_id, task_ref, outcome) in outcomes {
                if !outcome.invocation.is_success() {
                    group_failed = true;
                    warn!(
                        execution_id = %execution_id,
                        task_id = %task_id,
                        error = outcome.invocation.error.as_deref().unwrap_or("unknown"),
                        "Task failed"
                    );
                }

                ctx.insert_output(
                    &task_id,
                    TaskOutput {
                        status: outcome.invocation.status,
                        value: outcome.invocation.output.clone(),
                    },
                );

                let duration_ms = outcome.duration.as_millis() as u64;
                self.event_publisher
                    .publish_task_completed(
                        execution_id,
                        &task_id,
                        outcome.invocation.status,
                        duration_ms,
                    )
                    .await?;

                let succeeded = outcome.invocation.is_success();
                record.record_task(TaskExecutionRecord {
                    task_id,
                    task_ref,
                    status: outcome.invocation.status,
                    output: succeeded.then_some(outcome.invocation.output),
                    error: outcome.invocation.error,
                    started_at: outcome.started_at,
                    duration_ms,
                });
            }

            // Fail fast: groups strictly after the failing group never start
            if group_failed {
                debug!(
                    execution_id = %execution_id,
                    group_index,
                    "Group failed; skipping remaining groups"
                );
                break;
            }
        }

        let status = if group_failed {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::Succeeded
        };
        record.finalize(status);

        self.event_publisher
            .publish_execution_completed(
                execution_id,
                &workflow.name,
                status,
                record.duration_ms.unwrap_or(0),
            )
            .await?;

        self.recorder.save(&record).await?;

        info!(
            execution_id = %execution_id,
            status = %status,
            executed_tasks = record.task_records.len(),
            duration_ms = record.duration_ms,
            "Workflow execution finished"
        );

        Ok(record)
    }

    /// Resolve and dispatch every task of one group, then wait for all of
    /// them to reach a terminal state.
    async fn run_group(
        &self,
        workflow: &WorkflowDefinition,
        task_ids: &[String],
        ctx: &ExecutionContext,
        semaphore: Option<Arc<Semaphore>>,
    ) -> OrchestrationResult<Vec<(String, String, DispatchOutcome)>> {
        // Resolution happens before any dispatch; sibling tasks never
        // observe each other's outputs
        let mut dispatches = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            let spec = workflow
                .task(task_id)
                .ok_or_else(|| OrchestrationError::UnknownGraphTask {
                    task_id: task_id.clone(),
                })?;
            let resolved = template::resolve_input(task_id, &spec.input, ctx)?;
            dispatches.push((task_id.clone(), spec.task_ref.clone(), resolved));
        }

        let mut meta = Vec::with_capacity(dispatches.len());
        let mut handles = Vec::with_capacity(dispatches.len());
        for (task_id, task_ref, resolved) in dispatches {
            let executor = Arc::clone(&self.executor);
            let semaphore = semaphore.clone();
            let timeout = self.config.task_timeout;
            let spawn_ref = task_ref.clone();

            let handle = tokio::spawn(async move {
                let permit = match semaphore {
                    Some(s) => match s.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(_) => {
                            return DispatchOutcome {
                                started_at: Utc::now(),
                                duration: Duration::ZERO,
                                invocation: TaskInvocation::failed(
                                    "execution semaphore closed before dispatch",
                                ),
                            }
                        }
                    },
                    None => None,
                };

                let started_at = Utc::now();
                let start = Instant::now();
                let invocation = match timeout {
                    Some(limit) => {
                        match tokio::time::timeout(limit, executor.invoke(&spawn_ref, resolved))
                            .await
                        {
                            Ok(invocation) => invocation,
                            Err(_) => TaskInvocation::failed(format!(
                                "task timed out after {}ms",
                                limit.as_millis()
                            )),
                        }
                    }
                    None => executor.invoke(&spawn_ref, resolved).await,
                };
                drop(permit);

                DispatchOutcome {
                    started_at,
                    duration: start.elapsed(),
                    invocation,
                }
            });

            meta.push((task_id, task_ref));
            handles.push(handle);
        }

        // Group barrier: every dispatched task reaches a terminal state
        // before the caller may advance
        let joined = futures::future::join_all(handles).await;

        let mut outcomes = Vec::with_capacity(joined.len());
        for ((task_id, task_ref), result) in meta.into_iter().zip(joined) {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    // A panicking executor is captured as a task failure so
                    // sibling results survive
                    error!(task_id = %task_id, error = %join_error, "Task dispatch panicked");
                    DispatchOutcome {
                        started_at: Utc::now(),
                        duration: Duration::ZERO,
                        invocation: TaskInvocation::failed(format!(
                            "task dispatch panicked: {join_error}"
                        )),
                    }
                }
            };
            outcomes.push((task_id, task_ref, outcome));
        }

        Ok(outcomes)
    }
}
