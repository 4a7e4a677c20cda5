//! Mock Task Executor for testing the orchestration core without real task
//! side effects. Tracks every invocation with timing so tests can assert
//! ordering and concurrency guarantees.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use conductor_core::orchestration::{TaskExecutor, TaskInvocation};

/// One tracked invocation with wall-clock bounds
#[derive(Debug, Clone)]
pub struct TrackedInvocation {
    pub task_ref: String,
    pub input: Value,
    pub started: Instant,
    pub finished: Instant,
}

#[derive(Debug, Default)]
struct MockState {
    invocations: Vec<TrackedInvocation>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Scriptable task executor double.
///
/// Outcomes are keyed by `task_ref`; unconfigured refs succeed with an echo
/// of their resolved input, which lets tests assert template resolution.
pub struct MockTaskExecutor {
    state: Arc<Mutex<MockState>>,
    outcomes: HashMap<String, TaskInvocation>,
    delay: Option<Duration>,
}

impl MockTaskExecutor {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            outcomes: HashMap::new(),
            delay: None,
        }
    }

    /// Configure the outcome returned for a task ref
    pub fn with_outcome(mut self, task_ref: impl Into<String>, outcome: TaskInvocation) -> Self {
        self.outcomes.insert(task_ref.into(), outcome);
        self
    }

    /// Simulate slow task execution
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All tracked invocations, in completion order
    pub fn invocations(&self) -> Vec<TrackedInvocation> {
        self.state.lock().invocations.clone()
    }

    /// Task refs that were invoked, in completion order
    pub fn invoked_refs(&self) -> Vec<String> {
        self.state
            .lock()
            .invocations
            .iter()
            .map(|i| i.task_ref.clone())
            .collect()
    }

    /// Invocation bounds for one task ref
    pub fn invocation_of(&self, task_ref: &str) -> Option<TrackedInvocation> {
        self.state
            .lock()
            .invocations
            .iter()
            .find(|i| i.task_ref == task_ref)
            .cloned()
    }

    /// Peak number of concurrently running invocations
    pub fn max_in_flight(&self) -> usize {
        self.state.lock().max_in_flight
    }
}

impl Default for MockTaskExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskExecutor for MockTaskExecutor {
    async fn invoke(&self, task_ref: &str, resolved_input: Value) -> TaskInvocation {
        let started = Instant::now();
        {
            let mut state = self.state.lock();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.outcomes.get(task_ref).cloned().unwrap_or_else(|| {
            TaskInvocation::succeeded(json!({
                "task_ref": task_ref,
                "input": resolved_input.clone(),
            }))
        });

        let mut state = self.state.lock();
        state.in_flight -= 1;
        state.invocations.push(TrackedInvocation {
            task_ref: task_ref.to_string(),
            input: resolved_input,
            started,
            finished: Instant::now(),
        });

        outcome
    }
}
