//! # Blast Radius Analyzer
//!
//! Given a task name, computes the transitive set of workflows and tasks
//! affected by changing it: bounded breadth-first traversal over the usage
//! graph (which workflows reference which tasks). The usage index itself is
//! an external collaborator; the core only queries it.
//!
//! Each traversal level alternates two half-steps: frontier tasks are
//! expanded to the workflows that use them, then newly discovered workflows
//! are expanded to the other tasks they contain, which seed the next
//! frontier. When a depth bound cuts the traversal, it cuts after the
//! workflow half-step of the final level. Visited sets guarantee that cyclic
//! usage graphs terminate and that no entity is reported twice.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::models::usage::UsageEdge;
use crate::orchestration::errors::OrchestrationResult;

/// Read-side interface over usage relationships
#[async_trait]
pub trait TaskUsageIndex: Send + Sync {
    /// Workflows that reference the given task
    async fn workflows_using(&self, task_name: &str) -> OrchestrationResult<BTreeSet<String>>;

    /// Tasks contained in the given workflow
    async fn tasks_in(&self, workflow_name: &str) -> OrchestrationResult<BTreeSet<String>>;
}

/// Concurrent in-memory usage index built from [`UsageEdge`]s
#[derive(Debug, Default)]
pub struct InMemoryTaskUsageIndex {
    workflows_by_task: DashMap<String, BTreeSet<String>>,
    tasks_by_workflow: DashMap<String, BTreeSet<String>>,
}

impl InMemoryTaskUsageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: impl IntoIterator<Item = UsageEdge>) -> Self {
        let index = Self::new();
        for edge in edges {
            index.add_edge(edge);
        }
        index
    }

    pub fn add_edge(&self, edge: UsageEdge) {
        self.workflows_by_task
            .entry(edge.task_name.clone())
            .or_default()
            .insert(edge.workflow_name.clone());
        self.tasks_by_workflow
            .entry(edge.workflow_name)
            .or_default()
            .insert(edge.task_name);
    }
}

#[async_trait]
impl TaskUsageIndex for InMemoryTaskUsageIndex {
    async fn workflows_using(&self, task_name: &str) -> OrchestrationResult<BTreeSet<String>> {
        Ok(self
            .workflows_by_task
            .get(task_name)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }

    async fn tasks_in(&self, workflow_name: &str) -> OrchestrationResult<BTreeSet<String>> {
        Ok(self
            .tasks_by_workflow
            .get(workflow_name)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }
}

/// Depth bound for traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalDepth {
    Bounded(u32),
    Unbounded,
}

/// Output shape selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Flat,
    Graph,
    Both,
}

impl ReportFormat {
    fn includes_graph(self) -> bool {
        matches!(self, ReportFormat::Graph | ReportFormat::Both)
    }
}

/// Entities newly discovered at one traversal depth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub depth: u32,
    pub workflows: Vec<String>,
    pub tasks: Vec<String>,
}

/// Node kind in the graph-format report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Task,
    Workflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageNode {
    pub id: String,
    pub kind: NodeKind,
}

/// Relation carried by a graph edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRelation {
    /// task -> workflow: the workflow uses the task
    UsedBy,
    /// workflow -> task: the workflow contains the task
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageGraphEdge {
    pub from: String,
    pub to: String,
    pub relation: EdgeRelation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UsageGraph {
    pub nodes: Vec<UsageNode>,
    pub edges: Vec<UsageGraphEdge>,
}

/// Aggregated result of one blast radius computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastRadiusReport {
    pub task_name: String,
    /// Newly discovered entities per depth; empty levels are not recorded
    pub levels: Vec<DepthLevel>,
    pub total_workflows: usize,
    pub total_tasks: usize,
    /// Whether traversal was cut off by the depth bound rather than by
    /// exhausting the usage graph
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<UsageGraph>,
}

/// Computes blast radius reports against a usage index
pub struct BlastRadiusAnalyzer {
    index: Arc<dyn TaskUsageIndex>,
}

impl BlastRadiusAnalyzer {
    pub fn new(index: Arc<dyn TaskUsageIndex>) -> Self {
        Self { index }
    }

    /// Compute the transitive usage closure of one task.
    #[instrument(skip(self), fields(task_name = task_name))]
    pub async fn compute(
        &self,
        task_name: &str,
        depth: TraversalDepth,
        format: ReportFormat,
    ) -> OrchestrationResult<BlastRadiusReport> {
        let mut visited_tasks: BTreeSet<String> = BTreeSet::from([task_name.to_string()]);
        let mut visited_workflows: BTreeSet<String> = BTreeSet::new();
        let mut frontier: Vec<String> = vec![task_name.to_string()];
        let mut levels: Vec<DepthLevel> = Vec::new();
        let mut graph = format.includes_graph().then(|| {
            let mut g = UsageGraph::default();
            g.nodes.push(UsageNode {
                id: task_name.to_string(),
                kind: NodeKind::Task,
            });
            g
        });

        let mut truncated = false;
        let mut current_depth: u32 = 0;

        while !frontier.is_empty() {
            current_depth += 1;
            if let TraversalDepth::Bounded(max) = depth {
                if current_depth > max {
                    // Bounded(0): no traversal at all, only the seed
                    truncated = true;
                    break;
                }
            }

            // Workflow half-step: who uses the frontier tasks
            let mut new_workflows: BTreeSet<String> = BTreeSet::new();
            for task in &frontier {
                for workflow in self.index.workflows_using(task).await? {
                    if visited_workflows.insert(workflow.clone()) {
                        new_workflows.insert(workflow.clone());
                        if let Some(g) = graph.as_mut() {
                            g.nodes.push(UsageNode {
                                id: workflow.clone(),
                                kind: NodeKind::Workflow,
                            });
                        }
                    }
                    if let Some(g) = graph.as_mut() {
                        g.edges.push(UsageGraphEdge {
                            from: task.clone(),
                            to: workflow,
                            relation: EdgeRelation::UsedBy,
                        });
                    }
                }
            }

            if new_workflows.is_empty() {
                // Usage graph exhausted: nothing downstream of this frontier
                break;
            }

            if matches!(depth, TraversalDepth::Bounded(max) if current_depth == max) {
                // The bound cuts before the task half-step of the final level
                levels.push(DepthLevel {
                    depth: current_depth,
                    workflows: new_workflows.into_iter().collect(),
                    tasks: Vec::new(),
                });
                truncated = true;
                break;
            }

            // Task half-step: what else do the new workflows contain
            let mut new_tasks: BTreeSet<String> = BTreeSet::new();
            for workflow in &new_workflows {
                for task in self.index.tasks_in(workflow).await? {
                    if visited_tasks.insert(task.clone()) {
                        new_tasks.insert(task.clone());
                        if let Some(g) = graph.as_mut() {
                            g.nodes.push(UsageNode {
                                id: task.clone(),
                                kind: NodeKind::Task,
                            });
                        }
                    }
                    if let Some(g) = graph.as_mut() {
                        g.edges.push(UsageGraphEdge {
                            from: workflow.clone(),
                            to: task,
                            relation: EdgeRelation::Contains,
                        });
                    }
                }
            }

            levels.push(DepthLevel {
                depth: current_depth,
                workflows: new_workflows.into_iter().collect(),
                tasks: new_tasks.iter().cloned().collect(),
            });
            frontier = new_tasks.into_iter().collect();
        }

        let total_workflows = visited_workflows.len();
        // The seed task is the subject of the report, not part of the radius
        let total_tasks = visited_tasks.len() - 1;

        debug!(
            task_name = task_name,
            levels = levels.len(),
            total_workflows,
            total_tasks,
            truncated,
            "Computed blast radius"
        );

        let flat = matches!(format, ReportFormat::Flat | ReportFormat::Both);
        Ok(BlastRadiusReport {
            task_name: task_name.to_string(),
            levels: if flat { levels } else { Vec::new() },
            total_workflows,
            total_tasks,
            truncated,
            graph,
        })
    }
}
