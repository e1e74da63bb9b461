//! Greedy priority scheduling.
//!
//! The scheduler ranks a snapshot by score alone: blocked tasks are pushed
//! down by the blocked penalty but are not filtered out, and the topological
//! structure of the dependency graph is not used to reorder the result.
//! The graph is built for bookkeeping and rendering only.

use crate::config::EngineConfig;
use crate::dag::{DependencyGraph, GraphEdge, SerializedGraph};
use crate::dependency::{DependencyResolver, Resolution};
use crate::heap::MaxHeap;
use crate::priority::{Priority, PriorityScorer};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use taskrank_core::{PriorityTier, ScoredTask, Task, TaskId, TaskStatus, Time};
use tracing::{debug, warn};

/// Dependency graph built from a snapshot, plus the edges it refused.
#[derive(Debug, Clone)]
pub struct GraphBuild {
    /// The acyclic graph
    pub graph: DependencyGraph<TaskId>,
    /// Stored dependencies that would have closed a cycle
    pub refused: Vec<GraphEdge<TaskId>>,
}

/// Score and dependency state of a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    /// Score, tier and breakdown
    pub priority: Priority,
    /// Whether (and by what) the task is blocked
    pub resolution: Resolution,
}

/// A graph node carrying display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphViewNode {
    /// Task id
    pub id: TaskId,
    /// Task title, or the id for dependencies missing from the snapshot
    pub title: String,
    /// Task status
    pub status: TaskStatus,
    /// Freshly computed score
    pub priority_score: u8,
    /// Tier for the score
    pub priority_tier: PriorityTier,
}

/// Graph with per-node metadata for visualization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphView {
    /// Nodes with metadata
    pub nodes: Vec<GraphViewNode>,
    /// Dependency edges
    pub edges: Vec<GraphEdge<TaskId>>,
}

/// Ranks task snapshots.
#[derive(Debug, Clone)]
pub struct Scheduler {
    scorer: PriorityScorer,
    top_limit: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Scheduler {
    /// Create a scheduler from the engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scorer: PriorityScorer::new(config.scoring),
            top_limit: config.top_limit,
        }
    }

    /// The scorer in use.
    pub fn scorer(&self) -> &PriorityScorer {
        &self.scorer
    }

    /// Default length of [`Scheduler::top_tasks`].
    pub fn top_limit(&self) -> usize {
        self.top_limit
    }

    /// Build the dependency graph for a snapshot.
    ///
    /// Dependencies that would close a cycle are dropped from the graph and
    /// reported in [`GraphBuild::refused`].
    pub fn build_graph(&self, tasks: &[Task]) -> GraphBuild {
        let mut graph = DependencyGraph::new();
        let mut refused = Vec::new();
        let mut seen = HashSet::with_capacity(tasks.len());

        for task in tasks {
            if !seen.insert(&task.id) {
                warn!("Duplicate task id in snapshot: {}", task.id);
            }
            graph.add_node(task.id.clone());
            for dep in &task.dependencies {
                if !graph.add_edge(task.id.clone(), dep.clone()) {
                    warn!("Refused dependency {} -> {}: would create a cycle", task.id, dep);
                    refused.push(GraphEdge {
                        from: task.id.clone(),
                        to: dep.clone(),
                    });
                }
            }
        }

        GraphBuild { graph, refused }
    }

    /// Serialized dependency graph for a snapshot.
    pub fn build_task_dag(&self, tasks: &[Task]) -> SerializedGraph<TaskId> {
        self.build_graph(tasks).graph.serialize()
    }

    /// Task ids with every dependency ahead of its dependents.
    pub fn topological_order(&self, tasks: &[Task]) -> Vec<TaskId> {
        self.build_graph(tasks).graph.topological_sort()
    }

    /// Score one task against a snapshot.
    pub fn assess(&self, task: &Task, tasks: &[Task], now: Time) -> Assessment {
        let resolution = DependencyResolver::new(tasks).check(task);
        let priority = self.scorer.score(task, resolution.is_blocked(), now);
        Assessment {
            priority,
            resolution,
        }
    }

    /// Score every task, keeping input order.
    pub fn score_all(&self, tasks: &[Task], now: Time) -> Vec<ScoredTask> {
        let resolver = DependencyResolver::new(tasks);
        tasks
            .iter()
            .map(|task| self.scorer.scored(task.clone(), resolver.is_blocked(task), now))
            .collect()
    }

    /// Rank a snapshot by descending score.
    ///
    /// Returns one entry per input task. Equal scores come out in heap
    /// order, which is not stable.
    pub fn schedule_greedy(&self, tasks: &[Task], now: Time) -> Vec<ScoredTask> {
        if tasks.is_empty() {
            return Vec::new();
        }

        let build = self.build_graph(tasks);
        debug!(
            "Scheduling {} tasks ({} edges, {} refused)",
            tasks.len(),
            build.graph.edge_count(),
            build.refused.len()
        );

        let resolver = DependencyResolver::new(tasks);
        self.rank(tasks.iter(), &resolver, now)
    }

    /// The highest-ranked pending or in-progress tasks.
    ///
    /// Blocked status is resolved against the whole snapshot, so a completed
    /// dependency still unblocks its dependents even though completed tasks
    /// are not listed. `limit` defaults to the configured top limit.
    pub fn top_tasks(&self, tasks: &[Task], limit: Option<usize>, now: Time) -> Vec<ScoredTask> {
        let limit = limit.unwrap_or(self.top_limit);
        let resolver = DependencyResolver::new(tasks);
        let mut ranked = self.rank(tasks.iter().filter(|t| t.status.is_open()), &resolver, now);
        ranked.truncate(limit);
        ranked
    }

    /// Dependency graph with title, status and current score on each node.
    pub fn graph_view(&self, tasks: &[Task], now: Time) -> GraphView {
        let serialized = self.build_task_dag(tasks);
        let scored: HashMap<TaskId, ScoredTask> = self
            .score_all(tasks, now)
            .into_iter()
            .map(|s| (s.id().clone(), s))
            .collect();

        let nodes = serialized
            .nodes
            .into_iter()
            .map(|node| match scored.get(&node.id) {
                Some(s) => GraphViewNode {
                    id: node.id,
                    title: s.task.title.clone(),
                    status: s.task.status,
                    priority_score: s.priority_score,
                    priority_tier: s.priority_tier,
                },
                None => GraphViewNode {
                    title: node.id.to_string(),
                    id: node.id,
                    status: TaskStatus::Pending,
                    priority_score: 0,
                    priority_tier: PriorityTier::Medium,
                },
            })
            .collect();

        GraphView {
            nodes,
            edges: serialized.edges,
        }
    }

    fn rank<'a>(
        &self,
        tasks: impl Iterator<Item = &'a Task>,
        resolver: &DependencyResolver,
        now: Time,
    ) -> Vec<ScoredTask> {
        let mut heap = MaxHeap::new();
        for task in tasks {
            heap.insert(self.scorer.scored(task.clone(), resolver.is_blocked(task), now));
        }
        heap.extract_all()
    }
}
