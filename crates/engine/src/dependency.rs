//! Dependency resolution for tasks.

use std::collections::HashSet;
use taskrank_core::{Task, TaskId};

/// Result of dependency resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// All dependencies completed
    Ready,
    /// Blocked by these dependency ids, in the task's dependency order
    Blocked(Vec<TaskId>),
}

impl Resolution {
    /// Check if any dependency is outstanding.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Resolution::Blocked(_))
    }
}

/// Resolves task dependencies against one snapshot.
///
/// A dependency counts as satisfied only when a task with that id is in the
/// snapshot and completed. Ids with no matching task (deleted, or owned by
/// someone else) block.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    completed: HashSet<TaskId>,
}

impl DependencyResolver {
    /// Build a resolver from a snapshot.
    pub fn new<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        Self {
            completed: completed_ids(tasks),
        }
    }

    /// Check if a task's dependencies are satisfied.
    pub fn check(&self, task: &Task) -> Resolution {
        let blocked: Vec<TaskId> = task
            .dependencies
            .iter()
            .filter(|dep| !self.completed.contains(*dep))
            .cloned()
            .collect();

        if blocked.is_empty() {
            Resolution::Ready
        } else {
            Resolution::Blocked(blocked)
        }
    }

    /// Check if at least one dependency is outstanding.
    pub fn is_blocked(&self, task: &Task) -> bool {
        task.dependencies
            .iter()
            .any(|dep| !self.completed.contains(dep))
    }

    /// Check if a task id is completed in the snapshot.
    pub fn is_completed(&self, id: &TaskId) -> bool {
        self.completed.contains(id)
    }
}

/// Ids of every completed task in the snapshot.
pub fn completed_ids<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> HashSet<TaskId> {
    tasks
        .into_iter()
        .filter(|task| task.is_completed())
        .map(|task| task.id.clone())
        .collect()
}
