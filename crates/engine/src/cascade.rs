//! Owner snapshot with cascading recompute.
//!
//! [`TaskBook`] holds one owner's tasks and keeps scores consistent when a
//! task is edited, its completion state flips, or a task is deleted.
//! Persistence of the returned scores is left to the caller.

use crate::config::{CascadeMode, EngineConfig};
use crate::dag::SerializedGraph;
use crate::dependency::DependencyResolver;
use crate::error::{EngineError, Result};
use crate::scheduler::Scheduler;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use taskrank_core::{ScoredTask, Task, TaskId, TaskStatus, TaskUpdate, Time};
use tracing::debug;

/// Tasks rescored by a mutation, in visit order, each at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recomputed {
    /// Rescored tasks
    pub changed: Vec<ScoredTask>,
}

impl Recomputed {
    /// Ids of the rescored tasks.
    pub fn ids(&self) -> Vec<TaskId> {
        self.changed.iter().map(|s| s.id().clone()).collect()
    }

    /// Look up a rescored task.
    pub fn get(&self, id: &TaskId) -> Option<&ScoredTask> {
        self.changed.iter().find(|s| s.id() == id)
    }
}

/// In-memory snapshot of one owner's tasks.
#[derive(Debug, Clone)]
pub struct TaskBook {
    tasks: IndexMap<TaskId, Task>,
    scheduler: Scheduler,
    cascade: CascadeMode,
}

impl TaskBook {
    /// Create a book from a snapshot. Fails on duplicate ids.
    pub fn new(tasks: impl IntoIterator<Item = Task>, config: &EngineConfig) -> Result<Self> {
        let mut map = IndexMap::new();
        for task in tasks {
            let id = task.id.clone();
            if map.insert(id.clone(), task).is_some() {
                return Err(EngineError::DuplicateTask(id));
            }
        }
        debug!("Loaded task book with {} tasks", map.len());

        Ok(Self {
            tasks: map,
            scheduler: Scheduler::new(config),
            cascade: config.cascade,
        })
    }

    /// Override the cascade mode.
    pub fn with_cascade(mut self, cascade: CascadeMode) -> Self {
        self.cascade = cascade;
        self
    }

    /// Current cascade mode.
    pub fn cascade(&self) -> CascadeMode {
        self.cascade
    }

    /// The scheduler used for scoring.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Get a task by id.
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if the book has no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Consume the book, returning its tasks in insertion order.
    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks.into_values().collect()
    }

    /// Greedy schedule of the whole book.
    pub fn schedule(&self, now: Time) -> Vec<ScoredTask> {
        self.scheduler.schedule_greedy(&self.snapshot(), now)
    }

    /// Highest-ranked open tasks.
    pub fn top(&self, limit: Option<usize>, now: Time) -> Vec<ScoredTask> {
        self.scheduler.top_tasks(&self.snapshot(), limit, now)
    }

    /// Serialized dependency graph.
    pub fn graph(&self) -> SerializedGraph<TaskId> {
        self.scheduler.build_task_dag(&self.snapshot())
    }

    /// Current score of one task.
    pub fn score(&self, id: &TaskId, now: Time) -> Result<ScoredTask> {
        self.rescore(std::slice::from_ref(id), now)
            .pop()
            .ok_or_else(|| EngineError::TaskNotFound(id.clone()))
    }

    /// Add a task and return its score.
    ///
    /// The task is validated, and rejected if its id is taken or if one of
    /// its dependencies would close a cycle with the existing tasks.
    pub fn insert(&mut self, task: Task, now: Time) -> Result<ScoredTask> {
        task.validate()?;
        if self.tasks.contains_key(&task.id) {
            return Err(EngineError::DuplicateTask(task.id));
        }
        self.check_dependencies(&task)?;

        let id = task.id.clone();
        self.tasks.insert(id.clone(), task);
        debug!("Inserted task {}", id);
        self.score(&id, now)
    }

    /// Apply field edits to a task and rescore what they affect.
    ///
    /// The edited record is validated and a new dependency list goes through
    /// the same cycle check as [`TaskBook::insert`]; on error the book is
    /// unchanged. The task is always rescored, and its dependents too when
    /// the edit flips its completion state.
    pub fn update(&mut self, id: &TaskId, changes: TaskUpdate, now: Time) -> Result<Recomputed> {
        let current = self.require(id)?;
        let mut edited = current.clone();
        let dependencies_changed = changes.dependencies.is_some();
        changes.apply(&mut edited);

        edited.validate()?;
        if dependencies_changed && edited.dependencies != current.dependencies {
            self.check_dependencies(&edited)?;
        }

        Ok(self.commit(edited, now))
    }

    /// Make `task` depend on `dependency` and rescore it.
    ///
    /// Already recorded dependencies are left as they are.
    pub fn add_dependency(
        &mut self,
        task: &TaskId,
        dependency: &TaskId,
        now: Time,
    ) -> Result<Recomputed> {
        let mut edited = self.require(task)?.clone();
        if !edited.dependencies.contains(dependency) {
            edited.dependencies.push(dependency.clone());
            self.check_dependencies(&edited)?;
            debug!("Added dependency {} -> {}", task, dependency);
        }
        Ok(self.commit(edited, now))
    }

    /// Drop `dependency` from `task` and rescore it.
    pub fn remove_dependency(
        &mut self,
        task: &TaskId,
        dependency: &TaskId,
        now: Time,
    ) -> Result<Recomputed> {
        let mut edited = self.require(task)?.clone();
        edited.dependencies.retain(|dep| dep != dependency);
        debug!("Removed dependency {} -> {}", task, dependency);
        Ok(self.commit(edited, now))
    }

    /// Change a task's status and rescore what it affects.
    ///
    /// The task itself is always rescored. When its completion state flips,
    /// dependents are rescored too: direct ones only, or everything
    /// downstream with [`CascadeMode::Transitive`].
    pub fn set_status(&mut self, id: &TaskId, status: TaskStatus, now: Time) -> Result<Recomputed> {
        let mut edited = self.require(id)?.clone();
        edited.status = status;
        Ok(self.commit(edited, now))
    }

    /// Delete a task.
    ///
    /// Its id is stripped from every remaining dependency list, and the
    /// tasks that listed it are rescored.
    pub fn remove(&mut self, id: &TaskId, now: Time) -> Result<(Task, Recomputed)> {
        let removed = self
            .tasks
            .shift_remove(id)
            .ok_or_else(|| EngineError::TaskNotFound(id.clone()))?;

        let mut former = Vec::new();
        for task in self.tasks.values_mut() {
            let before = task.dependencies.len();
            task.dependencies.retain(|dep| dep != id);
            if task.dependencies.len() != before {
                former.push(task.id.clone());
            }
        }
        debug!("Removed task {}, rescoring {} dependents", id, former.len());

        let changed = self.rescore(&former, now);
        Ok((removed, Recomputed { changed }))
    }

    fn require(&self, id: &TaskId) -> Result<&Task> {
        self.tasks
            .get(id)
            .ok_or_else(|| EngineError::TaskNotFound(id.clone()))
    }

    fn snapshot(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }

    /// Fail if any of `task`'s dependencies would close a cycle with the
    /// other tasks' stored dependencies.
    fn check_dependencies(&self, task: &Task) -> Result<()> {
        let others: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| t.id != task.id)
            .cloned()
            .collect();

        let mut graph = self.scheduler.build_graph(&others).graph;
        graph.add_node(task.id.clone());
        for dep in &task.dependencies {
            if !graph.add_edge(task.id.clone(), dep.clone()) {
                return Err(EngineError::CircularDependency {
                    from: task.id.clone(),
                    to: dep.clone(),
                });
            }
        }
        Ok(())
    }

    /// Store an edited record, stamp completion, and rescore it plus the
    /// dependents its completion change affects.
    fn commit(&mut self, mut task: Task, now: Time) -> Recomputed {
        let id = task.id.clone();
        let was_completed = self.tasks.get(&id).is_some_and(Task::is_completed);
        let is_completed = task.is_completed();
        if is_completed && !was_completed {
            task.completed_at = Some(now);
        } else if !is_completed {
            task.completed_at = None;
        }
        let status = task.status;
        self.tasks.insert(id.clone(), task);

        let mut affected = vec![id.clone()];
        if was_completed != is_completed {
            affected.extend(self.downstream(&id));
        }
        debug!(
            "Task {} is {}, rescoring {} tasks ({:?})",
            id,
            status,
            affected.len(),
            self.cascade
        );

        Recomputed {
            changed: self.rescore(&affected, now),
        }
    }

    fn direct_dependents(&self, id: &TaskId) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| t.dependencies.contains(id))
            .map(|t| t.id.clone())
            .collect()
    }

    fn downstream(&self, id: &TaskId) -> Vec<TaskId> {
        match self.cascade {
            CascadeMode::Direct => self.direct_dependents(id),
            CascadeMode::Transitive => {
                let mut visited = HashSet::from([id.clone()]);
                let mut queue: VecDeque<TaskId> = self.direct_dependents(id).into();
                let mut order = Vec::new();

                while let Some(next) = queue.pop_front() {
                    if !visited.insert(next.clone()) {
                        continue;
                    }
                    queue.extend(self.direct_dependents(&next));
                    order.push(next);
                }
                order
            }
        }
    }

    fn rescore(&self, ids: &[TaskId], now: Time) -> Vec<ScoredTask> {
        let resolver = DependencyResolver::new(self.tasks.values());
        let scorer = self.scheduler.scorer();
        ids.iter()
            .filter_map(|id| self.tasks.get(id))
            .map(|task| scorer.scored(task.clone(), resolver.is_blocked(task), now))
            .collect()
    }
}
