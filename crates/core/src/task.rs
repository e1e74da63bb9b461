//! Task model - the unit of work that gets scored and scheduled.

use serde::{Deserialize, Serialize};
use crate::id::TaskId;
use crate::Time;

/// Lowest accepted value for urgency, importance and difficulty.
pub const MIN_FACTOR: u8 = 1;

/// Highest accepted value for urgency, importance and difficulty.
pub const MAX_FACTOR: u8 = 5;

/// Value used for a factor that a record leaves out.
pub const DEFAULT_FACTOR: u8 = 3;

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 150;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Maximum category length in characters.
pub const MAX_CATEGORY_LEN: usize = 50;

/// A task record as supplied by the owning service.
///
/// The engine treats records as read-only input: it never stores them and
/// recomputes everything derived from them on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    #[serde(alias = "_id")]
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Free-form category used for filtering
    #[serde(default = "default_category")]
    pub category: String,

    /// When the task is due
    pub deadline: Time,

    /// How time-sensitive the task is (1-5)
    #[serde(default = "default_factor")]
    pub urgency: u8,

    /// How much the task matters (1-5)
    #[serde(default = "default_factor")]
    pub importance: u8,

    /// How hard the task is (1-5, 5 = hardest)
    #[serde(default = "default_factor")]
    pub difficulty: u8,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// Tasks that must be completed before this one
    #[serde(default)]
    pub dependencies: Vec<TaskId>,

    /// When the task was last marked completed
    #[serde(default, alias = "completedAt", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Time>,
}

fn default_factor() -> u8 {
    DEFAULT_FACTOR
}

fn default_category() -> String {
    "General".to_string()
}

impl Task {
    /// Create a pending task with default factors and no dependencies.
    pub fn new(title: impl Into<String>, deadline: Time) -> Self {
        Self {
            id: TaskId::new(),
            title: title.into(),
            description: String::new(),
            category: default_category(),
            deadline,
            urgency: DEFAULT_FACTOR,
            importance: DEFAULT_FACTOR,
            difficulty: DEFAULT_FACTOR,
            status: TaskStatus::Pending,
            dependencies: Vec::new(),
            completed_at: None,
        }
    }

    /// Set urgency, importance and difficulty at once.
    pub fn with_factors(mut self, urgency: u8, importance: u8, difficulty: u8) -> Self {
        self.urgency = urgency;
        self.importance = importance;
        self.difficulty = difficulty;
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Add a dependency on another task.
    pub fn depends_on(mut self, id: TaskId) -> Self {
        if !self.dependencies.contains(&id) {
            self.dependencies.push(id);
        }
        self
    }

    /// Whether the task is in the completed state.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Check the record against the field constraints.
    ///
    /// The scorer itself never validates; callers run this before handing
    /// records to the engine.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("urgency", self.urgency),
            ("importance", self.importance),
            ("difficulty", self.difficulty),
        ] {
            if !(MIN_FACTOR..=MAX_FACTOR).contains(&value) {
                return Err(ValidationError::FactorOutOfRange { field, value });
            }
        }

        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        check_len("title", title, MAX_TITLE_LEN)?;
        check_len("description", self.description.trim(), MAX_DESCRIPTION_LEN)?;
        check_len("category", self.category.trim(), MAX_CATEGORY_LEN)?;

        if self.dependencies.contains(&self.id) {
            return Err(ValidationError::SelfDependency(self.id.clone()));
        }

        Ok(())
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { field, max, len });
    }
    Ok(())
}

/// Field edits for an existing task. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskUpdate {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New deadline
    pub deadline: Option<Time>,
    /// New urgency (1-5)
    pub urgency: Option<u8>,
    /// New importance (1-5)
    pub importance: Option<u8>,
    /// New difficulty (1-5)
    pub difficulty: Option<u8>,
    /// New status
    pub status: Option<TaskStatus>,
    /// Replacement dependency list
    pub dependencies: Option<Vec<TaskId>>,
}

impl TaskUpdate {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the deadline.
    pub fn with_deadline(mut self, deadline: Time) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the urgency.
    pub fn with_urgency(mut self, urgency: u8) -> Self {
        self.urgency = Some(urgency);
        self
    }

    /// Set the importance.
    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = Some(importance);
        self
    }

    /// Set the difficulty.
    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Replace the dependency list.
    pub fn with_dependencies(mut self, dependencies: Vec<TaskId>) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write the edits into a record.
    ///
    /// Repeated dependency ids are collapsed, keeping the first occurrence.
    /// The completion timestamp is left to the caller.
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
        if let Some(urgency) = self.urgency {
            task.urgency = urgency;
        }
        if let Some(importance) = self.importance {
            task.importance = importance;
        }
        if let Some(difficulty) = self.difficulty {
            task.difficulty = difficulty;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(dependencies) = self.dependencies {
            task.dependencies.clear();
            for dep in dependencies {
                if !task.dependencies.contains(&dep) {
                    task.dependencies.push(dep);
                }
            }
        }
    }
}

/// Task status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Pending,
    /// Being worked on
    InProgress,
    /// Done
    Completed,
    /// Dropped; never satisfies a dependency
    Cancelled,
}

impl TaskStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Pending or in progress.
    pub fn is_open(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" | "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

/// Coarse priority label derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    /// Do now
    Critical,
    /// Do soon
    High,
    /// Default tier
    #[default]
    Medium,
    /// Can wait
    Low,
}

impl PriorityTier {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityTier::Critical => "critical",
            PriorityTier::High => "high",
            PriorityTier::Medium => "medium",
            PriorityTier::Low => "low",
        }
    }
}

impl std::fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task together with its freshly computed priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTask {
    /// The task record
    #[serde(flatten)]
    pub task: Task,

    /// Priority score (0-100)
    #[serde(alias = "priorityScore")]
    pub priority_score: u8,

    /// Tier derived from the score
    #[serde(alias = "priorityTier")]
    pub priority_tier: PriorityTier,
}

impl ScoredTask {
    /// Identifier of the wrapped task.
    pub fn id(&self) -> &TaskId {
        &self.task.id
    }
}

/// Field constraint violations reported by [`Task::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Urgency, importance or difficulty outside 1-5
    #[error("{field} must be between 1 and 5, got {value}")]
    FactorOutOfRange {
        /// Offending field
        field: &'static str,
        /// Supplied value
        value: u8,
    },

    /// Title missing or whitespace only
    #[error("Task title is required")]
    EmptyTitle,

    /// A text field exceeds its limit
    #[error("{field} cannot exceed {max} characters (got {len})")]
    TooLong {
        /// Offending field
        field: &'static str,
        /// Allowed maximum
        max: usize,
        /// Actual length
        len: usize,
    },

    /// The task lists itself as a dependency
    #[error("Task {0} cannot depend on itself")]
    SelfDependency(TaskId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn deadline() -> Time {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_task_new_defaults() {
        let task = Task::new("Write report", deadline());
        assert_eq!(task.urgency, 3);
        assert_eq!(task.importance, 3);
        assert_eq!(task.difficulty, 3);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.category, "General");
        assert!(task.dependencies.is_empty());
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_depends_on_deduplicates() {
        let dep = TaskId::new();
        let task = Task::new("A", deadline())
            .depends_on(dep.clone())
            .depends_on(dep.clone());
        assert_eq!(task.dependencies, vec![dep]);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let id = TaskId::new();
        let json = format!(
            r#"{{"id":"{}","title":"Minimal","deadline":"2030-01-01T00:00:00Z"}}"#,
            id
        );
        let task: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(task.id, id);
        assert_eq!(task.urgency, DEFAULT_FACTOR);
        assert_eq!(task.importance, DEFAULT_FACTOR);
        assert_eq!(task.difficulty, DEFAULT_FACTOR);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.category, "General");
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_status_serde_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let status: TaskStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, TaskStatus::Cancelled);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("Completed".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_status_is_open() {
        assert!(TaskStatus::Pending.is_open());
        assert!(TaskStatus::InProgress.is_open());
        assert!(!TaskStatus::Completed.is_open());
        assert!(!TaskStatus::Cancelled.is_open());
    }

    #[test]
    fn test_validate_factor_range() {
        let task = Task::new("A", deadline()).with_factors(0, 3, 3);
        assert_eq!(
            task.validate(),
            Err(ValidationError::FactorOutOfRange { field: "urgency", value: 0 })
        );

        let task = Task::new("A", deadline()).with_factors(3, 3, 6);
        assert_eq!(
            task.validate(),
            Err(ValidationError::FactorOutOfRange { field: "difficulty", value: 6 })
        );
    }

    #[test]
    fn test_validate_title() {
        let task = Task::new("   ", deadline());
        assert_eq!(task.validate(), Err(ValidationError::EmptyTitle));

        let task = Task::new("x".repeat(151), deadline());
        assert_eq!(
            task.validate(),
            Err(ValidationError::TooLong { field: "title", max: 150, len: 151 })
        );
    }

    #[test]
    fn test_validate_self_dependency() {
        let mut task = Task::new("Loop", deadline());
        task.dependencies.push(task.id.clone());
        assert_eq!(task.validate(), Err(ValidationError::SelfDependency(task.id.clone())));
    }

    #[test]
    fn test_scored_task_flattens_record() {
        let task = Task::new("A", deadline());
        let scored = ScoredTask {
            task: task.clone(),
            priority_score: 72,
            priority_tier: PriorityTier::High,
        };
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["title"], "A");
        assert_eq!(value["priority_score"], 72);
        assert_eq!(value["priority_tier"], "high");
        assert_eq!(scored.id(), &task.id);
    }

    #[test]
    fn test_deserialize_exported_record() {
        let json = r#"{
            "_id": "64f1c2a9e4b0a1b2c3d4e5f6",
            "title": "Exported",
            "deadline": "2030-01-01T00:00:00Z",
            "status": "completed",
            "completedAt": "2029-12-30T08:00:00Z",
            "dependencies": ["64f1c2a9e4b0a1b2c3d4e5f7"],
            "priorityScore": 61,
            "priorityTier": "high"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id.as_str(), "64f1c2a9e4b0a1b2c3d4e5f6");
        assert_eq!(task.dependencies[0].as_str(), "64f1c2a9e4b0a1b2c3d4e5f7");
        assert!(task.completed_at.is_some());

        let scored: ScoredTask = serde_json::from_str(json).unwrap();
        assert_eq!(scored.priority_score, 61);
        assert_eq!(scored.priority_tier, PriorityTier::High);

        // Output keeps the workspace's field names.
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["id"], "64f1c2a9e4b0a1b2c3d4e5f6");
        assert!(value.get("completed_at").is_some());
        assert_eq!(value["priority_score"], 61);
    }

    #[test]
    fn test_update_applies_only_set_fields() {
        let dep = TaskId::new();
        let mut task = Task::new("Draft", deadline()).with_factors(2, 2, 2);
        let before = task.clone();

        TaskUpdate::new().apply(&mut task);
        assert_eq!(task, before);

        TaskUpdate::new()
            .with_title("Final")
            .with_urgency(5)
            .with_dependencies(vec![dep.clone(), dep.clone()])
            .apply(&mut task);
        assert_eq!(task.title, "Final");
        assert_eq!(task.urgency, 5);
        assert_eq!(task.importance, 2);
        assert_eq!(task.difficulty, 2);
        assert_eq!(task.deadline, deadline());
        assert_eq!(task.dependencies, vec![dep]);

        TaskUpdate::new().with_dependencies(Vec::new()).apply(&mut task);
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn test_update_from_partial_json() {
        let update: TaskUpdate =
            serde_json::from_str(r#"{"difficulty": 1, "status": "in-progress"}"#).unwrap();
        assert_eq!(update.difficulty, Some(1));
        assert_eq!(update.status, Some(TaskStatus::InProgress));
        assert!(update.title.is_none());
        assert!(!update.is_empty());
        assert!(TaskUpdate::new().is_empty());
    }
}
