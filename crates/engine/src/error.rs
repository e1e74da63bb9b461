//! Error type for engine operations that can fail.
//!
//! The scoring, heap and graph algorithms never fail; errors only come from
//! snapshot mutations and configuration loading.

use taskrank_core::{TaskId, ValidationError};

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while mutating a snapshot or loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No task with this id in the snapshot
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// The snapshot already holds a task with this id
    #[error("Duplicate task id: {0}")]
    DuplicateTask(TaskId),

    /// The dependency would close a cycle (or is a self-loop)
    #[error("Circular dependency: {from} cannot depend on {to}")]
    CircularDependency {
        /// Dependent task
        from: TaskId,
        /// Requested dependency
        to: TaskId,
    },

    /// Record failed field validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let id = TaskId::new();
        assert_eq!(
            EngineError::TaskNotFound(id.clone()).to_string(),
            format!("Task not found: {}", id)
        );
        assert_eq!(
            EngineError::InvalidConfig("scale must be positive".to_string()).to_string(),
            "Invalid configuration: scale must be positive"
        );
    }

    #[test]
    fn test_validation_error_converts() {
        let err: EngineError = ValidationError::EmptyTitle.into();
        assert!(matches!(err, EngineError::Validation(ValidationError::EmptyTitle)));
    }
}
