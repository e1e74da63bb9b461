//! taskrank core data models.
//!
//! This crate defines the task records the prioritization engine consumes
//! and the scored records it hands back.

#![warn(missing_docs)]

// Core identities
mod id;

// Task records
mod task;

// Re-exports
pub use id::*;

pub use task::{
    Task, TaskUpdate, TaskStatus, PriorityTier, ScoredTask, ValidationError,
    MIN_FACTOR, MAX_FACTOR, DEFAULT_FACTOR,
    MAX_TITLE_LEN, MAX_DESCRIPTION_LEN, MAX_CATEGORY_LEN,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
