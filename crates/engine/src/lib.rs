//! Scoring and scheduling engine - priority scoring, dependency graph, and greedy ranking.

#![warn(missing_docs)]

pub mod cascade;
pub mod config;
pub mod dag;
pub mod dependency;
pub mod error;
pub mod heap;
pub mod priority;
pub mod scheduler;

pub use cascade::{Recomputed, TaskBook};
pub use config::{CascadeMode, EngineConfig, ScoringConfig, TierThresholds, Weights};
pub use dag::{DependencyGraph, GraphEdge, GraphNode, SerializedGraph};
pub use dependency::{completed_ids, DependencyResolver, Resolution};
pub use error::{EngineError, Result};
pub use heap::{MaxHeap, Scored};
pub use priority::{deadline_score, ease_bonus, hours_until, Priority, PriorityScorer, ScoreBreakdown};
pub use scheduler::{Assessment, GraphBuild, GraphView, GraphViewNode, Scheduler};
