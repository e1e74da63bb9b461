//! Engine configuration: scoring weights, tier thresholds and cascade policy.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use taskrank_core::PriorityTier;
use tracing::debug;

/// Weight of each factor in the weighted sum.
///
/// Factors are all on a 1-5 scale, so weights summing to 1.0 keep the
/// weighted sum on that scale too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Urgency weight
    pub urgency: f64,
    /// Importance weight
    pub importance: f64,
    /// Deadline proximity weight
    pub deadline: f64,
    /// Ease (inverted difficulty) weight
    pub ease: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            urgency: 0.30,
            importance: 0.25,
            deadline: 0.25,
            ease: 0.20,
        }
    }
}

impl Weights {
    fn as_array(&self) -> [(&'static str, f64); 4] {
        [
            ("urgency", self.urgency),
            ("importance", self.importance),
            ("deadline", self.deadline),
            ("ease", self.ease),
        ]
    }
}

/// Lowest score of each tier; anything below `medium` is low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Minimum critical score
    pub critical: u8,
    /// Minimum high score
    pub high: u8,
    /// Minimum medium score
    pub medium: u8,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            critical: 80,
            high: 60,
            medium: 35,
        }
    }
}

impl TierThresholds {
    /// Map a score to its tier.
    pub fn tier_for(&self, score: u8) -> PriorityTier {
        if score >= self.critical {
            PriorityTier::Critical
        } else if score >= self.high {
            PriorityTier::High
        } else if score >= self.medium {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }
}

/// Parameters of the priority formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Factor weights
    pub weights: Weights,
    /// Multiplier taking the 1-5 weighted sum to 0-100
    pub scale: f64,
    /// Points subtracted from a blocked task
    pub blocked_penalty: u8,
    /// Tier boundaries
    pub tiers: TierThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            scale: 20.0,
            blocked_penalty: 20,
            tiers: TierThresholds::default(),
        }
    }
}

/// How far a completion change propagates when rescoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    /// Only tasks that list the changed task as a dependency
    #[default]
    Direct,
    /// Every task reachable over depended-on-by edges
    Transitive,
}

/// Configuration for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Priority formula parameters
    pub scoring: ScoringConfig,
    /// Rescoring policy after a completion change
    pub cascade: CascadeMode,
    /// Default length of a top-N listing
    pub top_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            cascade: CascadeMode::Direct,
            top_limit: 5,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scoring parameters.
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    /// Set the cascade policy.
    pub fn with_cascade(mut self, cascade: CascadeMode) -> Self {
        self.cascade = cascade;
        self
    }

    /// Set the default top-N length.
    pub fn with_top_limit(mut self, limit: usize) -> Self {
        self.top_limit = limit;
        self
    }

    /// Parse and validate a JSON configuration. Missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("EngineConfig::load path={}", path.display());
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        debug!(
            "Config loaded: weights={:?}, scale={}, cascade={:?}",
            config.scoring.weights, config.scoring.scale, config.cascade
        );
        Ok(config)
    }

    /// Reject weights, scale or thresholds the formula cannot use.
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in self.scoring.weights.as_array() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "weight '{}' must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        let scale = self.scoring.scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "scale must be positive, got {}",
                scale
            )));
        }

        let tiers = self.scoring.tiers;
        if !(tiers.critical > tiers.high && tiers.high > tiers.medium) {
            return Err(EngineError::InvalidConfig(format!(
                "tier thresholds must be strictly descending, got critical={} high={} medium={}",
                tiers.critical, tiers.high, tiers.medium
            )));
        }

        Ok(())
    }
}
