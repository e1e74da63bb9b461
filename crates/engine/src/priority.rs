//! Priority scoring.
//!
//! A task's score is a weighted sum of four factors on a 1-5 scale, scaled
//! to 0-100:
//!
//! ```text
//! score = round((urgency × 0.30 + importance × 0.25 + deadline × 0.25 + ease × 0.20) × 20)
//! ```
//!
//! - `deadline` rises as the deadline approaches (see [`deadline_score`])
//! - `ease` is `6 - difficulty`, so easier tasks rank slightly higher
//!
//! A blocked task loses 20 points (floored at 0). The weights, scale,
//! penalty and tier thresholds come from [`ScoringConfig`].

use crate::config::ScoringConfig;
use serde::Serialize;
use taskrank_core::{PriorityTier, ScoredTask, Task, Time};
use tracing::trace;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Hours from `now` until `deadline`; negative when overdue.
pub fn hours_until(deadline: Time, now: Time) -> f64 {
    (deadline - now).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Deadline proximity on a 1-5 scale.
///
/// Overdue and anything due within six hours scores 5; more than thirty
/// days out scores 1.
pub fn deadline_score(hours_remaining: f64) -> f64 {
    match hours_remaining {
        h if h <= 0.0 => 5.0,
        h if h <= 6.0 => 5.0,
        h if h <= 24.0 => 4.5,
        h if h <= 72.0 => 4.0,
        h if h <= 168.0 => 3.0,
        h if h <= 336.0 => 2.0,
        h if h <= 720.0 => 1.5,
        _ => 1.0,
    }
}

/// Inverted difficulty: difficulty 1 gives 5, difficulty 5 gives 1.
pub fn ease_bonus(difficulty: u8) -> f64 {
    6.0 - f64::from(difficulty)
}

/// Rounded contribution of each factor to the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScoreBreakdown {
    /// Urgency contribution
    pub urgency: i32,
    /// Importance contribution
    pub importance: i32,
    /// Deadline contribution
    pub deadline: i32,
    /// Ease contribution
    pub ease: i32,
    /// Zero, or the negated penalty when blocked
    pub blocked_penalty: i32,
}

/// Result of scoring one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Priority {
    /// Score in 0-100
    pub score: u8,
    /// Tier derived from the score
    pub tier: PriorityTier,
    /// Per-factor contributions
    pub breakdown: ScoreBreakdown,
}

/// Computes priority scores. Pure: the same task, blocked flag and
/// evaluation instant always give the same result.
#[derive(Debug, Clone, Default)]
pub struct PriorityScorer {
    config: ScoringConfig,
}

impl PriorityScorer {
    /// Create a scorer with the given parameters.
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// The parameters in use.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a task as of `now`.
    ///
    /// Factors are not range-checked here; out-of-range input yields a
    /// clamped but meaningless score. Use [`Task::validate`] first.
    pub fn score(&self, task: &Task, blocked: bool, now: Time) -> Priority {
        let weights = &self.config.weights;
        let scale = self.config.scale;

        let urgency = f64::from(task.urgency);
        let importance = f64::from(task.importance);
        let deadline = deadline_score(hours_until(task.deadline, now));
        let ease = ease_bonus(task.difficulty);

        let weighted_sum = urgency * weights.urgency
            + importance * weights.importance
            + deadline * weights.deadline
            + ease * weights.ease;

        let mut raw = (weighted_sum * scale).round();
        let penalty = f64::from(self.config.blocked_penalty);
        if blocked {
            raw = (raw - penalty).max(0.0);
        }
        let score = raw.clamp(0.0, 100.0) as u8;

        let contribution = |factor: f64, weight: f64| (factor * weight * scale).round() as i32;
        let breakdown = ScoreBreakdown {
            urgency: contribution(urgency, weights.urgency),
            importance: contribution(importance, weights.importance),
            deadline: contribution(deadline, weights.deadline),
            ease: contribution(ease, weights.ease),
            blocked_penalty: if blocked { -i32::from(self.config.blocked_penalty) } else { 0 },
        };

        trace!(
            "scored task {}: weighted_sum={:.3} blocked={} score={}",
            task.id, weighted_sum, blocked, score
        );

        Priority {
            score,
            tier: self.tier(score),
            breakdown,
        }
    }

    /// Map a score to its tier.
    pub fn tier(&self, score: u8) -> PriorityTier {
        self.config.tiers.tier_for(score)
    }

    /// Score a task and attach the result to it.
    pub fn scored(&self, task: Task, blocked: bool, now: Time) -> ScoredTask {
        let priority = self.score(&task, blocked, now);
        ScoredTask {
            task,
            priority_score: priority.score,
            priority_tier: priority.tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TierThresholds, Weights};
    use chrono::{Duration, TimeZone, Utc};

    fn now() -> Time {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn task(urgency: u8, importance: u8, difficulty: u8, due_in: Duration) -> Task {
        Task::new("test", now() + due_in).with_factors(urgency, importance, difficulty)
    }

    #[test]
    fn test_ease_bonus_inverts_difficulty() {
        for difficulty in 1..=5u8 {
            let ease = ease_bonus(difficulty);
            assert!((1.0..=5.0).contains(&ease));
            assert_eq!(f64::from(difficulty) + ease, 6.0);
        }
        assert_eq!(ease_bonus(1), 5.0);
        assert_eq!(ease_bonus(5), 1.0);
    }

    #[test]
    fn test_deadline_score_buckets() {
        assert_eq!(deadline_score(-3.0), 5.0);
        assert_eq!(deadline_score(0.0), 5.0);
        assert_eq!(deadline_score(5.0), 5.0);
        assert_eq!(deadline_score(6.0), 5.0);
        assert_eq!(deadline_score(10.0), 4.5);
        assert_eq!(deadline_score(24.0), 4.5);
        assert_eq!(deadline_score(50.0), 4.0);
        assert_eq!(deadline_score(72.0), 4.0);
        assert_eq!(deadline_score(100.0), 3.0);
        assert_eq!(deadline_score(200.0), 2.0);
        assert_eq!(deadline_score(400.0), 1.5);
        assert_eq!(deadline_score(720.0), 1.5);
        assert_eq!(deadline_score(1000.0), 1.0);
    }

    #[test]
    fn test_deadline_score_non_increasing() {
        let mut previous = f64::MAX;
        for hours in (-48..2000).map(f64::from) {
            let score = deadline_score(hours);
            assert!(score <= previous, "score rose at {} hours", hours);
            previous = score;
        }
    }

    #[test]
    fn test_hours_until() {
        assert_eq!(hours_until(now() + Duration::minutes(90), now()), 1.5);
        assert_eq!(hours_until(now() - Duration::hours(2), now()), -2.0);
    }

    #[test]
    fn test_maximum_score() {
        let scorer = PriorityScorer::default();
        let priority = scorer.score(&task(5, 5, 1, Duration::hours(1)), false, now());
        assert_eq!(priority.score, 100);
        assert_eq!(priority.tier, PriorityTier::Critical);
    }

    #[test]
    fn test_minimum_unblocked_score() {
        let scorer = PriorityScorer::default();
        let priority = scorer.score(&task(1, 1, 5, Duration::days(365)), false, now());
        assert_eq!(priority.score, 20);
        assert_eq!(priority.tier, PriorityTier::Low);
    }

    #[test]
    fn test_blocked_penalty() {
        let scorer = PriorityScorer::default();
        let cases = [
            task(5, 5, 1, Duration::hours(1)),
            task(3, 3, 3, Duration::days(3)),
            task(2, 4, 2, Duration::days(10)),
            task(1, 1, 5, Duration::days(365)),
        ];
        for t in &cases {
            let open = scorer.score(t, false, now()).score;
            let blocked = scorer.score(t, true, now()).score;
            assert!(open >= 20);
            assert_eq!(blocked, open.saturating_sub(20));
        }
    }

    #[test]
    fn test_mid_range_score() {
        // 3×0.3 + 3×0.25 + 4×0.25 + 3×0.2 = 3.25 → 65
        let scorer = PriorityScorer::default();
        let t = task(3, 3, 3, Duration::days(3));
        let open = scorer.score(&t, false, now());
        assert_eq!(open.score, 65);
        assert_eq!(open.tier, PriorityTier::High);

        let blocked = scorer.score(&t, true, now());
        assert_eq!(blocked.score, 45);
        assert_eq!(blocked.tier, PriorityTier::Medium);
    }

    #[test]
    fn test_breakdown() {
        let scorer = PriorityScorer::default();
        let priority = scorer.score(&task(5, 5, 1, Duration::hours(1)), true, now());
        assert_eq!(
            priority.breakdown,
            ScoreBreakdown {
                urgency: 30,
                importance: 25,
                deadline: 25,
                ease: 20,
                blocked_penalty: -20,
            }
        );
        assert_eq!(priority.score, 80);
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        let scorer = PriorityScorer::default();
        let huge = scorer.score(&task(50, 50, 1, Duration::hours(1)), false, now());
        assert_eq!(huge.score, 100);

        let negative = scorer.score(&task(0, 0, 60, Duration::days(365)), true, now());
        assert_eq!(negative.score, 0);
    }

    #[test]
    fn test_custom_config() {
        let scorer = PriorityScorer::new(ScoringConfig {
            weights: Weights {
                urgency: 1.0,
                importance: 0.0,
                deadline: 0.0,
                ease: 0.0,
            },
            scale: 20.0,
            blocked_penalty: 50,
            tiers: TierThresholds {
                critical: 90,
                high: 70,
                medium: 40,
            },
        });
        let t = task(4, 1, 5, Duration::days(365));
        let open = scorer.score(&t, false, now());
        assert_eq!(open.score, 80);
        assert_eq!(open.tier, PriorityTier::High);
        assert_eq!(scorer.score(&t, true, now()).score, 30);
    }

    #[test]
    fn test_scored_attaches_priority() {
        let scorer = PriorityScorer::default();
        let t = task(5, 5, 1, Duration::hours(1));
        let id = t.id.clone();
        let scored = scorer.scored(t, false, now());
        assert_eq!(scored.id(), &id);
        assert_eq!(scored.priority_score, 100);
        assert_eq!(scored.priority_tier, PriorityTier::Critical);
    }
}
