//! Scoring engine implementing the [`ScoreCalculator`] trait.
//!
//! Combines the component scorers with weighted aggregation, normalization
//! onto the public range, and confidence estimation.
//! All arithmetic is integer-only with u128 intermediates where products
//! can grow.

use cvcp_core::constants::{
    MAX_CONFIDENCE, MAX_SCORE, MIN_SCORE, RAW_TOTAL_SCALE, SCORE_RANGE, WEIGHT_DEFI,
    WEIGHT_HISTORY, WEIGHT_RISK, WEIGHT_STAKING, WEIGHT_TOTAL, WEIGHT_TRANSACTION,
};
use cvcp_core::traits::ScoreCalculator;
use cvcp_core::types::{BehavioralMetrics, ComponentScores};

use crate::components;

/// The production scoring engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    /// Create a new ScoringEngine.
    pub fn new() -> Self {
        Self
    }
}

/// `(tx*25 + defi*20 + staking*25 + risk*20 + history*10) / 100`.
///
/// # Examples
///
/// ```
/// use cvcp_core::types::ComponentScores;
/// use cvcp_scoring::engine::aggregate;
///
/// let c = ComponentScores { transaction: 200, defi: 200, staking: 200, risk: 200, history: 200 };
/// assert_eq!(aggregate(&c), 200);
/// ```
pub fn aggregate(c: &ComponentScores) -> u64 {
    let weighted = c.transaction as u128 * WEIGHT_TRANSACTION as u128
        + c.defi as u128 * WEIGHT_DEFI as u128
        + c.staking as u128 * WEIGHT_STAKING as u128
        + c.risk as u128 * WEIGHT_RISK as u128
        + c.history as u128 * WEIGHT_HISTORY as u128;
    (weighted / WEIGHT_TOTAL as u128) as u64
}

/// `raw_total * 550 / 1000 + 300`, clamped to `[300, 850]`.
///
/// # Examples
///
/// ```
/// use cvcp_scoring::engine::normalize;
///
/// assert_eq!(normalize(0), 300);
/// assert_eq!(normalize(85), 346);
/// assert_eq!(normalize(1000), 850);
/// assert_eq!(normalize(u64::MAX), 850);
/// ```
pub fn normalize(raw_total: u64) -> u64 {
    let scaled = raw_total as u128 * SCORE_RANGE as u128 / RAW_TOTAL_SCALE as u128;
    let shifted = scaled.saturating_add(MIN_SCORE as u128);
    shifted.clamp(MIN_SCORE as u128, MAX_SCORE as u128) as u64
}

/// Confidence from data quality plus richness bonuses, capped at 100.
///
/// | Condition                        | Bonus |
/// |----------------------------------|-------|
/// | transaction_frequency > 10       | +5    |
/// | protocol_interaction_count > 3   | +5    |
/// | staking_duration_days > 30       | +10   |
/// | cross_chain_activity_count > 2   | +5    |
/// | interaction_depth_score > 50     | +5    |
/// | yield_farming_active > 0         | +3    |
/// | staking_loyalty_score > 70       | +7    |
pub fn confidence(m: &BehavioralMetrics, data_quality: u64) -> u64 {
    let bonuses: [(bool, u64); 7] = [
        (m.transaction_frequency > 10, 5),
        (m.protocol_interaction_count > 3, 5),
        (m.staking_duration_days > 30, 10),
        (m.cross_chain_activity_count > 2, 5),
        (m.interaction_depth_score > 50, 5),
        (m.yield_farming_active > 0, 3),
        (m.staking_loyalty_score > 70, 7),
    ];
    let total = bonuses
        .iter()
        .filter(|(met, _)| *met)
        .fold(data_quality, |acc, (_, bonus)| acc.saturating_add(*bonus));
    total.min(MAX_CONFIDENCE)
}

impl ScoreCalculator for ScoringEngine {
    fn component_scores(&self, metrics: &BehavioralMetrics) -> ComponentScores {
        components::component_scores(metrics)
    }

    fn raw_total(&self, components: &ComponentScores) -> u64 {
        aggregate(components)
    }

    fn normalize(&self, raw_total: u64) -> u64 {
        normalize(raw_total)
    }

    fn confidence(&self, metrics: &BehavioralMetrics, data_quality: u64) -> u64 {
        confidence(metrics, data_quality)
    }
}
