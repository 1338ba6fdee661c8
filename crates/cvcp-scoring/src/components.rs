//! The five component scorers.
//!
//! Pure computation over a [`BehavioralMetrics`] record. Every scorer returns
//! a value in `0..=COMPONENT_MAX` for any input, validated or not.

use cvcp_core::constants::{COMPONENT_MAX, LEVERAGE_UNIT};
use cvcp_core::types::{BehavioralMetrics, ComponentScores};

use crate::scaling::{
    bell_frequency, cap_to_max, linear_scale, log_scale, normalize_to_range, time_decay,
};

/// Denominator of every weighted sum below (weights per scorer sum to 100).
const WEIGHT_DENOMINATOR: u64 = 100;

/// Penalty per liquidation event.
const LIQUIDATION_PENALTY: u64 = 30;

/// Leverage above this ratio (2×) is penalized.
const LEVERAGE_PENALTY_THRESHOLD: u64 = 2 * LEVERAGE_UNIT;

/// Divisor applied to leverage above the threshold.
const LEVERAGE_PENALTY_DIVISOR: u64 = 10;

/// Volatility above this percentage is penalized.
const VOLATILITY_PENALTY_THRESHOLD: u64 = 30;

/// Penalty per volatility point above the threshold.
const VOLATILITY_PENALTY_PER_POINT: u64 = 2;

/// Reward-claim frequency that scores best.
const OPTIMAL_REWARD_FREQUENCY: u64 = 20;

/// Transaction activity.
///
/// | Term                                              | Weight |
/// |---------------------------------------------------|--------|
/// | `log_scale(transaction_frequency, 10)`            | 25     |
/// | `log_scale(average_transaction_value, 100)`       | 25     |
/// | `normalize_to_range(gas_efficiency, 0, 100, 50)`  | 20     |
/// | `linear_scale(cross_chain_count, 10, 50)`         | 15     |
/// | `normalize_to_range(consistency, 0, 100, 50)`     | 15     |
pub fn transaction_score(m: &BehavioralMetrics) -> u64 {
    let weighted = log_scale(m.transaction_frequency, 10) * 25
        + log_scale(m.average_transaction_value, 100) * 25
        + normalize_to_range(m.gas_efficiency_score, 0, 100, 50) * 20
        + linear_scale(m.cross_chain_activity_count, 10, 50) * 15
        + normalize_to_range(m.consistency_metric, 0, 100, 50) * 15;

    cap_to_max(weighted / WEIGHT_DENOMINATOR, COMPONENT_MAX)
}

/// DeFi participation.
///
/// Weighted terms (protocols 35, balance 25, liquidity positions 25,
/// diversity 15) plus flat bonuses `interaction_depth / 10` and
/// `yield_farming_active * 5`.
pub fn defi_score(m: &BehavioralMetrics) -> u64 {
    let weighted = linear_scale(m.protocol_interaction_count, 15, 80) * 35
        + log_scale(m.total_defi_balance_usd, 1000) * 25
        + linear_scale(m.liquidity_position_count, 8, 40) * 25
        + normalize_to_range(m.protocol_diversity_score, 0, 100, 30) * 15;

    let bonus = (m.interaction_depth_score / 10).saturating_add(m.yield_farming_active.saturating_mul(5));

    cap_to_max((weighted / WEIGHT_DENOMINATOR).saturating_add(bonus), COMPONENT_MAX)
}

/// Staking commitment.
///
/// With no staking activity at all (amount, duration, and platform count
/// all zero) only a small loyalty/engagement bonus is returned and the main
/// formula is not evaluated.
pub fn staking_score(m: &BehavioralMetrics) -> u64 {
    if m.has_no_staking() {
        let bonus = m.staking_loyalty_score / 20 + m.interaction_depth_score / 50;
        return cap_to_max(bonus, COMPONENT_MAX);
    }

    let weighted = log_scale(m.total_staked_usd, 1000) * 40
        + time_decay(m.staking_duration_days) * 30
        + linear_scale(m.staking_platform_count, 6, 40) * 20
        + bell_frequency(m.reward_claim_frequency, OPTIMAL_REWARD_FREQUENCY) * 10;

    let bonus = m.staking_loyalty_score / 10;

    cap_to_max((weighted / WEIGHT_DENOMINATOR).saturating_add(bonus), COMPONENT_MAX)
}

/// Risk profile; higher is safer.
///
/// Starts at `COMPONENT_MAX` and subtracts, flooring at 0:
/// - 30 per liquidation event
/// - `(leverage - 200) / 10` when leverage exceeds 2×
/// - `(volatility - 30) * 2` when volatility exceeds 30
pub fn risk_score(m: &BehavioralMetrics) -> u64 {
    let mut score = COMPONENT_MAX;

    score = score.saturating_sub(m.liquidation_event_count.saturating_mul(LIQUIDATION_PENALTY));

    if m.leverage_ratio > LEVERAGE_PENALTY_THRESHOLD {
        let excess = m.leverage_ratio - LEVERAGE_PENALTY_THRESHOLD;
        score = score.saturating_sub(excess / LEVERAGE_PENALTY_DIVISOR);
    }

    if m.portfolio_volatility > VOLATILITY_PENALTY_THRESHOLD {
        let excess = m.portfolio_volatility - VOLATILITY_PENALTY_THRESHOLD;
        score = score.saturating_sub(excess.saturating_mul(VOLATILITY_PENALTY_PER_POINT));
    }

    score
}

/// Historical engagement.
///
/// Weighted terms (frequency 50, staking duration 30, consistency 20) plus
/// bonuses `account_age / 10 + engagement / 20 + activity_consistency / 20`.
pub fn history_score(m: &BehavioralMetrics) -> u64 {
    let weighted = linear_scale(m.transaction_frequency, 100, 80) * 50
        + time_decay(m.staking_duration_days) * 30
        + normalize_to_range(m.consistency_metric, 0, 100, 40) * 20;

    let bonus = (m.account_age_score / 10)
        .saturating_add(m.engagement_score / 20)
        .saturating_add(m.activity_consistency_score / 20);

    cap_to_max((weighted / WEIGHT_DENOMINATOR).saturating_add(bonus), COMPONENT_MAX)
}

/// All five component scores.
pub fn component_scores(m: &BehavioralMetrics) -> ComponentScores {
    ComponentScores {
        transaction: transaction_score(m),
        defi: defi_score(m),
        staking: staking_score(m),
        risk: risk_score(m),
        history: history_score(m),
    }
}
