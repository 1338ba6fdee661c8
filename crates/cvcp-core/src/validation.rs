//! Metrics validation and data-quality scoring.
//!
//! Pure functions. Validation runs before any registry mutation; a rejected
//! submission leaves no trace.

use crate::constants::{
    COMPONENT_MAX, MAX_DATA_QUALITY, MAX_SCORE, MIN_DATA_QUALITY, MIN_SCORE,
    QUALITY_CROSS_CHAIN, QUALITY_DEFI_BALANCE, QUALITY_DEFI_PROTOCOLS, QUALITY_STAKING,
    QUALITY_TX_FREQUENCY, QUALITY_TX_VALUE,
};
use crate::error::ValidationError;
use crate::types::{Address, BehavioralMetrics};

/// Validate a submission and return its data-quality score.
///
/// Checks, in order: the subject is not the null identity, every bounded
/// field is within its maximum, and the data-quality score reaches
/// [`MIN_DATA_QUALITY`].
///
/// # Errors
///
/// - [`ValidationError::NullSubject`] for [`Address::ZERO`]
/// - [`ValidationError::FieldOutOfBounds`] for the first field over its maximum
/// - [`ValidationError::InsufficientDataQuality`] when quality is below 25
pub fn validate_submission(
    subject: &Address,
    metrics: &BehavioralMetrics,
) -> Result<u64, ValidationError> {
    if subject.is_zero() {
        return Err(ValidationError::NullSubject);
    }
    check_metric_bounds(metrics)?;

    let score = data_quality_score(metrics);
    if score < MIN_DATA_QUALITY {
        return Err(ValidationError::InsufficientDataQuality {
            score,
            min: MIN_DATA_QUALITY,
        });
    }
    Ok(score)
}

/// Reject the first bounded field that exceeds its maximum.
pub fn check_metric_bounds(metrics: &BehavioralMetrics) -> Result<(), ValidationError> {
    for (field, value, max) in metrics.bounded_fields() {
        if value > max {
            return Err(ValidationError::FieldOutOfBounds { field, value, max });
        }
    }
    Ok(())
}

/// Weighted presence test over the four metric domains.
///
/// Magnitudes do not matter, only whether a signal is present:
///
/// | Signal                          | Points |
/// |---------------------------------|--------|
/// | transaction_frequency > 0       | 20     |
/// | average_transaction_value > 0   | 15     |
/// | cross_chain_activity_count > 1  | 10     |
/// | protocol_interaction_count > 0  | 20     |
/// | total_defi_balance_usd > 0      | 15     |
/// | total_staked_usd > 0            | 20     |
///
/// # Examples
///
/// ```
/// use cvcp_core::types::BehavioralMetrics;
/// use cvcp_core::validation::data_quality_score;
///
/// assert_eq!(data_quality_score(&BehavioralMetrics::default()), 0);
///
/// let m = BehavioralMetrics {
///     transaction_frequency: 1,
///     total_staked_usd: 1,
///     ..Default::default()
/// };
/// assert_eq!(data_quality_score(&m), 40);
/// ```
pub fn data_quality_score(m: &BehavioralMetrics) -> u64 {
    let mut score = 0;

    if m.transaction_frequency > 0 {
        score += QUALITY_TX_FREQUENCY;
    }
    if m.average_transaction_value > 0 {
        score += QUALITY_TX_VALUE;
    }
    if m.cross_chain_activity_count > 1 {
        score += QUALITY_CROSS_CHAIN;
    }

    if m.protocol_interaction_count > 0 {
        score += QUALITY_DEFI_PROTOCOLS;
    }
    if m.total_defi_balance_usd > 0 {
        score += QUALITY_DEFI_BALANCE;
    }

    if m.total_staked_usd > 0 {
        score += QUALITY_STAKING;
    }

    score.min(MAX_DATA_QUALITY)
}

/// Whether a component score lies in `0..=COMPONENT_MAX`.
pub fn is_valid_component_score(score: u64) -> bool {
    score <= COMPONENT_MAX
}

/// Whether a public total lies in `MIN_SCORE..=MAX_SCORE`.
pub fn is_valid_final_score(score: u64) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}
