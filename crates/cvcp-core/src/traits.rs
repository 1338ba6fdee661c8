//! Seams between the registry and its collaborators.
//!
//! [`ScoreCalculator`] is implemented by the scoring engine (cvcp-scoring);
//! [`EventSink`] by anything that consumes emitted records.

use crate::constants::{MAX_SCORE, MIN_SCORE, PREVIEW_CONFIDENCE};
use crate::events::RegistryEvent;
use crate::types::{BehavioralMetrics, ComponentScores, ScorePreview};

/// Deterministic scoring pipeline.
///
/// Implementations must be pure: identical inputs always produce identical
/// outputs and no method may touch registry state.
pub trait ScoreCalculator: Send + Sync {
    /// Compute the five component scores, each in `0..=COMPONENT_MAX`.
    fn component_scores(&self, metrics: &BehavioralMetrics) -> ComponentScores;

    /// Weighted sum of component scores divided by the total weight.
    fn raw_total(&self, components: &ComponentScores) -> u64;

    /// Map a raw total onto the public range `MIN_SCORE..=MAX_SCORE`.
    fn normalize(&self, raw_total: u64) -> u64;

    /// Confidence in `0..=MAX_CONFIDENCE` from data quality and metric richness.
    fn confidence(&self, metrics: &BehavioralMetrics, data_quality: u64) -> u64;

    /// Components and normalized total in one pass.
    fn score(&self, metrics: &BehavioralMetrics) -> (ComponentScores, u64) {
        let components = self.component_scores(metrics);
        let total = self.normalize(self.raw_total(&components));
        (components, total)
    }

    /// Unauthenticated estimate. Confidence is always [`PREVIEW_CONFIDENCE`],
    /// independent of the data.
    fn preview(&self, metrics: &BehavioralMetrics) -> ScorePreview {
        let (components, total) = self.score(metrics);
        ScorePreview {
            total_score: total.clamp(MIN_SCORE, MAX_SCORE),
            components,
            confidence: PREVIEW_CONFIDENCE,
        }
    }
}

/// Consumer of emitted registry records.
///
/// Called synchronously after a call commits, still inside the call's
/// execution scope.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RegistryEvent);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &RegistryEvent) {}
}
