//! Deterministic work accounting for a single call.
//!
//! Every step of a mutating call charges a fixed number of units. The
//! running total at the moment a score is computed is recorded in its
//! [`UpdateMetadata`](cvcp_core::types::UpdateMetadata) as the cost snapshot.

/// Units charged for validating one submission.
pub const COST_VALIDATE: u64 = 2_100;
/// Units charged per component scorer.
pub const COST_COMPONENT: u64 = 5_000;
/// Units charged for aggregation and normalization.
pub const COST_AGGREGATE: u64 = 1_000;
/// Units charged for confidence estimation.
pub const COST_CONFIDENCE: u64 = 800;
/// Units charged per record write.
pub const COST_STORE_WRITE: u64 = 20_000;
/// Units charged per history append.
pub const COST_HISTORY_PUSH: u64 = 5_000;
/// Units charged per emitted event.
pub const COST_EVENT: u64 = 1_500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostMeter {
    consumed: u64,
}

impl CostMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charge(&mut self, units: u64) {
        self.consumed = self.consumed.saturating_add(units);
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }
}
