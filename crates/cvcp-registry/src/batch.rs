//! Batch computation over many subjects as one atomic unit.
//!
//! Subjects are processed in list order. Ineligible subjects are skipped
//! and reported, never treated as errors. A hard failure anywhere discards
//! every staged record, so the store is either fully updated or untouched.

use std::collections::BTreeMap;

use cvcp_core::constants::{FRESHNESS_WINDOW_SECS, MAX_BATCH_SIZE};
use cvcp_core::error::RegistryError;
use cvcp_core::traits::ScoreCalculator;
use cvcp_core::types::{Address, CallContext};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BatchFreshness;
use crate::lock::ExecutionLock;
use crate::meter::CostMeter;
use crate::registry::{Registry, apply_evaluation};
use crate::store::SubjectRecord;

/// Why a subject was left out of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Nothing has been submitted for the subject.
    NoData,
    /// `now < last_submission + minimum_update_interval`.
    CooldownActive,
    /// Snapshot older than the freshness window under
    /// [`BatchFreshness::Enforce`].
    Stale,
}

/// Outcome of a committed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Subjects scored, in list order. Duplicates appear once per occurrence.
    pub computed: Vec<Address>,
    /// Subjects skipped, in list order.
    pub skipped: Vec<(Address, SkipReason)>,
}

impl<C: ScoreCalculator> Registry<C> {
    /// Compute scores for up to 50 subjects in one atomic call.
    ///
    /// A subject is skipped when it has no snapshot or is still inside its
    /// submission cooldown. Under [`BatchFreshness::Enforce`] stale
    /// snapshots are skipped too; under `TrustCaller` they are scored.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::BatchTooLarge`] for more than 50 subjects
    /// - [`RegistryError::Unauthorized`] / [`RegistryError::OperationPaused`]
    /// - [`RegistryError::ScoreOutOfBounds`] aborts the whole batch
    pub fn batch_compute(
        &mut self,
        ctx: &CallContext,
        subjects: &[Address],
    ) -> Result<BatchReport, RegistryError> {
        let _guard = ExecutionLock::enter(&self.lock)?;
        self.access.require_authorized(&ctx.caller)?;
        self.pause.require_not_paused()?;
        if subjects.len() > MAX_BATCH_SIZE {
            return Err(RegistryError::BatchTooLarge {
                len: subjects.len(),
                max: MAX_BATCH_SIZE,
            });
        }

        let mut meter = CostMeter::new();
        let mut staged: BTreeMap<Address, SubjectRecord> = BTreeMap::new();
        let mut events = Vec::new();
        let mut report = BatchReport::default();

        for &subject in subjects {
            let mut record = staged
                .get(&subject)
                .cloned()
                .unwrap_or_else(|| self.store.load(&subject));
            let Some(snapshot) = record.snapshot else {
                report.skipped.push((subject, SkipReason::NoData));
                continue;
            };
            if let Some(reason) = self.skip_reason(snapshot.timestamp, ctx.timestamp) {
                debug!(%subject, ?reason, "registry: batch skip");
                report.skipped.push((subject, reason));
                continue;
            }

            let eval = self.evaluate(&snapshot, &mut meter)?;
            apply_evaluation(
                &mut record,
                subject,
                &eval,
                ctx,
                self.params.history_cap,
                &mut meter,
                &mut events,
            );
            staged.insert(subject, record);
            report.computed.push(subject);
        }

        for (subject, record) in staged {
            self.store.put(subject, record);
        }
        self.emit_all(&events, &mut meter);
        info!(
            computed = report.computed.len(),
            skipped = report.skipped.len(),
            cost = meter.consumed(),
            "registry: batch committed"
        );
        Ok(report)
    }

    fn skip_reason(&self, last_submission: u64, now: u64) -> Option<SkipReason> {
        let next = last_submission.saturating_add(self.params.minimum_update_interval);
        if now < next {
            return Some(SkipReason::CooldownActive);
        }
        if self.batch_freshness == BatchFreshness::Enforce
            && now.saturating_sub(last_submission) > FRESHNESS_WINDOW_SECS
        {
            return Some(SkipReason::Stale);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::RegistryConfig;
    use crate::sink::MemoryEventLog;
    use cvcp_core::types::BehavioralMetrics;

    const T0: u64 = 1_700_000_000;
    const HOUR: u64 = 3600;

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    fn ctx(timestamp: u64) -> CallContext {
        CallContext::new(addr(1), timestamp, 0)
    }

    fn metrics() -> BehavioralMetrics {
        BehavioralMetrics {
            transaction_frequency: 25,
            average_transaction_value: 500,
            protocol_interaction_count: 5,
            total_defi_balance_usd: 10_000,
            total_staked_usd: 5_000,
            staking_duration_days: 180,
            ..Default::default()
        }
    }

    fn registry(freshness: BatchFreshness) -> (Registry, Arc<MemoryEventLog>) {
        let log = Arc::new(MemoryEventLog::new());
        let cfg = RegistryConfig {
            batch_freshness: freshness,
            ..RegistryConfig::default()
        };
        let reg = Registry::new(addr(1), cfg).unwrap().with_sink(log.clone());
        (reg, log)
    }

    #[test]
    fn too_large_rejected_before_any_work() {
        let (mut reg, log) = registry(BatchFreshness::TrustCaller);
        reg.submit_metrics(&ctx(T0), addr(9), metrics()).unwrap();
        log.drain();
        let subjects = vec![addr(9); MAX_BATCH_SIZE + 1];
        assert_eq!(
            reg.batch_compute(&ctx(T0 + HOUR), &subjects),
            Err(RegistryError::BatchTooLarge { len: 51, max: 50 })
        );
        assert!(!reg.get_score(&addr(9)).is_active);
        assert!(log.is_empty());
    }

    #[test]
    fn exactly_max_accepted() {
        let (mut reg, _) = registry(BatchFreshness::TrustCaller);
        let subjects: Vec<_> = (10..10 + MAX_BATCH_SIZE as u8).map(addr).collect();
        let report = reg.batch_compute(&ctx(T0), &subjects).unwrap();
        assert!(report.computed.is_empty());
        assert_eq!(report.skipped.len(), MAX_BATCH_SIZE);
        assert_eq!(reg.subject_count(), 0);
    }

    #[test]
    fn skips_ineligible_and_scores_the_rest() {
        let (mut reg, log) = registry(BatchFreshness::TrustCaller);
        reg.submit_metrics(&ctx(T0), addr(10), metrics()).unwrap();
        reg.submit_metrics(&ctx(T0 + HOUR / 2), addr(11), metrics()).unwrap();
        log.drain();

        let report = reg
            .batch_compute(&ctx(T0 + HOUR), &[addr(10), addr(11), addr(12)])
            .unwrap();
        assert_eq!(report.computed, vec![addr(10)]);
        assert_eq!(
            report.skipped,
            vec![
                (addr(11), SkipReason::CooldownActive),
                (addr(12), SkipReason::NoData),
            ]
        );
        assert!(reg.get_score(&addr(10)).is_active);
        assert!(!reg.get_score(&addr(11)).is_active);
        assert_eq!(reg.subject_count(), 2);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn trust_caller_scores_stale_snapshots() {
        let (mut reg, _) = registry(BatchFreshness::TrustCaller);
        reg.submit_metrics(&ctx(T0), addr(10), metrics()).unwrap();
        let later = T0 + FRESHNESS_WINDOW_SECS + 1;
        let report = reg.batch_compute(&ctx(later), &[addr(10)]).unwrap();
        assert_eq!(report.computed, vec![addr(10)]);
        assert_eq!(reg.get_score(&addr(10)).last_updated, later);
    }

    #[test]
    fn enforce_skips_stale_snapshots() {
        let (mut reg, _) = registry(BatchFreshness::Enforce);
        reg.submit_metrics(&ctx(T0), addr(10), metrics()).unwrap();
        reg.submit_metrics(&ctx(T0 + 2 * FRESHNESS_WINDOW_SECS), addr(11), metrics())
            .unwrap();
        let now = T0 + 2 * FRESHNESS_WINDOW_SECS + HOUR;
        let report = reg.batch_compute(&ctx(now), &[addr(10), addr(11)]).unwrap();
        assert_eq!(report.computed, vec![addr(11)]);
        assert_eq!(report.skipped, vec![(addr(10), SkipReason::Stale)]);
        assert!(!reg.get_score(&addr(10)).is_active);
    }

    #[test]
    fn duplicates_compute_twice() {
        let (mut reg, _) = registry(BatchFreshness::TrustCaller);
        reg.submit_metrics(&ctx(T0), addr(10), metrics()).unwrap();
        let report = reg
            .batch_compute(&ctx(T0 + HOUR), &[addr(10), addr(10)])
            .unwrap();
        assert_eq!(report.computed.len(), 2);
        let score = reg.get_score(&addr(10));
        assert_eq!(score.update_count, 2);
        assert_eq!(reg.get_history(&addr(10)).len(), 2);
        assert_eq!(
            reg.get_update_metadata(&addr(10)).unwrap().previous_score,
            score.total_score
        );
    }

    #[test]
    fn paused_and_unauthorized_rejected() {
        let (mut reg, _) = registry(BatchFreshness::TrustCaller);
        let stranger = CallContext::new(addr(2), T0, 0);
        assert_eq!(
            reg.batch_compute(&stranger, &[addr(10)]),
            Err(RegistryError::Unauthorized(addr(2)))
        );
        reg.pause(&ctx(T0)).unwrap();
        assert_eq!(
            reg.batch_compute(&ctx(T0), &[addr(10)]),
            Err(RegistryError::OperationPaused)
        );
    }
}
