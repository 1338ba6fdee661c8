//! Adversarial tests: attempts to bypass guards or observe partial state.
//!
//! Attack vectors:
//! - Unauthorized and revoked callers on every mutating entry point
//! - Mutations while paused
//! - Out-of-bound and low-quality metrics
//! - Oversized batches and hard failures mid-batch
//! - Re-entry from an event sink during a computation

use std::sync::{Arc, OnceLock};

use cvcp_core::constants::{COMPONENT_MAX, MAX_BATCH_SIZE};
use cvcp_core::error::RegistryError;
use cvcp_core::events::RegistryEvent;
use cvcp_core::traits::{EventSink, ScoreCalculator};
use cvcp_core::types::{Address, BehavioralMetrics, ComponentScores};
use cvcp_registry::{
    BatchFreshness, MemoryEventLog, Registry, RegistryConfig, SharedRegistry, SkipReason,
};
use cvcp_scoring::ScoringEngine;
use cvcp_tests::helpers::*;
use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Marks a snapshot the poisoned calculator will mis-score.
const POISON_ENGAGEMENT: u64 = 99;

/// Production engine, except it reports an out-of-range staking score for
/// poisoned snapshots.
struct PoisonedEngine;

impl ScoreCalculator for PoisonedEngine {
    fn component_scores(&self, metrics: &BehavioralMetrics) -> ComponentScores {
        let mut c = ScoringEngine.component_scores(metrics);
        if metrics.engagement_score == POISON_ENGAGEMENT {
            c.staking = COMPONENT_MAX + 50;
        }
        c
    }
    fn raw_total(&self, components: &ComponentScores) -> u64 {
        ScoringEngine.raw_total(components)
    }
    fn normalize(&self, raw_total: u64) -> u64 {
        ScoringEngine.normalize(raw_total)
    }
    fn confidence(&self, metrics: &BehavioralMetrics, data_quality: u64) -> u64 {
        ScoringEngine.confidence(metrics, data_quality)
    }
}

fn poisoned() -> BehavioralMetrics {
    BehavioralMetrics {
        engagement_score: POISON_ENGAGEMENT,
        ..reference_metrics()
    }
}

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

#[test]
fn stranger_cannot_mutate_anything() {
    let (mut reg, log) = registry();
    let x = addr(0xEE);
    let c = ctx(x, T0);
    let unauthorized = Err(RegistryError::Unauthorized(x));

    assert_eq!(reg.submit_metrics(&c, addr(9), reference_metrics()).map(|_| ()), unauthorized);
    assert_eq!(reg.compute_score(&c, addr(9)).map(|_| ()), unauthorized);
    assert_eq!(reg.batch_compute(&c, &[addr(9)]).map(|_| ()), unauthorized);
    assert_eq!(reg.authorize_provider(&c, x), unauthorized);
    assert_eq!(reg.revoke_provider(&c, owner()), unauthorized);
    assert_eq!(reg.set_minimum_interval(&c, 900), unauthorized);
    assert_eq!(reg.set_history_cap(&c, 20), unauthorized);
    assert_eq!(reg.pause(&c), unauthorized);
    assert_eq!(reg.unpause(&c), unauthorized);
    assert_eq!(reg.transfer_ownership(&c, x), unauthorized);

    assert!(log.is_empty());
    assert_eq!(reg.subject_count(), 0);
    assert_eq!(reg.owner(), owner());
}

#[test]
fn provider_cannot_escalate() {
    let (mut reg, _) = registry();
    reg.authorize_provider(&ctx(owner(), T0), addr(2)).unwrap();
    let p = ctx(addr(2), T0);
    assert!(reg.submit_metrics(&p, addr(9), reference_metrics()).is_ok());
    assert!(reg.compute_score(&p, addr(9)).is_ok());
    assert_eq!(
        reg.authorize_provider(&p, addr(3)),
        Err(RegistryError::Unauthorized(addr(2)))
    );
    assert_eq!(
        reg.transfer_ownership(&p, addr(2)),
        Err(RegistryError::Unauthorized(addr(2)))
    );
    assert!(!reg.is_authorized(&addr(3)));
}

#[test]
fn revocation_takes_effect_immediately() {
    let (mut reg, _) = registry();
    let o = ctx(owner(), T0);
    reg.authorize_provider(&o, addr(2)).unwrap();
    reg.submit_metrics(&ctx(addr(2), T0), addr(9), reference_metrics())
        .unwrap();
    reg.revoke_provider(&o, addr(2)).unwrap();
    assert_eq!(
        reg.compute_score(&ctx(addr(2), T0), addr(9)),
        Err(RegistryError::Unauthorized(addr(2)))
    );
    // Data submitted earlier stays usable by other providers.
    assert!(reg.compute_score(&o, addr(9)).is_ok());
}

// ---------------------------------------------------------------------------
// Pause
// ---------------------------------------------------------------------------

#[test]
fn pause_freezes_every_mutation_except_unpause() {
    let (mut reg, log) = registry();
    let o = ctx(owner(), T0);
    reg.submit_metrics(&o, addr(9), reference_metrics()).unwrap();
    reg.pause(&o).unwrap();
    log.drain();

    let paused = Err(RegistryError::OperationPaused);
    let later = ctx(owner(), T0 + HOUR);
    assert_eq!(reg.submit_metrics(&later, addr(9), reference_metrics()).map(|_| ()), paused);
    assert_eq!(reg.compute_score(&o, addr(9)).map(|_| ()), paused);
    assert_eq!(reg.batch_compute(&later, &[addr(9)]).map(|_| ()), paused);
    assert_eq!(reg.authorize_provider(&o, addr(2)), paused);
    assert_eq!(reg.revoke_provider(&o, addr(2)), paused);
    assert_eq!(reg.set_minimum_interval(&o, 900), paused);
    assert_eq!(reg.set_history_cap(&o, 20), paused);
    assert_eq!(reg.transfer_ownership(&o, addr(2)), paused);
    assert_eq!(reg.pause(&o), paused);
    assert!(log.is_empty());

    // Views still answer.
    assert!(reg.get_snapshot(&addr(9)).is_some());
    assert!(!reg.get_score(&addr(9)).is_active);
    assert_eq!(reg.preview_score(&reference_metrics()).total_score, 346);

    reg.unpause(&o).unwrap();
    assert!(reg.compute_score(&o, addr(9)).is_ok());
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

#[test]
fn out_of_bound_fields_rejected_without_writes() {
    let (mut reg, log) = registry();
    let cases = [
        BehavioralMetrics { gas_efficiency_score: 101, ..reference_metrics() },
        BehavioralMetrics { leverage_ratio: 10_001, ..reference_metrics() },
        BehavioralMetrics { portfolio_volatility: 101, ..reference_metrics() },
        BehavioralMetrics { engagement_score: u64::MAX, ..reference_metrics() },
    ];
    for m in cases {
        assert!(matches!(
            reg.submit_metrics(&ctx(owner(), T0), addr(9), m),
            Err(RegistryError::InvalidInput(_))
        ));
    }
    assert!(log.is_empty());
    assert!(reg.get_snapshot(&addr(9)).is_none());
}

#[test]
fn maximal_bounded_fields_accepted() {
    let (mut reg, _) = registry();
    let m = BehavioralMetrics {
        gas_efficiency_score: 100,
        leverage_ratio: 10_000,
        portfolio_volatility: 100,
        ..reference_metrics()
    };
    assert!(reg.submit_metrics(&ctx(owner(), T0), addr(9), m).is_ok());
    assert!(reg.compute_score(&ctx(owner(), T0), addr(9)).is_ok());
}

#[test]
fn null_subject_and_quality_floor() {
    let (mut reg, _) = registry();
    assert!(matches!(
        reg.submit_metrics(&ctx(owner(), T0), Address::ZERO, reference_metrics()),
        Err(RegistryError::InvalidInput(_))
    ));
    // Exactly at the quality floor.
    let thin = BehavioralMetrics {
        cross_chain_activity_count: 5,
        average_transaction_value: 1,
        ..Default::default()
    };
    assert_eq!(
        reg.submit_metrics(&ctx(owner(), T0), addr(9), thin),
        Ok(25)
    );
    let thinner = BehavioralMetrics {
        average_transaction_value: 1,
        ..Default::default()
    };
    assert_eq!(
        reg.submit_metrics(&ctx(owner(), T0), addr(10), thinner),
        Err(RegistryError::InsufficientDataQuality { score: 15, min: 25 })
    );
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[test]
fn oversized_batch_touches_nothing() {
    let (mut reg, log) = registry();
    for b in 10..20 {
        reg.submit_metrics(&ctx(owner(), T0), addr(b), reference_metrics())
            .unwrap();
    }
    log.drain();
    let subjects: Vec<_> = (0..=MAX_BATCH_SIZE).map(|i| addr(10 + (i % 10) as u8)).collect();
    assert_eq!(subjects.len(), 51);
    assert_eq!(
        reg.batch_compute(&ctx(owner(), T0 + HOUR), &subjects),
        Err(RegistryError::BatchTooLarge { len: 51, max: 50 })
    );
    assert!(reg.scored_subjects().is_empty());
    assert!(log.is_empty());
}

#[test]
fn batch_updates_only_eligible_subjects() {
    let (mut reg, _) = registry();
    let o = ctx(owner(), T0);
    // addr(10): scored earlier, resubmitted too recently.
    reg.submit_metrics(&o, addr(10), reference_metrics()).unwrap();
    reg.compute_score(&o, addr(10)).unwrap();
    let before = reg.get_score(&addr(10));
    reg.submit_metrics(&ctx(owner(), T0 + HOUR), addr(10), reference_metrics())
        .unwrap();
    // addr(11): eligible.
    reg.submit_metrics(&o, addr(11), reference_metrics()).unwrap();

    let report = reg
        .batch_compute(&ctx(owner(), T0 + HOUR + 60), &[addr(10), addr(11), addr(12)])
        .unwrap();
    assert_eq!(report.computed, vec![addr(11)]);
    assert_eq!(
        report.skipped,
        vec![
            (addr(10), SkipReason::CooldownActive),
            (addr(12), SkipReason::NoData),
        ]
    );
    assert_eq!(reg.get_score(&addr(10)), before);
    assert_eq!(reg.get_history(&addr(10)).len(), 1);
    assert!(reg.get_score(&addr(11)).is_active);
}

#[test]
fn hard_failure_discards_whole_batch() {
    let log = Arc::new(MemoryEventLog::new());
    let mut reg = Registry::with_calculator(owner(), RegistryConfig::default(), PoisonedEngine)
        .unwrap()
        .with_sink(log.clone());
    let o = ctx(owner(), T0);
    reg.submit_metrics(&o, addr(10), reference_metrics()).unwrap();
    reg.submit_metrics(&o, addr(11), poisoned()).unwrap();
    reg.submit_metrics(&o, addr(12), reference_metrics()).unwrap();
    log.drain();

    let err = reg
        .batch_compute(&ctx(owner(), T0 + HOUR), &[addr(10), addr(11), addr(12)])
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::ScoreOutOfBounds { component: "staking", .. }
    ));
    for b in 10..=12 {
        assert!(!reg.get_score(&addr(b)).is_active);
        assert!(reg.get_history(&addr(b)).is_empty());
        assert!(reg.get_update_metadata(&addr(b)).is_none());
    }
    assert!(log.is_empty());

    // Without the poisoned subject the same batch commits.
    let report = reg
        .batch_compute(&ctx(owner(), T0 + HOUR), &[addr(10), addr(12)])
        .unwrap();
    assert_eq!(report.computed.len(), 2);
}

#[test]
fn batch_freshness_both_modes() {
    for (mode, expect_scored) in [
        (BatchFreshness::TrustCaller, true),
        (BatchFreshness::Enforce, false),
    ] {
        let (mut reg, _) = registry_with(RegistryConfig {
            batch_freshness: mode,
            ..RegistryConfig::default()
        });
        reg.submit_metrics(&ctx(owner(), T0), addr(9), reference_metrics())
            .unwrap();
        let report = reg
            .batch_compute(&ctx(owner(), T0 + 2 * DAY), &[addr(9)])
            .unwrap();
        assert_eq!(reg.get_score(&addr(9)).is_active, expect_scored, "{mode:?}");
        if !expect_scored {
            assert_eq!(report.skipped, vec![(addr(9), SkipReason::Stale)]);
        }
        // The single-subject path rejects stale data in either mode.
        assert!(matches!(
            reg.compute_score(&ctx(owner(), T0 + 2 * DAY), addr(9)),
            Err(RegistryError::DataStale { .. })
        ));
    }
}

// ---------------------------------------------------------------------------
// Re-entrancy
// ---------------------------------------------------------------------------

/// Sink that calls back into the registry whenever a score is computed.
#[derive(Default)]
struct ReentrantSink {
    registry: OnceLock<SharedRegistry>,
    attempts: Mutex<Vec<Result<(), RegistryError>>>,
}

impl EventSink for ReentrantSink {
    fn emit(&self, event: &RegistryEvent) {
        let (Some(shared), RegistryEvent::ScoreComputed { subject, .. }) =
            (self.registry.get(), event)
        else {
            return;
        };
        let nested = shared.compute_score(&ctx(owner(), T0), *subject).map(|_| ());
        let read = shared.get_score(subject).map(|_| ());
        let mut attempts = self.attempts.lock();
        attempts.push(nested);
        attempts.push(read);
    }
}

#[test]
fn sink_cannot_reenter_computation() {
    let sink = Arc::new(ReentrantSink::default());
    let reg = Registry::new(owner(), RegistryConfig::default())
        .unwrap()
        .with_sink(sink.clone());
    let shared = SharedRegistry::new(reg);
    assert!(sink.registry.set(shared.clone()).is_ok());

    let o = ctx(owner(), T0);
    shared.submit_metrics(&o, addr(9), reference_metrics()).unwrap();
    let score = shared.compute_score(&o, addr(9)).unwrap();

    assert_eq!(
        *sink.attempts.lock(),
        vec![
            Err(RegistryError::ReentrantCall),
            Err(RegistryError::ReentrantCall),
        ]
    );
    assert_eq!(score.update_count, 1);
    assert_eq!(shared.get_score(&addr(9)).unwrap().update_count, 1);
    assert_eq!(shared.get_history(&addr(9)).unwrap().len(), 1);
}

#[test]
fn lock_released_after_reentrant_rejection() {
    let sink = Arc::new(ReentrantSink::default());
    let reg = Registry::new(owner(), RegistryConfig::default())
        .unwrap()
        .with_sink(sink.clone());
    let shared = SharedRegistry::new(reg);
    assert!(sink.registry.set(shared.clone()).is_ok());

    shared
        .submit_metrics(&ctx(owner(), T0), addr(9), reference_metrics())
        .unwrap();
    shared.compute_score(&ctx(owner(), T0), addr(9)).unwrap();
    // A fresh top-level call after the first completes is fine.
    let second = shared.compute_score(&ctx(owner(), T0 + 1), addr(9)).unwrap();
    assert_eq!(second.update_count, 2);
}
