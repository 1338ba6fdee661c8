//! The registry state machine.
//!
//! Every mutating entry point follows the same shape: enter the execution
//! lock, check authorization and the pause switch, validate, build the new
//! record off to the side, write it, then deliver events. Nothing is written
//! until every check has passed, so a failed call leaves state untouched
//! and emits nothing.

use std::fmt;
use std::sync::Arc;

use cvcp_core::constants::{
    COMPONENT_MAX, FRESHNESS_WINDOW_SECS, MAX_CONFIDENCE, MAX_SCORE, MIN_SCORE, PROTOCOL_VERSION,
};
use cvcp_core::error::RegistryError;
use cvcp_core::events::{RegistryEvent, percent_delta};
use cvcp_core::traits::{EventSink, NullSink, ScoreCalculator};
use cvcp_core::types::{
    Address, BehavioralMetrics, CallContext, ComponentScores, CreditScore, Hash256, Parameter,
    ProcessedData, ScorePreview, UpdateMetadata,
};
use cvcp_core::validation::{is_valid_component_score, is_valid_final_score, validate_submission};
use cvcp_scoring::ScoringEngine;
use tracing::{debug, info, warn};

use crate::access::{AccessControl, PauseGuard};
use crate::config::{
    BatchFreshness, RegistryConfig, RegistryParameters, check_history_cap, check_minimum_interval,
};
use crate::lock::{ExecutionGuard, ExecutionLock};
use crate::meter::{
    COST_AGGREGATE, COST_COMPONENT, COST_CONFIDENCE, COST_EVENT, COST_HISTORY_PUSH,
    COST_STORE_WRITE, COST_VALIDATE, CostMeter,
};
use crate::store::{SubjectRecord, SubjectStore};

/// Result of scoring one snapshot, before anything is written.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Evaluation {
    pub components: ComponentScores,
    pub total: u64,
    pub confidence: u64,
    pub content_hash: Hash256,
}

/// Per-subject credit-score registry.
pub struct Registry<C = ScoringEngine> {
    pub(crate) access: AccessControl,
    pub(crate) pause: PauseGuard,
    pub(crate) lock: Arc<ExecutionLock>,
    pub(crate) params: RegistryParameters,
    pub(crate) batch_freshness: BatchFreshness,
    pub(crate) store: SubjectStore,
    calculator: C,
    sink: Arc<dyn EventSink>,
}

impl<C> fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("owner", &self.access.owner())
            .field("paused", &self.pause.is_paused())
            .field("params", &self.params)
            .field("batch_freshness", &self.batch_freshness)
            .field("subjects", &self.store.len())
            .finish_non_exhaustive()
    }
}

impl Registry<ScoringEngine> {
    /// Registry backed by the production [`ScoringEngine`].
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidInput`] if `owner` is null
    /// - [`RegistryError::ParameterOutOfBounds`] if `config` is out of range
    pub fn new(owner: Address, config: RegistryConfig) -> Result<Self, RegistryError> {
        Self::with_calculator(owner, config, ScoringEngine::new())
    }
}

impl<C: ScoreCalculator> Registry<C> {
    /// Registry that scores with `calculator` instead of the production engine.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::new`].
    pub fn with_calculator(
        owner: Address,
        config: RegistryConfig,
        calculator: C,
    ) -> Result<Self, RegistryError> {
        config.validate()?;
        let access = AccessControl::new(owner)?;
        info!(%owner, ?config, "registry: initialized");
        Ok(Self {
            access,
            pause: PauseGuard::default(),
            lock: Arc::new(ExecutionLock::new()),
            params: config.parameters(),
            batch_freshness: config.batch_freshness,
            store: SubjectStore::new(),
            calculator,
            sink: Arc::new(NullSink),
        })
    }

    /// Rebuild from already-validated parts.
    pub(crate) fn from_parts(
        access: AccessControl,
        pause: PauseGuard,
        params: RegistryParameters,
        batch_freshness: BatchFreshness,
        store: SubjectStore,
        calculator: C,
    ) -> Self {
        Self {
            access,
            pause,
            lock: Arc::new(ExecutionLock::new()),
            params,
            batch_freshness,
            store,
            calculator,
            sink: Arc::new(NullSink),
        }
    }

    /// Replace the event sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub(crate) fn execution_lock(&self) -> &Arc<ExecutionLock> {
        &self.lock
    }

    // --- mutating: data path ---

    /// Accept a metrics snapshot for `subject`. Returns its data-quality score.
    ///
    /// The first submission for a subject is never rate limited.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Unauthorized`] if the caller is not a provider
    /// - [`RegistryError::OperationPaused`] while paused
    /// - [`RegistryError::InvalidInput`] for a null subject or an out-of-bound field
    /// - [`RegistryError::InsufficientDataQuality`] if quality is below 25
    /// - [`RegistryError::UpdateTooFrequent`] inside the cooldown window
    pub fn submit_metrics(
        &mut self,
        ctx: &CallContext,
        subject: Address,
        metrics: BehavioralMetrics,
    ) -> Result<u64, RegistryError> {
        let _guard = ExecutionLock::enter(&self.lock)?;
        self.access.require_authorized(&ctx.caller)?;
        self.pause.require_not_paused()?;

        let mut meter = CostMeter::new();
        let quality = validate_submission(&subject, &metrics)?;
        meter.charge(COST_VALIDATE);

        let remaining = self.cooldown_remaining(&subject, ctx.timestamp);
        if remaining > 0 {
            debug!(%subject, remaining, "registry: submission inside cooldown");
            return Err(RegistryError::UpdateTooFrequent { remaining });
        }

        let mut record = self.store.load(&subject);
        record.snapshot = Some(ProcessedData {
            metrics,
            data_quality_score: quality,
            timestamp: ctx.timestamp,
            provider: ctx.caller,
        });
        self.store.put(subject, record);
        meter.charge(COST_STORE_WRITE);

        self.emit_all(
            &[RegistryEvent::DataUpdated {
                subject,
                timestamp: ctx.timestamp,
                quality,
                provider: ctx.caller,
            }],
            &mut meter,
        );
        debug!(%subject, provider = %ctx.caller, quality, cost = meter.consumed(), "registry: metrics accepted");
        Ok(quality)
    }

    /// Score the latest snapshot for `subject` and commit the result.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ReentrantCall`] if another call is in progress
    /// - [`RegistryError::Unauthorized`] / [`RegistryError::OperationPaused`]
    /// - [`RegistryError::NoDataAvailable`] if nothing was ever submitted
    /// - [`RegistryError::DataStale`] if the snapshot is older than 24h
    /// - [`RegistryError::ScoreOutOfBounds`] if the calculator misbehaves
    pub fn compute_score(
        &mut self,
        ctx: &CallContext,
        subject: Address,
    ) -> Result<CreditScore, RegistryError> {
        let _guard = ExecutionLock::enter(&self.lock)?;
        self.access.require_authorized(&ctx.caller)?;
        self.pause.require_not_paused()?;

        let mut record = self.store.load(&subject);
        let snapshot = record
            .snapshot
            .ok_or(RegistryError::NoDataAvailable(subject))?;
        let age = ctx.timestamp.saturating_sub(snapshot.timestamp);
        if age > FRESHNESS_WINDOW_SECS {
            return Err(RegistryError::DataStale {
                age,
                max: FRESHNESS_WINDOW_SECS,
            });
        }

        let mut meter = CostMeter::new();
        let eval = self.evaluate(&snapshot, &mut meter)?;
        let mut events = Vec::with_capacity(2);
        apply_evaluation(
            &mut record,
            subject,
            &eval,
            ctx,
            self.params.history_cap,
            &mut meter,
            &mut events,
        );
        let score = record.score;
        self.store.put(subject, record);

        self.emit_all(&events, &mut meter);
        info!(
            %subject,
            total = score.total_score,
            confidence = score.confidence,
            updates = score.update_count,
            cost = meter.consumed(),
            "registry: score computed"
        );
        Ok(score)
    }

    /// Score `metrics` without touching state. Bounds are not checked and
    /// confidence is always 75.
    pub fn preview_score(&self, metrics: &BehavioralMetrics) -> ScorePreview {
        self.calculator.preview(metrics)
    }

    // --- mutating: owner only ---

    /// Let `provider` submit metrics and compute scores. Re-authorizing is a
    /// no-op and emits nothing.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ReentrantCall`] if another call is in progress
    /// - [`RegistryError::Unauthorized`] if the caller is not the owner
    /// - [`RegistryError::OperationPaused`] while paused
    /// - [`RegistryError::InvalidInput`] if `provider` is null
    pub fn authorize_provider(
        &mut self,
        ctx: &CallContext,
        provider: Address,
    ) -> Result<(), RegistryError> {
        let _guard = self.enter_owner(ctx)?;
        if self.access.authorize(provider)? {
            info!(%provider, "registry: provider authorized");
            self.emit_all(
                &[RegistryEvent::ProviderAuthorized { provider }],
                &mut CostMeter::new(),
            );
        }
        Ok(())
    }

    /// Withdraw `provider`. Revoking an unknown provider is a no-op.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ReentrantCall`] if another call is in progress
    /// - [`RegistryError::Unauthorized`] if the caller is not the owner
    /// - [`RegistryError::OperationPaused`] while paused
    /// - [`RegistryError::InvalidInput`] if `provider` is the owner
    pub fn revoke_provider(
        &mut self,
        ctx: &CallContext,
        provider: Address,
    ) -> Result<(), RegistryError> {
        let _guard = self.enter_owner(ctx)?;
        if self.access.revoke(&provider)? {
            info!(%provider, "registry: provider revoked");
            self.emit_all(
                &[RegistryEvent::ProviderRevoked { provider }],
                &mut CostMeter::new(),
            );
        }
        Ok(())
    }

    /// Set the cooldown between submissions, in seconds (10 min to 7 days).
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ReentrantCall`] if another call is in progress
    /// - [`RegistryError::Unauthorized`] if the caller is not the owner
    /// - [`RegistryError::OperationPaused`] while paused
    /// - [`RegistryError::ParameterOutOfBounds`] outside the allowed range
    pub fn set_minimum_interval(
        &mut self,
        ctx: &CallContext,
        secs: u64,
    ) -> Result<(), RegistryError> {
        let _guard = self.enter_owner(ctx)?;
        check_minimum_interval(secs)?;
        let old = self.params.minimum_update_interval;
        self.params.minimum_update_interval = secs;
        info!(old, new = secs, "registry: minimum update interval changed");
        self.emit_all(
            &[RegistryEvent::ParameterChanged {
                parameter: Parameter::MinimumUpdateInterval,
                old,
                new: secs,
            }],
            &mut CostMeter::new(),
        );
        Ok(())
    }

    /// Set the per-subject history cap (10 to 1000). Lowering the cap
    /// evicts the oldest entries of every longer history immediately.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ReentrantCall`] if another call is in progress
    /// - [`RegistryError::Unauthorized`] if the caller is not the owner
    /// - [`RegistryError::OperationPaused`] while paused
    /// - [`RegistryError::ParameterOutOfBounds`] outside the allowed range
    pub fn set_history_cap(&mut self, ctx: &CallContext, cap: usize) -> Result<(), RegistryError> {
        let _guard = self.enter_owner(ctx)?;
        check_history_cap(cap)?;
        let old = self.params.history_cap;
        self.params.history_cap = cap;
        if cap < old {
            self.store.for_each_mut(|r| r.history.truncate_to(cap));
        }
        info!(old, new = cap, "registry: history cap changed");
        self.emit_all(
            &[RegistryEvent::ParameterChanged {
                parameter: Parameter::HistoryCap,
                old: old as u64,
                new: cap as u64,
            }],
            &mut CostMeter::new(),
        );
        Ok(())
    }

    /// Reject every provider and parameter call until [`Registry::unpause`].
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ReentrantCall`] if another call is in progress
    /// - [`RegistryError::Unauthorized`] if the caller is not the owner
    /// - [`RegistryError::OperationPaused`] if already paused
    pub fn pause(&mut self, ctx: &CallContext) -> Result<(), RegistryError> {
        let _guard = ExecutionLock::enter(&self.lock)?;
        self.access.require_owner(&ctx.caller)?;
        self.pause.pause()?;
        warn!(by = %ctx.caller, "registry: paused");
        self.emit_all(&[RegistryEvent::Paused { by: ctx.caller }], &mut CostMeter::new());
        Ok(())
    }

    /// The only mutating entry point available while paused.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ReentrantCall`] if another call is in progress
    /// - [`RegistryError::Unauthorized`] if the caller is not the owner
    /// - [`RegistryError::InvalidInput`] if not paused
    pub fn unpause(&mut self, ctx: &CallContext) -> Result<(), RegistryError> {
        let _guard = ExecutionLock::enter(&self.lock)?;
        self.access.require_owner(&ctx.caller)?;
        self.pause.unpause()?;
        info!(by = %ctx.caller, "registry: unpaused");
        self.emit_all(&[RegistryEvent::Unpaused { by: ctx.caller }], &mut CostMeter::new());
        Ok(())
    }

    /// Hand ownership to `new_owner`. The previous owner remains a provider.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ReentrantCall`] if another call is in progress
    /// - [`RegistryError::Unauthorized`] if the caller is not the owner
    /// - [`RegistryError::OperationPaused`] while paused
    /// - [`RegistryError::InvalidInput`] if `new_owner` is null
    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
    ) -> Result<(), RegistryError> {
        let _guard = self.enter_owner(ctx)?;
        let previous = self.access.transfer(new_owner)?;
        warn!(%previous, new = %new_owner, "registry: ownership transferred");
        self.emit_all(
            &[RegistryEvent::OwnershipTransferred {
                previous,
                new: new_owner,
            }],
            &mut CostMeter::new(),
        );
        Ok(())
    }

    // --- views ---

    /// Current score; an inactive default if never computed.
    pub fn get_score(&self, subject: &Address) -> CreditScore {
        self.store
            .get(subject)
            .map(|r| r.score)
            .unwrap_or_default()
    }

    /// Retained totals, oldest first.
    pub fn get_history(&self, subject: &Address) -> Vec<u64> {
        self.store
            .get(subject)
            .map(|r| r.history.to_vec())
            .unwrap_or_default()
    }

    /// Latest accepted snapshot, if any.
    pub fn get_snapshot(&self, subject: &Address) -> Option<ProcessedData> {
        self.store.get(subject).and_then(|r| r.snapshot)
    }

    /// Audit record of the latest computation, if any.
    pub fn get_update_metadata(&self, subject: &Address) -> Option<UpdateMetadata> {
        self.store.get(subject).and_then(|r| r.metadata)
    }

    /// Version stamped on every score and state export.
    pub fn protocol_version(&self) -> u64 {
        PROTOCOL_VERSION
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    /// Whether `who` may submit and compute. Always true for the owner.
    pub fn is_authorized(&self, who: &Address) -> bool {
        self.access.is_authorized(who)
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn parameters(&self) -> RegistryParameters {
        self.params
    }

    /// Freshness policy applied by batch computation.
    pub fn batch_freshness(&self) -> BatchFreshness {
        self.batch_freshness
    }

    /// Seconds until `subject` may submit again; 0 if it may submit now.
    pub fn cooldown_remaining(&self, subject: &Address, now: u64) -> u64 {
        self.store
            .get(subject)
            .and_then(SubjectRecord::last_submission)
            .map(|last| {
                last.saturating_add(self.params.minimum_update_interval)
                    .saturating_sub(now)
            })
            .unwrap_or(0)
    }

    /// Whether a submission at `now` would clear the cooldown check.
    pub fn can_submit(&self, subject: &Address, now: u64) -> bool {
        self.cooldown_remaining(subject, now) == 0
    }

    /// Number of subjects with any stored state.
    pub fn subject_count(&self) -> usize {
        self.store.len()
    }

    /// Subjects with an active score, in address order.
    pub fn scored_subjects(&self) -> Vec<Address> {
        self.store.scored()
    }

    // --- internals ---

    fn enter_owner(
        &self,
        ctx: &CallContext,
    ) -> Result<ExecutionGuard, RegistryError> {
        let guard = ExecutionLock::enter(&self.lock)?;
        self.access.require_owner(&ctx.caller)?;
        self.pause.require_not_paused()?;
        Ok(guard)
    }

    /// Run the scoring pipeline and re-check every bound.
    pub(crate) fn evaluate(
        &self,
        snapshot: &ProcessedData,
        meter: &mut CostMeter,
    ) -> Result<Evaluation, RegistryError> {
        let components = self.calculator.component_scores(&snapshot.metrics);
        meter.charge(COST_COMPONENT * 5);
        for (component, value) in components.named() {
            if !is_valid_component_score(value) {
                return Err(RegistryError::ScoreOutOfBounds {
                    component,
                    value,
                    min: 0,
                    max: COMPONENT_MAX,
                });
            }
        }

        let total = self
            .calculator
            .normalize(self.calculator.raw_total(&components));
        meter.charge(COST_AGGREGATE);
        if !is_valid_final_score(total) {
            return Err(RegistryError::ScoreOutOfBounds {
                component: "total",
                value: total,
                min: MIN_SCORE,
                max: MAX_SCORE,
            });
        }

        let confidence = self
            .calculator
            .confidence(&snapshot.metrics, snapshot.data_quality_score)
            .min(MAX_CONFIDENCE);
        meter.charge(COST_CONFIDENCE);

        Ok(Evaluation {
            components,
            total,
            confidence,
            content_hash: snapshot.metrics.content_hash(),
        })
    }

    pub(crate) fn emit_all(&self, events: &[RegistryEvent], meter: &mut CostMeter) {
        for event in events {
            meter.charge(COST_EVENT);
            self.sink.emit(event);
        }
    }
}

/// Write an evaluation into `record` and queue the resulting events.
pub(crate) fn apply_evaluation(
    record: &mut SubjectRecord,
    subject: Address,
    eval: &Evaluation,
    ctx: &CallContext,
    history_cap: usize,
    meter: &mut CostMeter,
    events: &mut Vec<RegistryEvent>,
) {
    let previous = record.score;
    let previous_total = if previous.is_active {
        previous.total_score
    } else {
        0
    };

    record.score = CreditScore {
        total_score: eval.total,
        components: eval.components,
        last_updated: ctx.timestamp,
        confidence: eval.confidence,
        update_count: previous.update_count.saturating_add(1),
        is_active: true,
    };
    record.history.push(eval.total, history_cap);
    meter.charge(COST_HISTORY_PUSH);
    meter.charge(COST_STORE_WRITE);
    record.metadata = Some(UpdateMetadata {
        sequence_number: ctx.sequence,
        cost_snapshot: meter.consumed(),
        content_hash: eval.content_hash,
        previous_score: previous_total,
    });

    events.push(RegistryEvent::ScoreComputed {
        subject,
        total: eval.total,
        components: eval.components,
        confidence: eval.confidence,
        timestamp: ctx.timestamp,
    });
    if previous.is_active {
        events.push(RegistryEvent::HistoryChanged {
            subject,
            new_total: eval.total,
            previous_total,
            percent_delta: percent_delta(eval.total, previous_total),
        });
    }
}
