//! Binary export and import of the full registry state.
//!
//! The encoding is bincode's standard configuration over [`RegistryState`].
//! Imports are checked as strictly as live calls: parameters, score and
//! history bounds, and every stored snapshot are re-validated, so a blob
//! that could not have been produced by a valid registry is rejected.

use std::collections::{BTreeMap, BTreeSet};

use cvcp_core::constants::{
    COMPONENT_MAX, MAX_CONFIDENCE, MAX_SCORE, MIN_DATA_QUALITY, MIN_SCORE, PROTOCOL_VERSION,
};
use cvcp_core::error::RegistryError;
use cvcp_core::traits::ScoreCalculator;
use cvcp_core::types::Address;
use cvcp_core::validation::{
    check_metric_bounds, data_quality_score, is_valid_component_score, is_valid_final_score,
};
use cvcp_scoring::ScoringEngine;
use thiserror::Error;
use tracing::info;

use crate::access::{AccessControl, PauseGuard};
use crate::config::{BatchFreshness, RegistryParameters, check_history_cap, check_minimum_interval};
use crate::registry::Registry;
use crate::store::{SubjectRecord, SubjectStore};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("state encoding failed: {0}")]
    Encode(String),
    #[error("state decoding failed: {0}")]
    Decode(String),
    #[error("state version {found} not supported (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u64 },
    #[error("{0} trailing bytes after state")]
    TrailingBytes(usize),
    #[error("invalid state: {0}")]
    Invalid(#[from] RegistryError),
}

/// Everything needed to rebuild a registry.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct RegistryState {
    pub version: u64,
    pub owner: Address,
    pub providers: BTreeSet<Address>,
    pub paused: bool,
    pub params: RegistryParameters,
    pub batch_freshness: BatchFreshness,
    pub subjects: BTreeMap<Address, SubjectRecord>,
}

impl RegistryState {
    fn check(&self) -> Result<(), StateError> {
        if self.version != PROTOCOL_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: self.version,
                expected: PROTOCOL_VERSION,
            });
        }
        if self.owner.is_zero() {
            return Err(RegistryError::InvalidInput("owner must not be null".into()).into());
        }
        check_minimum_interval(self.params.minimum_update_interval)?;
        check_history_cap(self.params.history_cap)?;
        for (subject, record) in &self.subjects {
            check_record(subject, record, self.params.history_cap)?;
        }
        Ok(())
    }
}

/// A record must satisfy every invariant a live registry maintains.
fn check_record(
    subject: &Address,
    record: &SubjectRecord,
    history_cap: usize,
) -> Result<(), RegistryError> {
    if record.history.len() > history_cap {
        return Err(RegistryError::InvalidInput(format!(
            "history of {subject} exceeds cap {history_cap}"
        )));
    }
    if let Some(total) = record.history.iter().find(|t| !is_valid_final_score(*t)) {
        return Err(total_out_of_bounds("history_entry", total));
    }

    let score = &record.score;
    if score.is_active {
        if !is_valid_final_score(score.total_score) {
            return Err(total_out_of_bounds("total", score.total_score));
        }
        for (component, value) in score.components.named() {
            if !is_valid_component_score(value) {
                return Err(RegistryError::ScoreOutOfBounds {
                    component,
                    value,
                    min: 0,
                    max: COMPONENT_MAX,
                });
            }
        }
        if score.confidence > MAX_CONFIDENCE {
            return Err(RegistryError::ScoreOutOfBounds {
                component: "confidence",
                value: score.confidence,
                min: 0,
                max: MAX_CONFIDENCE,
            });
        }
    }

    if let Some(snapshot) = &record.snapshot {
        check_metric_bounds(&snapshot.metrics)?;
        let quality = data_quality_score(&snapshot.metrics);
        if quality != snapshot.data_quality_score {
            return Err(RegistryError::InvalidInput(format!(
                "snapshot of {subject} records quality {} but its metrics give {quality}",
                snapshot.data_quality_score
            )));
        }
        if quality < MIN_DATA_QUALITY {
            return Err(RegistryError::InsufficientDataQuality {
                score: quality,
                min: MIN_DATA_QUALITY,
            });
        }
    }
    Ok(())
}

fn total_out_of_bounds(component: &'static str, value: u64) -> RegistryError {
    RegistryError::ScoreOutOfBounds {
        component,
        value,
        min: MIN_SCORE,
        max: MAX_SCORE,
    }
}

impl<C: ScoreCalculator> Registry<C> {
    /// Snapshot the full state.
    pub fn to_state(&self) -> RegistryState {
        RegistryState {
            version: PROTOCOL_VERSION,
            owner: self.access.owner(),
            providers: self.access.providers().clone(),
            paused: self.pause.is_paused(),
            params: self.params,
            batch_freshness: self.batch_freshness,
            subjects: self.store.records().clone(),
        }
    }

    /// Encode the full state with bincode.
    pub fn export_state(&self) -> Result<Vec<u8>, StateError> {
        bincode::encode_to_vec(self.to_state(), bincode::config::standard())
            .map_err(|e| StateError::Encode(e.to_string()))
    }

    /// Rebuild a registry from a checked [`RegistryState`].
    pub fn from_state(state: RegistryState, calculator: C) -> Result<Self, StateError> {
        state.check()?;
        info!(
            owner = %state.owner,
            subjects = state.subjects.len(),
            paused = state.paused,
            "registry: state restored"
        );
        Ok(Self::from_parts(
            AccessControl::from_parts(state.owner, state.providers),
            PauseGuard::new(state.paused),
            state.params,
            state.batch_freshness,
            SubjectStore::from_records(state.subjects),
            calculator,
        ))
    }

    /// Decode bytes produced by [`export_state`](Self::export_state).
    pub fn import_state(bytes: &[u8], calculator: C) -> Result<Self, StateError> {
        let (state, read): (RegistryState, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| StateError::Decode(e.to_string()))?;
        if read != bytes.len() {
            return Err(StateError::TrailingBytes(bytes.len() - read));
        }
        Self::from_state(state, calculator)
    }
}

impl Registry<ScoringEngine> {
    /// [`import_state`](Self::import_state) with the production engine.
    pub fn restore(bytes: &[u8]) -> Result<Self, StateError> {
        Self::import_state(bytes, ScoringEngine::new())
    }
}
