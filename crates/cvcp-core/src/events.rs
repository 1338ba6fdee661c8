//! Records emitted by the registry for external analytics and indexing.
//!
//! Events are emitted only after a call has committed; a failed call emits
//! nothing.

use serde::{Deserialize, Serialize};

use crate::types::{Address, ComponentScores, Parameter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A metrics snapshot was accepted.
    DataUpdated {
        subject: Address,
        timestamp: u64,
        quality: u64,
        provider: Address,
    },
    /// A new score was committed.
    ScoreComputed {
        subject: Address,
        total: u64,
        components: ComponentScores,
        confidence: u64,
        timestamp: u64,
    },
    /// A score replaced a previous one. `percent_delta = |new - old| * 100 / old`.
    HistoryChanged {
        subject: Address,
        new_total: u64,
        previous_total: u64,
        percent_delta: u64,
    },
    ProviderAuthorized {
        provider: Address,
    },
    ProviderRevoked {
        provider: Address,
    },
    ParameterChanged {
        parameter: Parameter,
        old: u64,
        new: u64,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },
    OwnershipTransferred {
        previous: Address,
        new: Address,
    },
}

impl RegistryEvent {
    /// Short event name, stable across versions.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DataUpdated { .. } => "data_updated",
            Self::ScoreComputed { .. } => "score_computed",
            Self::HistoryChanged { .. } => "history_changed",
            Self::ProviderAuthorized { .. } => "provider_authorized",
            Self::ProviderRevoked { .. } => "provider_revoked",
            Self::ParameterChanged { .. } => "parameter_changed",
            Self::Paused { .. } => "paused",
            Self::Unpaused { .. } => "unpaused",
            Self::OwnershipTransferred { .. } => "ownership_transferred",
        }
    }

    /// The subject this event concerns, if any.
    pub fn subject(&self) -> Option<Address> {
        match self {
            Self::DataUpdated { subject, .. }
            | Self::ScoreComputed { subject, .. }
            | Self::HistoryChanged { subject, .. } => Some(*subject),
            _ => None,
        }
    }
}

/// Percentage change between two totals: `|new - old| * 100 / old`.
///
/// Returns 0 when `old` is 0 (no previous score).
pub fn percent_delta(new: u64, old: u64) -> u64 {
    if old == 0 {
        return 0;
    }
    (new.abs_diff(old) as u128 * 100 / old as u128) as u64
}
