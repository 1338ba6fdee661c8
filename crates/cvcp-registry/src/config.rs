//! Registry configuration and the owner-adjustable parameters.

use cvcp_core::constants::{
    DEFAULT_HISTORY_CAP, DEFAULT_MIN_UPDATE_INTERVAL_SECS, MAX_HISTORY_CAP, MIN_HISTORY_CAP,
    MIN_UPDATE_INTERVAL_CEIL_SECS, MIN_UPDATE_INTERVAL_FLOOR_SECS,
};
use cvcp_core::error::RegistryError;
use cvcp_core::types::Parameter;
use serde::{Deserialize, Serialize};

/// Whether batch computation re-checks snapshot freshness.
///
/// The single-subject path always rejects stale snapshots. The batch path
/// historically does not; `Enforce` makes it skip stale subjects instead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, bincode::Encode,
    bincode::Decode,
)]
#[serde(rename_all = "snake_case")]
pub enum BatchFreshness {
    /// Compute every eligible subject regardless of snapshot age.
    #[default]
    TrustCaller,
    /// Skip subjects whose snapshot is older than the freshness window.
    Enforce,
}

/// Live parameters the owner may adjust at runtime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct RegistryParameters {
    /// Seconds required between accepted submissions for one subject.
    pub minimum_update_interval: u64,
    /// Maximum retained history entries per subject.
    pub history_cap: usize,
}

impl Default for RegistryParameters {
    fn default() -> Self {
        Self {
            minimum_update_interval: DEFAULT_MIN_UPDATE_INTERVAL_SECS,
            history_cap: DEFAULT_HISTORY_CAP,
        }
    }
}

/// Construction-time configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Initial minimum update interval in seconds (10 min to 7 days).
    pub minimum_update_interval: u64,
    /// Initial history cap (10 to 1000).
    pub history_cap: usize,
    /// Freshness handling on the batch path.
    pub batch_freshness: BatchFreshness,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let params = RegistryParameters::default();
        Self {
            minimum_update_interval: params.minimum_update_interval,
            history_cap: params.history_cap,
            batch_freshness: BatchFreshness::default(),
        }
    }
}

impl RegistryConfig {
    /// Check every value against its admissible range.
    ///
    /// # Errors
    ///
    /// [`RegistryError::ParameterOutOfBounds`] naming the first offending value.
    pub fn validate(&self) -> Result<(), RegistryError> {
        check_minimum_interval(self.minimum_update_interval)?;
        check_history_cap(self.history_cap)
    }

    /// The initial live parameters.
    pub fn parameters(&self) -> RegistryParameters {
        RegistryParameters {
            minimum_update_interval: self.minimum_update_interval,
            history_cap: self.history_cap,
        }
    }
}

/// Minimum update interval must lie in `[10 min, 7 days]`.
pub fn check_minimum_interval(secs: u64) -> Result<(), RegistryError> {
    if !(MIN_UPDATE_INTERVAL_FLOOR_SECS..=MIN_UPDATE_INTERVAL_CEIL_SECS).contains(&secs) {
        return Err(RegistryError::ParameterOutOfBounds {
            parameter: Parameter::MinimumUpdateInterval,
            value: secs,
            min: MIN_UPDATE_INTERVAL_FLOOR_SECS,
            max: MIN_UPDATE_INTERVAL_CEIL_SECS,
        });
    }
    Ok(())
}

/// History cap must lie in `[10, 1000]`.
pub fn check_history_cap(cap: usize) -> Result<(), RegistryError> {
    if !(MIN_HISTORY_CAP..=MAX_HISTORY_CAP).contains(&cap) {
        return Err(RegistryError::ParameterOutOfBounds {
            parameter: Parameter::HistoryCap,
            value: cap as u64,
            min: MIN_HISTORY_CAP as u64,
            max: MAX_HISTORY_CAP as u64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = RegistryConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.minimum_update_interval, 3600);
        assert_eq!(cfg.history_cap, 100);
        assert_eq!(cfg.batch_freshness, BatchFreshness::TrustCaller);
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        assert!(check_minimum_interval(600).is_ok());
        assert!(check_minimum_interval(604_800).is_ok());
        assert!(check_minimum_interval(599).is_err());
        assert!(check_minimum_interval(604_801).is_err());
    }

    #[test]
    fn history_cap_bounds_are_inclusive() {
        assert!(check_history_cap(10).is_ok());
        assert!(check_history_cap(1000).is_ok());
        assert_eq!(
            check_history_cap(9),
            Err(RegistryError::ParameterOutOfBounds {
                parameter: Parameter::HistoryCap,
                value: 9,
                min: 10,
                max: 1000,
            })
        );
        assert!(check_history_cap(1001).is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: RegistryConfig =
            serde_json::from_str(r#"{"history_cap": 20, "batch_freshness": "enforce"}"#).unwrap();
        assert_eq!(cfg.history_cap, 20);
        assert_eq!(cfg.minimum_update_interval, 3600);
        assert_eq!(cfg.batch_freshness, BatchFreshness::Enforce);
    }

    #[test]
    fn parameters_mirror_config() {
        let cfg = RegistryConfig {
            minimum_update_interval: 900,
            history_cap: 12,
            ..RegistryConfig::default()
        };
        assert_eq!(
            cfg.parameters(),
            RegistryParameters {
                minimum_update_interval: 900,
                history_cap: 12,
            }
        );
    }
}
