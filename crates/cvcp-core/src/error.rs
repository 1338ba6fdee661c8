//! Error types for the CVCP protocol.
use thiserror::Error;

use crate::types::{Address, Parameter};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("missing 0x prefix")] MissingPrefix,
    #[error("invalid length: {0} hex digits, expected 40")] InvalidLength(usize),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("null subject identifier")] NullSubject,
    #[error("{field} = {value} exceeds maximum {max}")] FieldOutOfBounds { field: &'static str, value: u64, max: u64 },
    #[error("data quality {score} below minimum {min}")] InsufficientDataQuality { score: u64, min: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unauthorized caller: {0}")] Unauthorized(Address),
    #[error("invalid input: {0}")] InvalidInput(String),
    #[error("insufficient data quality: {score} < {min}")] InsufficientDataQuality { score: u64, min: u64 },
    #[error("update too frequent: {remaining}s of cooldown remaining")] UpdateTooFrequent { remaining: u64 },
    #[error("no data available for {0}")] NoDataAvailable(Address),
    #[error("data stale: snapshot age {age}s exceeds {max}s")] DataStale { age: u64, max: u64 },
    #[error("batch too large: {len} > {max}")] BatchTooLarge { len: usize, max: usize },
    #[error("{parameter} out of bounds: {value} not in [{min}, {max}]")] ParameterOutOfBounds { parameter: Parameter, value: u64, min: u64, max: u64 },
    #[error("operation paused")] OperationPaused,
    #[error("reentrant call rejected")] ReentrantCall,
    #[error("{component} score {value} outside [{min}, {max}]")] ScoreOutOfBounds { component: &'static str, value: u64, min: u64, max: u64 },
}

impl From<ValidationError> for RegistryError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::InsufficientDataQuality { score, min } => {
                Self::InsufficientDataQuality { score, min }
            }
            other => Self::InvalidInput(other.to_string()),
        }
    }
}
