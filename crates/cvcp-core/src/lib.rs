//! # cvcp-core
//! Foundation types, constants, and validation for the CVCP credit-scoring ledger.

pub mod constants;
pub mod error;
pub mod events;
pub mod traits;
pub mod types;
pub mod validation;
