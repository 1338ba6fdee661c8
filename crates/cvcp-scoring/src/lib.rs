//! # cvcp-scoring: deterministic credit-scoring engine.
//!
//! All calculations use unsigned integer arithmetic with truncating division
//! for bit-exact reproducibility.
//!
//! - **Scaling primitives**: a coarse halving-loop logarithm, linear and
//!   range normalization, a bell curve around an optimal frequency, and a
//!   saturating time curve.
//! - **Component scorers**: transaction, DeFi, staking, risk, and history,
//!   each bounded by `COMPONENT_MAX`.
//! - **Engine**: weighted aggregation, normalization onto the public
//!   300–850 range, and confidence estimation.

pub mod components;
pub mod engine;
pub mod scaling;

pub use engine::ScoringEngine;
