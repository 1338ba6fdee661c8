//! Integration test suite for CVCP.
//!
//! Drives the registry end to end through its public API: submission and
//! computation lifecycles, guard bypass attempts, batch atomicity, and
//! properties over randomized metrics.

pub mod helpers;
