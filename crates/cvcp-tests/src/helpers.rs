//! Shared fixtures for the integration tests.

use std::sync::Arc;

use cvcp_core::types::{Address, BehavioralMetrics, CallContext};
use cvcp_registry::{MemoryEventLog, Registry, RegistryConfig};

/// Fixed starting clock, in Unix seconds.
pub const T0: u64 = 1_700_000_000;

pub const HOUR: u64 = 3_600;
pub const DAY: u64 = 86_400;

/// Address with every byte set to `seed`.
pub fn addr(seed: u8) -> Address {
    Address([seed; 20])
}

/// The deploying owner used throughout.
pub fn owner() -> Address {
    addr(1)
}

/// Call context for `caller` at `timestamp`. Sequence advances every 12s.
pub fn ctx(caller: Address, timestamp: u64) -> CallContext {
    CallContext::new(caller, timestamp, timestamp.saturating_sub(T0) / 12 + 1)
}

/// The worked example: every domain populated, quality 100.
pub fn reference_metrics() -> BehavioralMetrics {
    BehavioralMetrics {
        transaction_frequency: 25,
        average_transaction_value: 500,
        gas_efficiency_score: 75,
        cross_chain_activity_count: 3,
        consistency_metric: 80,
        protocol_interaction_count: 5,
        total_defi_balance_usd: 10_000,
        liquidity_position_count: 2,
        protocol_diversity_score: 60,
        total_staked_usd: 5_000,
        staking_duration_days: 180,
        staking_platform_count: 2,
        reward_claim_frequency: 8,
        liquidation_event_count: 0,
        leverage_ratio: 100,
        portfolio_volatility: 25,
        staking_loyalty_score: 65,
        interaction_depth_score: 70,
        yield_farming_active: 1,
        account_age_score: 75,
        activity_consistency_score: 80,
        engagement_score: 85,
    }
}

/// Registry with default config and an attached in-memory event log.
pub fn registry() -> (Registry, Arc<MemoryEventLog>) {
    registry_with(RegistryConfig::default())
}

pub fn registry_with(config: RegistryConfig) -> (Registry, Arc<MemoryEventLog>) {
    let log = Arc::new(MemoryEventLog::new());
    let reg = Registry::new(owner(), config)
        .expect("valid config")
        .with_sink(log.clone());
    (reg, log)
}
