//! Criterion benchmarks for the scoring pipeline.
//!
//! Covers: the halving-loop logarithm, each component scorer, and the full
//! score computation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cvcp_core::traits::ScoreCalculator;
use cvcp_core::types::BehavioralMetrics;
use cvcp_scoring::components;
use cvcp_scoring::engine::ScoringEngine;
use cvcp_scoring::scaling::log_scale;

fn sample_metrics() -> BehavioralMetrics {
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

fn bench_log_scale(c: &mut Criterion) {
    // Worst case: u64::MAX needs 64 halvings.
    c.bench_function("log_scale_max", |b| {
        b.iter(|| log_scale(black_box(u64::MAX), black_box(1000)))
    });
}

fn bench_components(c: &mut Criterion) {
    let m = sample_metrics();
    c.bench_function("transaction_score", |b| {
        b.iter(|| components::transaction_score(black_box(&m)))
    });
    c.bench_function("staking_score", |b| {
        b.iter(|| components::staking_score(black_box(&m)))
    });
    c.bench_function("component_scores", |b| {
        b.iter(|| components::component_scores(black_box(&m)))
    });
}

fn bench_full_score(c: &mut Criterion) {
    let engine = ScoringEngine::new();
    let m = sample_metrics();
    c.bench_function("full_score", |b| {
        b.iter(|| {
            let (components, total) = engine.score(black_box(&m));
            let confidence = engine.confidence(black_box(&m), 100);
            (components, total, confidence)
        })
    });
}

criterion_group!(benches, bench_log_scale, bench_components, bench_full_score);
criterion_main!(benches);
