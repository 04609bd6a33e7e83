//! LMSR Engine Benchmarks — Hot-Path Performance
//!
//! Benchmarks the functions that run on every trade request.
//!
//! Run with: cargo bench --bench lmsr_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use samsa_lmsr::domain::settlement::{settle_trade, trade_breakdown};
use samsa_lmsr::domain::{Market, Side};
use samsa_lmsr::usecases::MarketManager;

/// Probability derivation from pressures.
fn bench_probability(c: &mut Criterion) {
    let market = Market::new(100.0, 0.63).unwrap();

    c.bench_function("lmsr_probability", |b| {
        b.iter(|| black_box(&market).probability());
    });
}

/// Alternating YES/NO trades keep the market near the centre.
fn bench_apply_trade(c: &mut Criterion) {
    let mut market = Market::new(100.0, 0.5).unwrap();
    let mut side = Side::Yes;

    c.bench_function("lmsr_apply_trade", |b| {
        b.iter(|| {
            let _ = market.apply_trade(black_box(side), black_box(10.0));
            side = if side == Side::Yes { Side::No } else { Side::Yes };
        });
    });
}

/// Win settlement.
fn bench_settle(c: &mut Criterion) {
    c.bench_function("settle_trade_win", |b| {
        b.iter(|| settle_trade(black_box(100.0), black_box(0.4), black_box(true), 0.01));
    });
}

/// Full breakdown including odds formatting.
fn bench_breakdown(c: &mut Criterion) {
    c.bench_function("trade_breakdown", |b| {
        b.iter(|| trade_breakdown(black_box(100.0), black_box(40.0), 0.01));
    });
}

/// Registry lookup + lock + trade + breakdown.
fn bench_manager_invest(c: &mut Criterion) {
    let manager = MarketManager::default();
    let _ = manager.get_or_create("bench", 1000.0, 0.5);
    let mut side = Side::Yes;

    c.bench_function("manager_invest", |b| {
        b.iter(|| {
            let _ = manager.invest(black_box("bench"), side, black_box(5.0));
            side = if side == Side::Yes { Side::No } else { Side::Yes };
        });
    });
}

criterion_group!(
    benches,
    bench_probability,
    bench_apply_trade,
    bench_settle,
    bench_breakdown,
    bench_manager_invest,
);
criterion_main!(benches);
