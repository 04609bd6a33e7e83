//! Integration Tests - Registry, Settlement and Persistence Together
//!
//! Exercises the market manager end to end, the snapshot service
//! against a mockall repository, and the file-backed repository on
//! a scratch directory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use mockall::mock;
use tokio::sync::broadcast;

use samsa_lmsr::adapters::metrics::EngineMetrics;
use samsa_lmsr::adapters::persistence::RepositoryImpl;
use samsa_lmsr::domain::{EngineError, Market, MarketState, Outcome, Side};
use samsa_lmsr::ports::repository::{MarketRepository, MarketsSnapshot, TradeRecord};
use samsa_lmsr::usecases::{MarketManager, SnapshotService};

// ---- Mock Definitions ----

mock! {
    pub MarketRepo {}

    #[async_trait::async_trait]
    impl MarketRepository for MarketRepo {
        async fn save_states(&self, snapshot: &MarketsSnapshot) -> anyhow::Result<()>;
        async fn load_states(&self) -> anyhow::Result<Option<MarketsSnapshot>>;
        async fn append_trade(&self, record: &TradeRecord) -> anyhow::Result<()>;
        async fn load_trades(&self) -> anyhow::Result<Vec<TradeRecord>>;
        async fn is_healthy(&self) -> bool;
    }
}

fn scratch_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("samsa-lmsr-test-{}", uuid::Uuid::new_v4()))
}

fn seeded_manager() -> Arc<MarketManager> {
    let manager = Arc::new(MarketManager::default());
    manager.get_or_create("election", 100.0, 0.5).unwrap();
    manager.get_or_create("weather", 40.0, 0.7).unwrap();
    manager.invest("election", Side::Yes, 50.0).unwrap();
    manager.invest("weather", Side::No, 15.0).unwrap();
    manager
}

// ---- Registry Scenarios ----

#[test]
fn test_trade_then_resolve_flow() {
    let manager = MarketManager::default();
    manager.get_or_create("final", 100.0, 0.4).unwrap();

    let yes = manager.invest("final", Side::Yes, 100.0).unwrap();
    let no = manager.invest("final", Side::No, 100.0).unwrap();

    // Market resolves YES: the YES trade wins, the NO trade loses.
    // Settlement uses the probability recorded for each side at trade time.
    let win = manager.settle(yes.stake, yes.old_probability, true).unwrap();
    let loss = manager
        .settle(no.stake, 1.0 - no.old_probability, false)
        .unwrap();

    assert_eq!(win.outcome(), Outcome::Win);
    assert!((win.user_net() - 59.4).abs() < 1e-9);
    assert_eq!(loss.outcome(), Outcome::Lose);
    assert!(loss.total_return() > 0.0);
    assert!(loss.total_return() < no.stake);
}

#[test]
fn test_observer_sees_trades_rejections_and_settlements() {
    let metrics = Arc::new(EngineMetrics::new().unwrap());
    let manager = MarketManager::default().with_observer(metrics.clone());

    manager.get_or_create("m", 100.0, 0.5).unwrap();
    manager.invest("m", Side::Yes, 10.0).unwrap();
    manager.invest("m", Side::No, 10.0).unwrap();
    assert!(manager.invest("missing", Side::No, 10.0).is_err());
    manager.settle(10.0, 0.5, true).unwrap();

    assert_eq!(metrics.markets.get(), 1);
    assert_eq!(metrics.trades.with_label_values(&["yes"]).get(), 1);
    assert_eq!(metrics.trades.with_label_values(&["no"]).get(), 1);
    assert_eq!(
        metrics
            .rejections
            .with_label_values(&["market_not_found"])
            .get(),
        1
    );
    assert_eq!(metrics.settlements.with_label_values(&["win"]).get(), 1);
}

#[test]
fn test_concurrent_trades_on_one_market_are_serialized() {
    let manager = Arc::new(MarketManager::default());
    manager.get_or_create("hot", 500.0, 0.5).unwrap();

    let threads = 8;
    let trades_per_thread = 250;

    let total_delta_q: f64 = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let manager = Arc::clone(&manager);
                scope.spawn(move || {
                    (0..trades_per_thread)
                        .map(|_| manager.invest("hot", Side::Yes, 1.0).unwrap().delta_q)
                        .sum::<f64>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    let handle = manager.get_market("hot").unwrap();
    let market = handle.lock();
    // No lost updates: every applied delta landed in the pressure.
    assert!((market.yes_pressure() - total_delta_q).abs() < 1e-6);
    assert_eq!(market.no_pressure(), 0.0);
    assert!(market.verify_inverse_relationship().is_valid);
}

#[test]
fn test_concurrent_get_or_create_registers_once() {
    let manager = Arc::new(MarketManager::default());

    std::thread::scope(|scope| {
        for i in 0..8 {
            let manager = Arc::clone(&manager);
            scope.spawn(move || {
                let p = 0.1 + f64::from(i) * 0.1;
                manager.get_or_create("race", 100.0, p).unwrap();
            });
        }
    });

    assert_eq!(manager.len(), 1);
    let handle = manager.get_market("race").unwrap();
    let p = handle.lock().probability();
    assert!(p > 0.09 && p < 0.81);
}

#[test]
fn test_runaway_one_sided_trading_stays_finite() {
    // A tiny market rejects trades that would saturate the price.
    let mut thin = Market::new(1.0, 0.5).unwrap();
    let mut rejected = 0;
    for _ in 0..10_000 {
        match thin.apply_trade(Side::Yes, 1000.0) {
            Ok(_) => {}
            Err(EngineError::PressureLimit { .. }) => rejected += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(rejected, 10_000);
    assert_eq!(thin.probability(), 0.5);

    // A deep market absorbs them with shrinking pressure increments.
    let mut deep = Market::new(100.0, 0.5).unwrap();
    for _ in 0..10_000 {
        let outcome = deep.apply_trade(Side::Yes, 1000.0).unwrap();
        assert!(outcome.new_probability <= 0.99);
    }
    let p = deep.probability();
    assert!(p.is_finite() && p > 0.99 && p < 1.0);
    assert!(deep.verify_inverse_relationship().is_valid);
}

// ---- Snapshot Service (mock repository) ----

#[tokio::test]
async fn test_snapshot_saves_all_markets() {
    let manager = seeded_manager();
    let expected = manager.get_all_states();

    let mut repo = MockMarketRepo::new();
    repo.expect_save_states()
        .withf(move |snapshot| {
            snapshot.markets == expected && snapshot.version == MarketsSnapshot::VERSION
        })
        .times(1)
        .returning(|_| Ok(()));

    let service = SnapshotService::new(manager, Arc::new(repo), Duration::from_secs(60));
    assert_eq!(service.snapshot().await.unwrap(), 2);
}

#[tokio::test]
async fn test_restore_from_snapshot() {
    let source = seeded_manager();
    let snapshot = MarketsSnapshot::new(source.get_all_states());

    let mut repo = MockMarketRepo::new();
    repo.expect_load_states()
        .times(1)
        .returning(move || Ok(Some(snapshot.clone())));

    let target = Arc::new(MarketManager::default());
    let service = SnapshotService::new(Arc::clone(&target), Arc::new(repo), Duration::from_secs(60));

    assert_eq!(service.restore().await.unwrap(), 2);
    assert_eq!(
        target.probability("election").unwrap(),
        source.probability("election").unwrap()
    );
    assert_eq!(target.get_all_states(), source.get_all_states());
}

#[tokio::test]
async fn test_restore_without_snapshot_is_empty() {
    let mut repo = MockMarketRepo::new();
    repo.expect_load_states().returning(|| Ok(None));

    let manager = Arc::new(MarketManager::default());
    let service = SnapshotService::new(Arc::clone(&manager), Arc::new(repo), Duration::from_secs(60));

    assert_eq!(service.restore().await.unwrap(), 0);
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_restore_rejects_corrupt_state() {
    let mut markets = HashMap::new();
    markets.insert(
        "broken".to_string(),
        MarketState {
            yes_pressure: 0.0,
            no_pressure: 0.0,
            liquidity: -5.0,
        },
    );
    let snapshot = MarketsSnapshot::new(markets);

    let mut repo = MockMarketRepo::new();
    repo.expect_load_states()
        .returning(move || Ok(Some(snapshot.clone())));

    let manager = Arc::new(MarketManager::default());
    let service = SnapshotService::new(Arc::clone(&manager), Arc::new(repo), Duration::from_secs(60));

    assert!(service.restore().await.is_err());
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_run_takes_final_snapshot_on_shutdown() {
    let mut repo = MockMarketRepo::new();
    repo.expect_save_states().times(1).returning(|_| Ok(()));

    let service = SnapshotService::new(seeded_manager(), Arc::new(repo), Duration::from_secs(3600));
    let (tx, rx) = broadcast::channel(1);
    tx.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(5), service.run(rx))
        .await
        .expect("run should stop on shutdown")
        .unwrap();
}

#[tokio::test]
async fn test_record_investment_appends_trade() {
    let manager = seeded_manager();
    let investment = manager.invest("weather", Side::Yes, 20.0).unwrap();

    let mut repo = MockMarketRepo::new();
    repo.expect_append_trade()
        .withf(|record| record.market_id == "weather" && record.side == Side::Yes)
        .times(1)
        .returning(|_| Ok(()));

    let service = SnapshotService::new(manager, Arc::new(repo), Duration::from_secs(60));
    service.record_investment(&investment).await.unwrap();
}

// ---- File-backed Repository ----

#[tokio::test]
async fn test_file_repository_round_trips_exact_pressures() {
    let dir = scratch_dir();
    let repo = RepositoryImpl::from_data_dir(&dir).await.unwrap();
    assert!(repo.load_states().await.unwrap().is_none());
    assert!(repo.is_healthy().await);

    let source = seeded_manager();
    for _ in 0..5 {
        source.invest("election", Side::No, 7.77).unwrap();
    }
    repo.save_states(&MarketsSnapshot::new(source.get_all_states()))
        .await
        .unwrap();

    let loaded = repo.load_states().await.unwrap().unwrap();
    let target = MarketManager::default();
    target.restore_states(loaded.markets).unwrap();

    assert_eq!(target.get_all_states(), source.get_all_states());
    assert_eq!(
        target.probability("election").unwrap(),
        source.probability("election").unwrap()
    );

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[test]
fn test_file_repository_trade_log() {
    tokio_test::block_on(async {
        let dir = scratch_dir();
        let repo = RepositoryImpl::from_data_dir(&dir).await.unwrap();

        let manager = seeded_manager();
        let first = manager.invest("election", Side::Yes, 5.0).unwrap().to_record();
        let mut second = manager.invest("weather", Side::No, 5.0).unwrap().to_record();
        second.timestamp_ms = first.timestamp_ms + 1;

        tokio_test::assert_ok!(repo.append_trade(&first).await);
        tokio_test::assert_ok!(repo.append_trade(&second).await);

        let trades = repo.load_trades().await.unwrap();
        assert_eq!(trades, vec![first, second]);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    });
}
