//! Prometheus Metrics Registry - Engine Observability
//!
//! Registers engine metrics and exposes them on `/metrics`. All
//! metrics follow the naming convention `samsa_*`. The registry
//! implements the `TradeObserver` port so the market manager can
//! report events without depending on Prometheus.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument};

use crate::domain::error::EngineError;
use crate::domain::lmsr::TradeOutcome;
use crate::domain::settlement::Settlement;
use crate::domain::trade::MarketId;
use crate::ports::observer::TradeObserver;

/// Centralized Prometheus metrics for the engine.
pub struct EngineMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Applied trades by side.
    pub trades: IntCounterVec,
    /// Rejected requests by error reason.
    pub rejections: IntCounterVec,
    /// Settlements by outcome.
    pub settlements: IntCounterVec,
    /// Registered markets.
    pub markets: IntGauge,
    /// Absolute probability move per trade.
    pub trade_delta_p: HistogramVec,
}

impl EngineMetrics {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let trades = IntCounterVec::new(
            Opts::new("samsa_trades_total", "Total trades applied"),
            &["side"],
        )?;

        let rejections = IntCounterVec::new(
            Opts::new(
                "samsa_trades_rejected_total",
                "Total trade or settlement requests rejected",
            ),
            &["reason"],
        )?;

        let settlements = IntCounterVec::new(
            Opts::new("samsa_settlements_total", "Total trades settled"),
            &["outcome"],
        )?;

        let markets = IntGauge::new("samsa_markets", "Number of registered markets")?;

        let trade_delta_p = HistogramVec::new(
            HistogramOpts::new(
                "samsa_trade_delta_p",
                "Absolute probability change caused by a trade",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5]),
            &["side"],
        )?;

        registry.register(Box::new(trades.clone()))?;
        registry.register(Box::new(rejections.clone()))?;
        registry.register(Box::new(settlements.clone()))?;
        registry.register(Box::new(markets.clone()))?;
        registry.register(Box::new(trade_delta_p.clone()))?;

        Ok(Self {
            registry,
            trades,
            rejections,
            settlements,
            markets,
            trade_delta_p,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics);
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

impl TradeObserver for EngineMetrics {
    fn on_trade(&self, _market_id: &MarketId, outcome: &TradeOutcome) {
        let side = outcome.side.as_label();
        self.trades.with_label_values(&[side]).inc();
        self.trade_delta_p
            .with_label_values(&[side])
            .observe(outcome.delta_p.abs());
    }

    fn on_rejected(&self, error: &EngineError) {
        self.rejections.with_label_values(&[error.reason()]).inc();
    }

    fn on_settlement(&self, settlement: &Settlement) {
        self.settlements
            .with_label_values(&[settlement.outcome().as_label()])
            .inc();
    }

    #[allow(clippy::cast_possible_wrap)]
    fn on_market_count(&self, count: usize) {
        self.markets.set(count as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settlement::settle_trade;
    use crate::domain::trade::Side;

    #[test]
    fn test_observer_updates_counters() {
        let metrics = EngineMetrics::new().unwrap();
        let outcome = TradeOutcome {
            old_probability: 0.5,
            new_probability: 0.55,
            delta_q: 10.0,
            delta_p: 0.05,
            side: Side::Yes,
            stake: 20.0,
        };
        metrics.on_trade(&"m".to_string(), &outcome);
        metrics.on_rejected(&EngineError::InvalidStake(0.0));
        metrics.on_settlement(&settle_trade(10.0, 0.5, false, 0.01).unwrap());
        metrics.on_market_count(3);

        assert_eq!(metrics.trades.with_label_values(&["yes"]).get(), 1);
        assert_eq!(
            metrics.rejections.with_label_values(&["invalid_stake"]).get(),
            1
        );
        assert_eq!(metrics.settlements.with_label_values(&["lose"]).get(), 1);
        assert_eq!(metrics.markets.get(), 3);
    }

    #[test]
    fn test_render_contains_metric_names() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.on_market_count(1);
        let body = metrics.render().unwrap();
        assert!(body.contains("samsa_markets 1"));
    }
}
