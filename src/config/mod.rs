//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! Engine defaults, seeded markets, persistence and metrics
//! settings are externalized here - nothing is hardcoded in
//! the domain layer beyond its documented defaults.

pub mod loader;

use serde::Deserialize;

use crate::domain::numeric::{DEFAULT_LIQUIDITY, DEFAULT_PLATFORM_FEE};

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and logging.
  pub service: ServiceConfig,
  /// Engine defaults.
  #[serde(default)]
  pub engine: EngineConfig,
  /// Markets created at startup if not already restored.
  #[serde(default)]
  pub markets: Vec<MarketConfig>,
  /// Persistence configuration.
  #[serde(default)]
  pub persistence: PersistenceConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Engine defaults applied to markets that don't override them.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Liquidity parameter (b) in dollars. Higher = more stable prices.
  #[serde(default = "default_liquidity")]
  pub default_liquidity: f64,
  /// Starting probability, fraction or percentage.
  #[serde(default = "default_initial_probability")]
  pub default_initial_probability: f64,
  /// Platform fee fraction charged on winning profit.
  #[serde(default = "default_platform_fee")]
  pub platform_fee: f64,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      default_liquidity: default_liquidity(),
      default_initial_probability: default_initial_probability(),
      platform_fee: default_platform_fee(),
    }
  }
}

/// A market seeded at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
  /// Market identifier.
  pub id: String,
  /// Market-specific liquidity override.
  pub liquidity: Option<f64>,
  /// Market-specific starting probability override.
  pub initial_probability: Option<f64>,
}

impl MarketConfig {
  /// Liquidity and starting probability, falling back to engine defaults.
  pub fn resolve(&self, engine: &EngineConfig) -> (f64, f64) {
    (
      self.liquidity.unwrap_or(engine.default_liquidity),
      self
        .initial_probability
        .unwrap_or(engine.default_initial_probability),
    )
  }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory for snapshots and JSONL trade logs.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
  /// State snapshot interval (seconds).
  #[serde(default = "default_snapshot_interval")]
  pub snapshot_interval_seconds: u64,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
      snapshot_interval_seconds: default_snapshot_interval(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: default_true(),
      bind_address: default_metrics_addr(),
      health_port: default_health_port(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_liquidity() -> f64 {
  DEFAULT_LIQUIDITY
}

fn default_initial_probability() -> f64 {
  0.5
}

fn default_platform_fee() -> f64 {
  DEFAULT_PLATFORM_FEE
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_snapshot_interval() -> u64 {
  60
}
