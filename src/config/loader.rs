//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;
use crate::domain::numeric::{normalize_probability, validate_fee, validate_liquidity};

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
  let path = path.as_ref();

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    markets = config.markets.len(),
    liquidity = config.engine.default_liquidity,
    fee = config.engine.platform_fee,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive finite liquidity everywhere
/// - Valid probabilities (fraction or percentage)
/// - Fee fraction in [0, 1]
/// - Non-empty, unique market identifiers
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(!config.service.name.is_empty(), "service.name must not be empty");

  // Engine validation
  validate_liquidity(config.engine.default_liquidity)
    .context("engine.default_liquidity")?;
  normalize_probability(config.engine.default_initial_probability)
    .context("engine.default_initial_probability")?;
  validate_fee(config.engine.platform_fee).context("engine.platform_fee")?;

  // Market validation
  let mut seen = HashSet::new();
  for (i, market) in config.markets.iter().enumerate() {
    anyhow::ensure!(!market.id.is_empty(), "Market {i} has empty id");
    anyhow::ensure!(
      seen.insert(market.id.as_str()),
      "Market id {} is configured more than once",
      market.id
    );

    let (liquidity, probability) = market.resolve(&config.engine);
    validate_liquidity(liquidity)
      .with_context(|| format!("Market {} liquidity", market.id))?;
    normalize_probability(probability)
      .with_context(|| format!("Market {} initial_probability", market.id))?;
  }

  // Persistence validation
  anyhow::ensure!(
    !config.persistence.data_dir.is_empty(),
    "persistence.data_dir must not be empty"
  );
  anyhow::ensure!(
    config.persistence.snapshot_interval_seconds > 0,
    "persistence.snapshot_interval_seconds must be positive"
  );

  Ok(())
}
