//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces.
//!
//! Use cases:
//! - `MarketManager`: Registry of markets, trade routing, settlement
//! - `SnapshotService`: Restore/snapshot of market state via a repository

pub mod market_manager;
pub mod snapshot;

pub use market_manager::{Investment, MarketHandle, MarketManager};
pub use snapshot::SnapshotService;
