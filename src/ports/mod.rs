//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `MarketRepository`: Market state snapshots and trade audit log
//! - `TradeObserver`: Engine event sink (metrics)

pub mod observer;
pub mod repository;

pub use observer::TradeObserver;
pub use repository::{MarketRepository, MarketsSnapshot, TradeRecord};
