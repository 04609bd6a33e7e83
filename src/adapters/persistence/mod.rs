//! Persistence Adapters - File Storage for Market State
//!
//! Implements the `MarketRepository` port with an atomic JSON
//! snapshot of all markets and append-only JSONL trade logs.

pub mod repository_impl;
pub mod state;
pub mod trades;

pub use repository_impl::RepositoryImpl;
pub use state::StateStore;
pub use trades::TradeLogger;
