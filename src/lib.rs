//! Samsa LMSR Engine — Library Root
//!
//! Pricing, trade application and rebated-risk settlement for binary
//! prediction markets, plus the registry and persistence adapters that
//! host them. Re-exports all modules for integration tests and benchmarks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
