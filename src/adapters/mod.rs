//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! infrastructure (file I/O, HTTP, Prometheus).
//!
//! Adapter categories:
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: JSON market snapshots and JSONL trade logging

pub mod metrics;
pub mod persistence;
