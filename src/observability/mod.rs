//! Observability subsystem.
//!
//! # Design Decisions
//! - tracing for structured logs; filter from RUST_LOG with a config fallback
//! - Prometheus exposition on a separate listener, off by default
//! - Metric updates are cheap enough for the request hot path

pub mod logging;
pub mod metrics;
