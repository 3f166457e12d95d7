//! Passive health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Failover engine observes an upstream outcome
//!     → tracker.rs (429/5xx: record recover-at; otherwise: clear record)
//!
//! Failover engine selects a candidate
//!     → tracker.rs is_healthy (no record or expired record = healthy;
//!       expired records are discarded on the spot)
//! ```
//!
//! # Design Decisions
//! - Health is inferred from real traffic, never from probes
//! - State is process-local; a restart clears all records

pub mod tracker;

pub use tracker::{BackendHealth, CooldownTracker};
