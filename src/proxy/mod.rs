//! Failover pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Admitted request (body pre-buffered)
//!     → failover.rs (walk registry order, skip benched backends)
//!         → forward.rs (outbound call with per-attempt deadline)
//!         → health tracker observes every outcome
//!         → 429/5xx/transport error: next candidate, no delay
//!         → conclusive response: returned as-is
//!     → exhaustion: last upstream failure, or synthesized 503
//! ```
//!
//! # Design Decisions
//! - The engine owns no sockets; all byte-level proxying sits behind the
//!   Forwarder trait
//! - Response bodies stream through; only request bodies are buffered, for
//!   replay across attempts

pub mod failover;
pub mod forward;

pub use failover::FailoverEngine;
pub use forward::{ForwardError, Forwarder, HttpForwarder};
