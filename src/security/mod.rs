//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → auth.rs middleware
//!         → lockout.rs check (locked? 429 + Retry-After, key never read)
//!         → header extraction (precedence order)
//!         → constant-time validation against the key set
//!         → failure: lockout.rs counter; success: record cleared
//!     → failover engine
//! ```
//!
//! # Design Decisions
//! - Authentication failures are terminal; they never reach the
//!   failover engine
//! - All lockout state is per-IP, per-process, and lost on restart

pub mod auth;
pub mod lockout;

pub use auth::{auth_middleware, AuthError, AuthGuard};
pub use lockout::LockoutTracker;
