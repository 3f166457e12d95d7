//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment variables
//!     → loader.rs (scan indexed groups, merge key sources, typed errors)
//!     → schema.rs (GatewayConfig tree with per-section defaults)
//!     → consumed once at startup; immutable afterwards
//! ```
//!
//! # Design Decisions
//! - Configuration errors are fatal; nothing starts on a bad config
//! - Loader accepts any (key, value) iterator so tests never touch the
//!   process environment

pub mod loader;
pub mod schema;

pub use loader::{load_from_env, load_from_vars, ConfigError};
pub use schema::{
    AuthConfig, BackendConfig, GatewayConfig, HealthConfig, HttpConfig, ListenerConfig,
    ObservabilityConfig, TimeoutConfig,
};
