//! Priority failover gateway for upstream inference backends.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌────────────────────────────────────────────────────┐
//!                       │                 INFERENCE GATEWAY                   │
//!                       │                                                     │
//!    Client Request     │  ┌─────────┐    ┌───────────┐    ┌──────────────┐  │
//!    ───────────────────┼─▶│  http   │───▶│ security  │───▶│    proxy     │  │
//!                       │  │ server  │    │auth guard │    │   failover   │  │
//!                       │  └─────────┘    └───────────┘    └──────┬───────┘  │
//!                       │                                         │          │
//!                       │                                         ▼          │
//!                       │                                 ┌──────────────┐   │
//!                       │                                 │   upstream   │   │
//!                       │                                 │   registry   │   │
//!                       │                                 └──────┬───────┘   │
//!                       │                                        │           │
//!    Client Response    │  ┌───────────────┐   ┌─────────┐   ┌───┴────────┐  │     Backend 1 (prio 1)
//!    ◀──────────────────┼──│   response    │◀──│ health  │◀──│ forwarder  │◀─┼───▶ Backend 2 (prio 2)
//!                       │  │  passthrough  │   │ tracker │   │ (hyper)    │  │     Backend N ...
//!                       │  └───────────────┘   └─────────┘   └────────────┘  │
//!                       │                                                     │
//!                       │  ┌───────────────────────────────────────────────┐  │
//!                       │  │            Cross-Cutting Concerns             │  │
//!                       │  │  ┌────────┐ ┌──────────────┐ ┌────────────┐   │  │
//!                       │  │  │ config │ │observability │ │ lifecycle  │   │  │
//!                       │  │  └────────┘ └──────────────┘ └────────────┘   │  │
//!                       │  └───────────────────────────────────────────────┘  │
//!                       └────────────────────────────────────────────────────┘
//! ```
//!
//! Requests are admitted by the API-key guard (with per-IP lockout), then the
//! failover engine walks the priority-ordered backend registry, skipping
//! backends in cooldown, forwarding to the first healthy candidate and
//! failing over immediately on 429/5xx/transport errors. Health is inferred
//! passively from those same outcomes.

// Core subsystems
pub mod config;
pub mod http;
pub mod proxy;
pub mod upstream;

// Traffic management
pub mod health;
pub mod security;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{GatewayConfig, ConfigError};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
