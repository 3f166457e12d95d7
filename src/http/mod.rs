//! HTTP surface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request-id + trace layers)
//!     → health route (no auth, no bookkeeping)  |  proxy routes
//!                                               → security::auth middleware
//!                                               → proxy handler (buffer body)
//!                                               → proxy::FailoverEngine
//!     → response.rs (structured error bodies for gateway-generated replies)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, GatewayServer};
