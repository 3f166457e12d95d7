//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits so tests and embedders can build them
//! programmatically; production loads them from the environment via
//! [`crate::config::loader`].

use serde::{Deserialize, Serialize};

/// Root configuration for the failover gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream backend definitions, in declaration order.
    pub backends: Vec<BackendConfig>,

    /// API-key authentication and lockout settings.
    pub auth: AuthConfig,

    /// Passive health tracking settings.
    pub health: HealthConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// HTTP surface settings.
    pub http: HttpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A single upstream backend, as declared in the environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier.
    pub name: String,

    /// Base URL of the backend (e.g., "http://127.0.0.1:3000").
    pub url: String,

    /// Priority; lower values are tried first.
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Credential injected into outbound requests to this backend.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Deployment name substituted into the request path.
    #[serde(default)]
    pub deployment: Option<String>,
}

fn default_priority() -> u32 {
    1
}

/// Authentication and per-IP lockout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Accepted API keys. Empty disables authentication entirely.
    pub keys: Vec<String>,

    /// Consecutive failures from one IP before it is locked out.
    pub max_failures: u32,

    /// Lockout window in seconds.
    pub lockout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            max_failures: 5,
            lockout_secs: 900,
        }
    }
}

/// Passive health tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Cooldown applied when a throttled/failing backend supplies no
    /// parsable Retry-After, in seconds.
    pub default_cooldown_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            default_cooldown_secs: 30,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-attempt upstream request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 100 }
    }
}

/// HTTP surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Path that bypasses authentication and failover bookkeeping.
    pub health_path: String,

    /// Maximum request body size buffered for failover replay, in bytes.
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            health_path: "/healthz".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Fallback log filter when RUST_LOG is unset.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "inference_gateway=info,tower_http=warn".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
