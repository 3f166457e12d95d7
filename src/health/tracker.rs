//! Cooldown-based passive health tracking.
//!
//! # Responsibilities
//! - Observe request outcomes per backend
//! - Mark a backend unhealthy on 429/5xx, honoring upstream Retry-After
//! - Recover backends lazily once their cooldown elapses
//!
//! # Design Decisions
//! - No active probing and no background sweep; expiry happens on query
//! - Per-backend records update independently through the sharded map's
//!   atomic entry operations
//! - A success from a cooling-down backend clears its record immediately

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use dashmap::DashMap;

/// Capability interface for passive health policies.
///
/// The failover engine only depends on this trait, so a different policy
/// (active probing, error-rate windows) can be substituted without touching
/// the request path.
pub trait BackendHealth: Send + Sync {
    /// Feed one observed outcome for `backend`.
    fn observe(&self, backend: &str, status: StatusCode, retry_after: Option<Duration>);

    /// Whether `backend` should currently receive traffic.
    fn is_healthy(&self, backend: &str) -> bool;
}

/// The default policy: a throttled or failing backend is benched until a
/// recovery deadline, then considered healthy again.
#[derive(Debug)]
pub struct CooldownTracker {
    /// backend name → instant at which it becomes eligible again.
    records: DashMap<String, Instant>,
    /// Cooldown applied when the backend supplied no usable Retry-After.
    default_cooldown: Duration,
}

impl CooldownTracker {
    pub fn new(default_cooldown: Duration) -> Self {
        Self {
            records: DashMap::new(),
            default_cooldown,
        }
    }

    fn is_retryable(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}

impl BackendHealth for CooldownTracker {
    fn observe(&self, backend: &str, status: StatusCode, retry_after: Option<Duration>) {
        if Self::is_retryable(status) {
            let cooldown = retry_after.unwrap_or(self.default_cooldown);
            self.records
                .insert(backend.to_string(), Instant::now() + cooldown);
            tracing::warn!(
                backend,
                status = status.as_u16(),
                cooldown_secs = cooldown.as_secs(),
                "Backend benched after throttling/failure"
            );
        } else if self.records.remove(backend).is_some() {
            tracing::info!(backend, "Backend recovered");
        }
    }

    fn is_healthy(&self, backend: &str) -> bool {
        let now = Instant::now();
        let expired = match self.records.get(backend) {
            None => return true,
            Some(recover_at) => now >= *recover_at,
        };

        if expired {
            // Lazy cleanup. The guard keeps a concurrent re-observation from
            // being discarded along with the stale record.
            self.records
                .remove_if(backend, |_, recover_at| now >= *recover_at);
        }

        expired
    }
}
