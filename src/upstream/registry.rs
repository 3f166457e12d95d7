//! Priority-ordered backend registry.
//!
//! # Responsibilities
//! - Parse and validate backend descriptors from configuration
//! - Expose a stable priority-ordered view
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Stable sort: equal priorities keep declaration order, so failover
//!   order is deterministic
//! - Zero valid backends is a fatal startup condition, not a warning

use std::collections::HashSet;
use std::sync::Arc;

use url::Url;

use crate::config::{BackendConfig, ConfigError};
use crate::upstream::backend::Backend;

/// The immutable, priority-ordered set of upstream backends.
#[derive(Debug)]
pub struct BackendRegistry {
    ordered: Vec<Arc<Backend>>,
}

impl BackendRegistry {
    /// Build the registry from configuration.
    ///
    /// Fails on an empty set, an unparsable URL, or a duplicate identity.
    pub fn from_config(configs: &[BackendConfig]) -> Result<Self, ConfigError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut ordered = Vec::with_capacity(configs.len());

        for config in configs {
            if !seen.insert(config.name.as_str()) {
                return Err(ConfigError::DuplicateBackend {
                    name: config.name.clone(),
                });
            }

            let url = Url::parse(&config.url).map_err(|source| ConfigError::InvalidUrl {
                name: config.name.clone(),
                url: config.url.clone(),
                source,
            })?;

            ordered.push(Arc::new(Backend {
                name: config.name.clone(),
                url,
                priority: config.priority,
                api_key: config.api_key.clone(),
                deployment: config.deployment.clone(),
            }));
        }

        if ordered.is_empty() {
            return Err(ConfigError::NoBackends);
        }

        // Vec::sort_by_key is stable; declaration order breaks priority ties.
        ordered.sort_by_key(|b| b.priority);

        for backend in &ordered {
            tracing::info!(
                backend = %backend.name,
                url = %backend.url,
                priority = backend.priority,
                has_credential = backend.api_key.is_some(),
                deployment = backend.deployment.as_deref().unwrap_or("-"),
                "Registered upstream backend"
            );
        }

        Ok(Self { ordered })
    }

    /// The backends in failover order. Pure read; safe for concurrent callers.
    pub fn ordered(&self) -> &[Arc<Backend>] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
