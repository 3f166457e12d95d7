//! Upstream backend descriptor.

use std::fmt;

use url::Url;

/// A single upstream backend.
///
/// Immutable once built; the registry owns every descriptor and hands out
/// shared references for the lifetime of the process.
#[derive(Clone)]
pub struct Backend {
    /// Unique identity, used as the key for health records.
    pub name: String,
    /// Pre-parsed base URL.
    pub url: Url,
    /// Priority; lower values are tried first.
    pub priority: u32,
    /// Credential injected into outbound requests.
    pub api_key: Option<String>,
    /// Deployment name substituted into the request path.
    pub deployment: Option<String>,
}

impl Backend {
    /// Base URL with any trailing slash removed, ready for path joining.
    pub fn base(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name)
            .field("url", &self.url.as_str())
            .field("priority", &self.priority)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("deployment", &self.deployment)
            .finish()
    }
}
