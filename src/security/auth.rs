//! API-key authentication with brute-force lockout.
//!
//! # Responsibilities
//! - Extract the client key from the supported header sources
//! - Validate it against the configured key set in constant time
//! - Enforce the per-IP lockout before any key inspection
//!
//! # Design Decisions
//! - Lockout check precedes key validation; a locked client learns nothing
//!   about the key it presented
//! - Comparison is XOR-accumulate over the full key; only the length check
//!   short-circuits (leaks key length, an accepted trade-off)
//! - An empty configured key set disables authentication entirely

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::response::error_response;
use crate::observability::metrics;
use crate::security::lockout::LockoutTracker;

/// Dedicated gateway key header; takes precedence over every other source.
pub const GATEWAY_KEY_HEADER: &str = "x-gateway-key";
/// Generic API-key header.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Azure-style API-key header.
pub const AZURE_KEY_HEADER: &str = "api-key";

/// Terminal authentication outcomes. None of these reach the failover engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no API key was provided")]
    MissingKey,

    #[error("the provided API key is not valid")]
    InvalidKey,

    #[error("too many failed authentication attempts")]
    LockedOut { retry_after_secs: u64 },
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingKey => error_response(
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Missing API key.",
            ),
            AuthError::InvalidKey => error_response(
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Invalid API key.",
            ),
            AuthError::LockedOut { retry_after_secs } => {
                let mut response = error_response(
                    StatusCode::TOO_MANY_REQUESTS,
                    "TooManyRequests",
                    "Too many failed authentication attempts. Retry later.",
                );
                if let Ok(value) = retry_after_secs.to_string().parse() {
                    response.headers_mut().insert("retry-after", value);
                }
                response
            }
        }
    }
}

/// Gates every proxied request behind API-key validation.
pub struct AuthGuard {
    /// Trimmed, deduplicated key bytes. Empty means auth is disabled.
    keys: Vec<Vec<u8>>,
    lockouts: LockoutTracker,
}

impl AuthGuard {
    pub fn new(keys: &[String], max_failures: u32, lockout_window: Duration) -> Self {
        let mut normalized: Vec<Vec<u8>> = Vec::new();
        for key in keys {
            let trimmed = key.trim().as_bytes().to_vec();
            if !trimmed.is_empty() && !normalized.contains(&trimmed) {
                normalized.push(trimmed);
            }
        }

        if normalized.is_empty() {
            tracing::warn!(
                "No API keys configured; authentication is DISABLED and all requests pass through"
            );
        } else {
            tracing::info!(key_count = normalized.len(), "API-key authentication enabled");
        }

        Self {
            keys: normalized,
            lockouts: LockoutTracker::new(max_failures, lockout_window),
        }
    }

    /// Whether the operational escape hatch (no configured keys) is active.
    pub fn disabled(&self) -> bool {
        self.keys.is_empty()
    }

    /// Run the full admission check for one request.
    pub fn authorize(&self, ip: IpAddr, headers: &HeaderMap) -> Result<(), AuthError> {
        if self.disabled() {
            return Ok(());
        }

        if let Some(remaining) = self.lockouts.check(ip) {
            return Err(AuthError::LockedOut {
                retry_after_secs: remaining.as_secs_f64().ceil() as u64,
            });
        }

        let provided = match extract_key(headers) {
            Some(key) => key,
            None => {
                self.lockouts.record_failure(ip);
                return Err(AuthError::MissingKey);
            }
        };

        if self
            .keys
            .iter()
            .any(|valid| constant_time_eq(valid, provided.as_bytes()))
        {
            self.lockouts.record_success(ip);
            Ok(())
        } else {
            let failures = self.lockouts.record_failure(ip);
            tracing::warn!(client = %ip, failures, "Rejected request with invalid API key");
            Err(AuthError::InvalidKey)
        }
    }
}

/// Axum middleware wrapping the proxied routes.
///
/// The health-check route is registered outside this layer, so exempt
/// traffic never reaches the failure counters.
pub async fn auth_middleware(
    State(guard): State<Arc<AuthGuard>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match guard.authorize(addr.ip(), request.headers()) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            metrics::record_auth_rejected(match err {
                AuthError::MissingKey => "missing_key",
                AuthError::InvalidKey => "invalid_key",
                AuthError::LockedOut { .. } => "locked_out",
            });
            err.into_response()
        }
    }
}

/// Pull the client key out of the supported header sources.
///
/// Precedence: dedicated gateway header, `Authorization: Bearer`, generic
/// API-key header, Azure-style header. A present-but-blank source does not
/// match; the scan falls through to the next one.
pub fn extract_key(headers: &HeaderMap) -> Option<String> {
    if let Some(key) = trimmed_header(headers, GATEWAY_KEY_HEADER) {
        return Some(key);
    }
    if let Some(token) = bearer_token(headers) {
        return Some(token);
    }
    if let Some(key) = trimmed_header(headers, API_KEY_HEADER) {
        return Some(key);
    }
    trimmed_header(headers, AZURE_KEY_HEADER)
}

fn trimmed_header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Parse `Authorization: Bearer <token>` with a case-insensitive scheme.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?.to_str().ok()?.trim();
    let (scheme, rest) = value.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Compare two byte strings without early exit on the first mismatch.
///
/// The length check short-circuits; everything else is XOR-accumulated so
/// response time does not reveal how much of the key matched.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    fn guard(keys: &[&str]) -> AuthGuard {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        AuthGuard::new(&keys, 5, Duration::from_secs(900))
    }

    #[test]
    fn constant_time_eq_matches_and_rejects() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secrets"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn extraction_precedence_dedicated_first() {
        let map = headers(&[
            (GATEWAY_KEY_HEADER, "from-dedicated"),
            ("authorization", "Bearer from-bearer"),
            (API_KEY_HEADER, "from-generic"),
            (AZURE_KEY_HEADER, "from-azure"),
        ]);
        assert_eq!(extract_key(&map).as_deref(), Some("from-dedicated"));
    }

    #[test]
    fn bearer_beats_generic_and_azure() {
        let map = headers(&[
            ("authorization", "Bearer from-bearer"),
            (API_KEY_HEADER, "from-generic"),
            (AZURE_KEY_HEADER, "from-azure"),
        ]);
        assert_eq!(extract_key(&map).as_deref(), Some("from-bearer"));
    }

    #[test]
    fn generic_beats_azure() {
        let map = headers(&[
            (API_KEY_HEADER, "from-generic"),
            (AZURE_KEY_HEADER, "from-azure"),
        ]);
        assert_eq!(extract_key(&map).as_deref(), Some("from-generic"));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive_and_trimmed() {
        let map = headers(&[("authorization", "  bEaReR    spaced-token   ")]);
        assert_eq!(extract_key(&map).as_deref(), Some("spaced-token"));
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let map = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_key(&map), None);
    }

    #[test]
    fn blank_source_falls_through() {
        let map = headers(&[
            (GATEWAY_KEY_HEADER, "   "),
            (AZURE_KEY_HEADER, "from-azure"),
        ]);
        assert_eq!(extract_key(&map).as_deref(), Some("from-azure"));
    }

    #[test]
    fn valid_key_authorizes_and_clears_failures() {
        let g = guard(&["good-key"]);
        for _ in 0..4 {
            let _ = g.authorize(ip(1), &headers(&[(API_KEY_HEADER, "bad")]));
        }
        assert_eq!(
            g.authorize(ip(1), &headers(&[(API_KEY_HEADER, "good-key")])),
            Ok(())
        );
        // Counter was wiped; four more misses still fall short of lockout.
        for _ in 0..4 {
            let _ = g.authorize(ip(1), &headers(&[(API_KEY_HEADER, "bad")]));
        }
        assert_eq!(
            g.authorize(ip(1), &headers(&[(API_KEY_HEADER, "good-key")])),
            Ok(())
        );
    }

    #[test]
    fn whitespace_only_key_is_missing_not_wrong() {
        let g = guard(&["good-key"]);
        let err = g
            .authorize(ip(2), &headers(&[(API_KEY_HEADER, "   ")]))
            .unwrap_err();
        assert_eq!(err, AuthError::MissingKey);
    }

    #[test]
    fn fifth_failure_locks_out() {
        let g = guard(&["good-key"]);
        for _ in 0..4 {
            assert_eq!(
                g.authorize(ip(3), &headers(&[(API_KEY_HEADER, "bad")])),
                Err(AuthError::InvalidKey)
            );
        }
        assert_eq!(
            g.authorize(ip(3), &headers(&[(API_KEY_HEADER, "bad")])),
            Err(AuthError::InvalidKey)
        );
        // Locked now: even the valid key is refused without inspection.
        match g.authorize(ip(3), &headers(&[(API_KEY_HEADER, "good-key")])) {
            Err(AuthError::LockedOut { retry_after_secs }) => {
                assert_eq!(retry_after_secs, 900);
            }
            other => panic!("expected lockout, got {other:?}"),
        }
    }

    #[test]
    fn lockout_expiry_reopens() {
        let keys = vec!["good-key".to_string()];
        let g = AuthGuard::new(&keys, 2, Duration::from_millis(10));
        for _ in 0..2 {
            let _ = g.authorize(ip(4), &headers(&[(API_KEY_HEADER, "bad")]));
        }
        assert!(matches!(
            g.authorize(ip(4), &headers(&[(API_KEY_HEADER, "good-key")])),
            Err(AuthError::LockedOut { .. })
        ));

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(
            g.authorize(ip(4), &headers(&[(API_KEY_HEADER, "good-key")])),
            Ok(())
        );
    }

    #[test]
    fn lockout_is_per_ip() {
        let g = guard(&["good-key"]);
        for _ in 0..5 {
            let _ = g.authorize(ip(5), &headers(&[(API_KEY_HEADER, "bad")]));
        }
        assert!(matches!(
            g.authorize(ip(5), &headers(&[(API_KEY_HEADER, "good-key")])),
            Err(AuthError::LockedOut { .. })
        ));
        assert_eq!(
            g.authorize(ip(6), &headers(&[(API_KEY_HEADER, "good-key")])),
            Ok(())
        );
    }

    #[test]
    fn empty_key_set_disables_authentication() {
        let g = guard(&[]);
        assert!(g.disabled());
        assert_eq!(g.authorize(ip(7), &HeaderMap::new()), Ok(()));
    }

    #[test]
    fn configured_keys_are_trimmed_and_deduplicated() {
        let g = guard(&["  spaced  ", "spaced", "other"]);
        assert_eq!(g.keys.len(), 2);
        assert_eq!(
            g.authorize(ip(8), &headers(&[(API_KEY_HEADER, "spaced")])),
            Ok(())
        );
    }
}
