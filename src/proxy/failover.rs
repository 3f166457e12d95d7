//! Priority failover orchestration.
//!
//! # Responsibilities
//! - Walk the registry in priority order, skipping benched backends
//! - Rewrite each attempt for its target (credential, deployment name)
//! - Feed every outcome back to the health tracker
//! - Return the first conclusive response, or the last failure on exhaustion
//!
//! # Design Decisions
//! - Failover is immediate: no backoff, no jitter; candidate exhaustion is
//!   rare and latency matters more than smoothing
//! - Each healthy candidate is tried at most once per request
//! - The client's credential headers never reach an upstream

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderValue, AUTHORIZATION, RETRY_AFTER};
use axum::http::{request::Parts, HeaderMap, Request, StatusCode};
use axum::response::Response;

use crate::health::BackendHealth;
use crate::http::response::error_response;
use crate::observability::metrics;
use crate::proxy::forward::Forwarder;
use crate::security::auth::{API_KEY_HEADER, AZURE_KEY_HEADER, GATEWAY_KEY_HEADER};
use crate::upstream::{Backend, BackendRegistry};

/// Headers never copied onto an upstream request: hop-by-hop plumbing plus
/// every inbound credential source.
const STRIPPED_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "authorization",
    GATEWAY_KEY_HEADER,
    API_KEY_HEADER,
    AZURE_KEY_HEADER,
];

/// Request-time coordinator for the failover pipeline.
pub struct FailoverEngine {
    registry: Arc<BackendRegistry>,
    health: Arc<dyn BackendHealth>,
    forwarder: Arc<dyn Forwarder>,
}

impl FailoverEngine {
    pub fn new(
        registry: Arc<BackendRegistry>,
        health: Arc<dyn BackendHealth>,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        Self {
            registry,
            health,
            forwarder,
        }
    }

    /// Attempt delivery against the best available backend.
    ///
    /// The inbound body is pre-buffered by the caller so it can be replayed
    /// on each attempt. If the client disconnects, this future is dropped,
    /// which aborts the in-flight upstream call; observations already
    /// recorded stand.
    pub async fn dispatch(&self, parts: &Parts, body: Bytes) -> Response {
        let mut last_failure: Option<Response> = None;

        for backend in self.registry.ordered() {
            if !self.health.is_healthy(&backend.name) {
                tracing::debug!(backend = %backend.name, "Skipping backend in cooldown");
                continue;
            }

            let request = match build_upstream_request(backend, parts, body.clone()) {
                Ok(request) => request,
                Err(error) => {
                    tracing::error!(backend = %backend.name, %error, "Failed to build upstream request");
                    continue;
                }
            };

            match self.forwarder.forward(request).await {
                Ok(response) => {
                    let status = response.status();
                    let retry_after = parse_retry_after(response.headers());
                    self.health.observe(&backend.name, status, retry_after);
                    metrics::record_upstream_attempt(&backend.name, status.as_u16());

                    if is_retryable(status) {
                        tracing::warn!(
                            backend = %backend.name,
                            status = status.as_u16(),
                            retry_after_secs = retry_after.map(|d| d.as_secs()),
                            "Upstream throttled or failing; trying next candidate"
                        );
                        metrics::record_failover(&backend.name);
                        last_failure = Some(response);
                        continue;
                    }

                    tracing::debug!(
                        backend = %backend.name,
                        status = status.as_u16(),
                        "Upstream served request"
                    );
                    return response;
                }
                Err(error) => {
                    self.health
                        .observe(&backend.name, StatusCode::BAD_GATEWAY, None);
                    metrics::record_upstream_attempt(&backend.name, StatusCode::BAD_GATEWAY.as_u16());
                    metrics::record_failover(&backend.name);
                    tracing::error!(backend = %backend.name, %error, "Upstream attempt failed");
                    last_failure = Some(error_response(
                        StatusCode::BAD_GATEWAY,
                        "BadGateway",
                        "Upstream request failed.",
                    ));
                }
            }
        }

        last_failure.unwrap_or_else(|| {
            tracing::warn!("All upstream backends are in cooldown; nothing attempted");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "ServiceUnavailable",
                "No healthy upstream backend available.",
            )
        })
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Integer-seconds Retry-After. HTTP-date values are ignored and fall back
/// to the tracker's default cooldown.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Rebuild the inbound request for one backend: target URI with the
/// deployment override applied, plumbing and credential headers stripped,
/// and the backend's own credential injected.
fn build_upstream_request(
    backend: &Backend,
    parts: &Parts,
    body: Bytes,
) -> Result<Request<Body>, axum::http::Error> {
    let original = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let path_and_query = match backend.deployment.as_deref() {
        Some(deployment) => rewrite_deployment(original, deployment),
        None => original.to_string(),
    };

    let mut builder = Request::builder()
        .method(parts.method.clone())
        .uri(format!("{}{}", backend.base(), path_and_query));

    if let Some(headers) = builder.headers_mut() {
        for (name, value) in parts.headers.iter() {
            if STRIPPED_HEADERS.contains(&name.as_str()) {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }

        if let Some(key) = backend.api_key.as_deref() {
            if let Ok(value) = HeaderValue::from_str(key) {
                headers.insert(AZURE_KEY_HEADER, value);
            }
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {key}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }
    }

    builder.body(Body::from(body))
}

/// Replace the path segment following `deployments` with the override.
/// Paths without that segment pass through untouched.
fn rewrite_deployment(path_and_query: &str, deployment: &str) -> String {
    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_and_query, None),
    };

    let mut segments: Vec<&str> = path.split('/').collect();
    for i in 0..segments.len().saturating_sub(1) {
        if segments[i] == "deployments" {
            segments[i + 1] = deployment;
            break;
        }
    }

    let rewritten = segments.join("/");
    match query {
        Some(query) => format!("{rewritten}?{query}"),
        None => rewritten,
    }
}
