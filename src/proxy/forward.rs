//! Outbound forwarding seam.
//!
//! The failover engine only depends on the [`Forwarder`] trait; the actual
//! byte-level proxying (connection handling, streaming bodies) lives behind
//! it. [`HttpForwarder`] is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

/// Failures of a single outbound attempt. All of them are retryable.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("upstream attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
}

/// Contract for the outbound call: take a fully-built upstream request,
/// return the upstream response with its body still streaming.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError>;
}

/// Hyper-based forwarder with a per-attempt deadline.
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HttpForwarder {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, timeout }
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response.map(Body::new)),
            Ok(Err(error)) => Err(ForwardError::Transport(error)),
            Err(_) => Err(ForwardError::Timeout(self.timeout)),
        }
    }
}
