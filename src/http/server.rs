//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the health and proxy routes
//! - Wire up middleware (request ID, tracing, authentication)
//! - Buffer inbound bodies so failover can replay them
//! - Dispatch admitted requests to the failover engine
//!
//! # Design Decisions
//! - The health route is registered outside the auth layer; it can never
//!   touch lockout counters or health records
//! - Collaborators are injectable so tests run the full HTTP surface
//!   against scripted forwarders

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Request, StatusCode},
    middleware,
    response::Response,
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::{ConfigError, GatewayConfig};
use crate::health::{BackendHealth, CooldownTracker};
use crate::http::request::UuidRequestId;
use crate::http::response::error_response;
use crate::observability::metrics;
use crate::proxy::{FailoverEngine, Forwarder, HttpForwarder};
use crate::security::auth::{auth_middleware, AuthGuard};
use crate::upstream::BackendRegistry;

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FailoverEngine>,
    pub max_body_bytes: usize,
}

/// HTTP server for the failover gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a server with the production collaborators.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(BackendRegistry::from_config(&config.backends)?);
        let health: Arc<dyn BackendHealth> = Arc::new(CooldownTracker::new(
            Duration::from_secs(config.health.default_cooldown_secs),
        ));
        let forwarder: Arc<dyn Forwarder> = Arc::new(HttpForwarder::new(Duration::from_secs(
            config.timeouts.request_secs,
        )));
        Self::with_parts(config, registry, health, forwarder)
    }

    /// Assemble a server from explicit collaborators.
    ///
    /// Tests inject scripted forwarders and short-window trackers here.
    pub fn with_parts(
        config: GatewayConfig,
        registry: Arc<BackendRegistry>,
        health: Arc<dyn BackendHealth>,
        forwarder: Arc<dyn Forwarder>,
    ) -> Result<Self, ConfigError> {
        let guard = Arc::new(AuthGuard::new(
            &config.auth.keys,
            config.auth.max_failures,
            Duration::from_secs(config.auth.lockout_secs),
        ));
        let engine = Arc::new(FailoverEngine::new(registry, health, forwarder));
        let state = AppState {
            engine,
            max_body_bytes: config.http.max_body_bytes,
        };

        let router = Self::build_router(&config, state, guard);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState, guard: Arc<AuthGuard>) -> Router {
        let proxied = Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .route_layer(middleware::from_fn_with_state(guard, auth_middleware))
            .with_state(state);

        Router::new()
            .route(&config.http.health_path, get(health_handler))
            .merge(proxied)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http()),
            )
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

/// Liveness endpoint; bypasses authentication and failover bookkeeping.
async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Admitted-request handler: buffer the body, hand off to the engine.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();

    let body = match to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            metrics::record_request(parts.method.as_str(), StatusCode::PAYLOAD_TOO_LARGE.as_u16(), start);
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "PayloadTooLarge",
                "Request body exceeds the configured limit.",
            );
        }
    };

    let response = state.engine.dispatch(&parts, body).await;
    metrics::record_request(parts.method.as_str(), response.status().as_u16(), start);
    response
}
