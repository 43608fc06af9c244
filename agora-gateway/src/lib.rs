//! Agora edge gateway.
//!
//! The single entry point for clients. Public prefixes under `/api` map to
//! the downstream services; everything off the allow-list is authenticated
//! against the identity verifier before it is relayed. Downstreams never
//! see tokens, only the trusted `X-User-Id` / `X-User-Role` headers the
//! gateway injects after verification.

pub mod health;
pub mod proxy;
pub mod routes;
pub mod settings;
pub mod verify;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;

pub use routes::RouteTable;
pub use settings::Settings;
pub use verify::{VerifiedUser, VerifyClient};

/// Downstream base URLs probed by the aggregated health report.
pub struct ProbeTargets {
    pub auth: String,
    pub catalog: String,
    pub orders: String,
    pub payments: String,
}

/// Shared state for the gateway.
pub struct AppState {
    pub routes: RouteTable,
    pub verifier: VerifyClient,
    pub http: reqwest::Client,
    pub upstream_timeout: Duration,
    pub probe_timeout: Duration,
    pub probes: ProbeTargets,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        let upstream_timeout = Duration::from_secs(settings.upstream_timeout_secs);
        Self {
            routes: RouteTable::new(settings),
            verifier: VerifyClient::new(settings.auth_url.clone(), upstream_timeout),
            http: reqwest::Client::new(),
            upstream_timeout,
            probe_timeout: Duration::from_secs(settings.probe_timeout_secs),
            probes: ProbeTargets {
                auth: settings.auth_url.clone(),
                catalog: settings.catalog_url.clone(),
                orders: settings.orders_url.clone(),
                payments: settings.payments_url.clone(),
            },
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .fallback(proxy::proxy)
        .layer(axum::middleware::from_fn(agora_core::request_id::set_request_id))
        .layer(agora_core::telemetry::trace_layer())
        .with_state(state)
}
