//! Agora payment processor.
//!
//! Settlement is simulated: a configurable success probability decides each
//! attempt, drawn from a seedable RNG. What is real is the idempotency gate,
//! one payment record per order no matter how many times or how concurrently
//! settlement is requested, and the callback that moves the order to `paid`
//! or `cancelled`.

pub mod handlers;
pub mod model;
pub mod orders_client;
pub mod settings;
pub mod simulator;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;

pub use model::{Payment, PaymentMethod, PaymentStatus};
pub use orders_client::{OrderState, OrderSummary, OrdersClient};
pub use settings::Settings;
pub use simulator::Simulator;
pub use store::PaymentStore;

/// Shared state for the payments service.
pub struct AppState {
    pub payments: PaymentStore,
    pub orders: OrdersClient,
    pub simulator: Simulator,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            payments: PaymentStore::new(),
            orders: OrdersClient::new(
                settings.orders_url.clone(),
                Duration::from_secs(settings.upstream_timeout_secs),
            ),
            simulator: Simulator::new(
                settings.success_rate,
                Duration::from_millis(settings.latency_ms),
                settings.rng_seed,
            ),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/payments/process", post(handlers::process))
        .route("/payments/order/{order_id}", get(handlers::by_order))
        .route("/health", get(handlers::health))
        .layer(axum::middleware::from_fn(agora_core::request_id::set_request_id))
        .layer(agora_core::telemetry::trace_layer())
        .with_state(state)
}
