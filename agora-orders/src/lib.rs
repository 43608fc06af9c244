//! Agora cart store and order coordinator.
//!
//! Carts hold price and name snapshots taken when an item is added; checkout
//! re-validates availability against the live catalog but charges the
//! snapshot price. Orders move through a small state machine, `pending` to
//! `paid` or `cancelled`, enforced by a compare-and-set in the store so
//! concurrent settlement callbacks cannot double-apply.

pub mod catalog;
pub mod handlers;
pub mod model;
pub mod settings;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;

pub use catalog::CatalogClient;
pub use model::{Cart, CartItem, Order, OrderItem, OrderStatus, Product};
pub use settings::Settings;
pub use store::{CartStore, OrderStore};

/// Shared state for the orders service.
pub struct AppState {
    pub carts: CartStore,
    pub orders: OrderStore,
    pub catalog: CatalogClient,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            carts: CartStore::new(),
            orders: OrderStore::new(),
            catalog: CatalogClient::new(
                settings.catalog_url.clone(),
                Duration::from_secs(settings.upstream_timeout_secs),
            ),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/cart",
            get(handlers::get_cart).delete(handlers::clear_cart),
        )
        .route("/cart/items", post(handlers::add_item))
        .route(
            "/cart/items/{product_id}",
            put(handlers::update_item).delete(handlers::remove_item),
        )
        .route(
            "/orders",
            post(handlers::create_order).get(handlers::list_orders),
        )
        .route("/orders/{id}", get(handlers::get_order))
        .route("/orders/{id}/cancel", post(handlers::cancel_order))
        .route("/orders/{id}/status", put(handlers::set_status))
        .route("/health", get(handlers::health))
        .layer(axum::middleware::from_fn(agora_core::request_id::set_request_id))
        .layer(agora_core::telemetry::trace_layer())
        .with_state(state)
}
