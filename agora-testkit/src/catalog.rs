use std::sync::Arc;

use agora_core::extract::ApiJson;
use agora_core::health::Health;
use agora_core::{ApiError, Envelope, Identity, Role};
use agora_orders::Product;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Shared product map backing the catalog double. Tests can seed or
/// inspect it directly.
pub type ProductMap = Arc<DashMap<String, Product>>;

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Stand-in for the product catalog service.
///
/// Serves only what the rest of the stack relies on: vendors create
/// products, anyone reads them. It trusts the same identity headers the
/// gateway injects for the real services.
pub fn catalog_router(products: ProductMap) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product))
        .route("/health", get(health))
        .layer(axum::middleware::from_fn(agora_core::request_id::set_request_id))
        .with_state(products)
}

async fn create_product(
    State(products): State<ProductMap>,
    identity: Identity,
    ApiJson(body): ApiJson<CreateProduct>,
) -> Result<Json<Envelope<Product>>, ApiError> {
    if identity.role != Role::Vendor {
        return Err(ApiError::Unauthorized("vendor role required".to_string()));
    }
    let product = Product {
        id: format!("prod_{}", uuid::Uuid::new_v4().simple()),
        name: body.name,
        price: body.price,
        stock: body.stock,
        is_active: body.is_active.unwrap_or(true),
    };
    products.insert(product.id.clone(), product.clone());
    Ok(Json(Envelope::with_message(product, "product created")))
}

async fn list_products(State(products): State<ProductMap>) -> Json<Envelope<Vec<Product>>> {
    let mut all: Vec<Product> = products.iter().map(|e| e.value().clone()).collect();
    all.sort_by(|a, b| a.id.cmp(&b.id));
    Json(Envelope::data(all))
}

async fn get_product(
    State(products): State<ProductMap>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Product>>, ApiError> {
    products
        .get(&id)
        .map(|entry| Json(Envelope::data(entry.value().clone())))
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))
}

async fn health() -> Json<Envelope<Health>> {
    Json(Envelope::data(Health::ok("catalog")))
}
