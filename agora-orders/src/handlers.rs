use std::sync::Arc;

use agora_core::health::Health;
use agora_core::{ApiError, ApiJson, Envelope, Identity, RequestId};
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Cart, CartItem, Order, OrderItem, OrderStatus};
use crate::AppState;

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_id: Option<String>,
}

/// Cart as returned to clients, with the computed total alongside the lines.
#[derive(Serialize, Deserialize)]
pub struct CartView {
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub total: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            total: cart.total(),
            user_id: cart.user_id,
            items: cart.items,
            updated_at: cart.updated_at,
        }
    }
}

pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Envelope<CartView>>, ApiError> {
    let cart = state.carts.get_or_create(&identity.user_id);
    Ok(Json(Envelope::data(cart.into())))
}

/// Add a product to the cart. The catalog is consulted for the live price,
/// name, stock, and active flag; the stock check covers the quantity already
/// in the cart plus the one requested.
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    request_id: RequestId,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<Json<Envelope<CartView>>, ApiError> {
    if body.quantity == 0 {
        return Err(ApiError::InvalidRequest(
            "quantity must be at least 1".to_string(),
        ));
    }

    let in_cart = state
        .carts
        .item_quantity(&identity.user_id, &body.product_id);
    let product = state
        .catalog
        .product(&body.product_id, request_id.as_str())
        .await?;

    if !product.is_active {
        return Err(ApiError::InvalidRequest(format!(
            "product {} is not available",
            product.name
        )));
    }
    let wanted = in_cart + body.quantity;
    if product.stock < wanted {
        return Err(ApiError::Unavailable(format!(
            "insufficient stock for {}: {} requested, {} available",
            product.name, wanted, product.stock
        )));
    }

    let cart = state.carts.upsert_item(
        &identity.user_id,
        CartItem {
            product_id: body.product_id,
            quantity: body.quantity,
            price: product.price,
            name: product.name,
        },
    );
    Ok(Json(Envelope::with_message(cart.into(), "item added to cart")))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(product_id): Path<String>,
    ApiJson(body): ApiJson<UpdateItemRequest>,
) -> Result<Json<Envelope<CartView>>, ApiError> {
    if body.quantity == 0 {
        return Err(ApiError::InvalidRequest(
            "quantity must be at least 1".to_string(),
        ));
    }
    let cart = state
        .carts
        .update_quantity(&identity.user_id, &product_id, body.quantity)?;
    Ok(Json(Envelope::with_message(cart.into(), "quantity updated")))
}

pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(product_id): Path<String>,
) -> Result<Json<Envelope<CartView>>, ApiError> {
    let cart = state.carts.remove_item(&identity.user_id, &product_id);
    Ok(Json(Envelope::with_message(cart.into(), "item removed")))
}

pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Envelope<CartView>>, ApiError> {
    let cart = state.carts.clear(&identity.user_id);
    Ok(Json(Envelope::with_message(cart.into(), "cart cleared")))
}

/// Checkout. Every cart line is re-validated against the live catalog before
/// anything is persisted; the order total comes from the cart's snapshot
/// prices, not the prices fetched here.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    request_id: RequestId,
) -> Result<Json<Envelope<Order>>, ApiError> {
    let cart = state
        .carts
        .get(&identity.user_id)
        .filter(|cart| !cart.items.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("cart is empty".to_string()))?;

    for item in &cart.items {
        let product = state
            .catalog
            .product(&item.product_id, request_id.as_str())
            .await?;
        if !product.is_active {
            return Err(ApiError::Unavailable(format!(
                "product {} is no longer available",
                item.name
            )));
        }
        if product.stock < item.quantity {
            return Err(ApiError::Unavailable(format!(
                "insufficient stock for {}: {} requested, {} available",
                item.name, item.quantity, product.stock
            )));
        }
    }

    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4().to_string(),
        user_id: identity.user_id.clone(),
        items: cart
            .items
            .iter()
            .map(|item| OrderItem {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                price: item.price,
            })
            .collect(),
        total_amount: cart.total(),
        status: OrderStatus::Pending,
        payment_id: None,
        created_at: now,
        updated_at: now,
    };
    state.orders.insert(order.clone());
    state.carts.clear(&identity.user_id);
    tracing::info!(
        order_id = %order.id,
        user_id = %identity.user_id,
        total = %order.total_amount,
        "order created"
    );

    Ok(Json(Envelope::with_message(order, "order created")))
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Envelope<Vec<Order>>>, ApiError> {
    Ok(Json(Envelope::data(state.orders.for_user(&identity.user_id))))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Order>>, ApiError> {
    let order = owned_order(&state, &identity, &id)?;
    Ok(Json(Envelope::data(order)))
}

pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Order>>, ApiError> {
    owned_order(&state, &identity, &id)?;
    let order = state.orders.transition(&id, OrderStatus::Cancelled, None)?;
    tracing::info!(order_id = %order.id, "order cancelled");
    Ok(Json(Envelope::with_message(order, "order cancelled")))
}

/// Settlement callback target. Carries no identity; the compare-and-set in
/// the store is what keeps repeated or conflicting callbacks harmless.
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<TransitionRequest>,
) -> Result<Json<Envelope<Order>>, ApiError> {
    if body.status == OrderStatus::Pending {
        return Err(ApiError::InvalidRequest(
            "status must be paid or cancelled".to_string(),
        ));
    }
    let order = state.orders.transition(&id, body.status, body.payment_id)?;
    tracing::info!(order_id = %order.id, status = %order.status, "order status updated");
    Ok(Json(Envelope::with_message(order, "order status updated")))
}

pub async fn health() -> Json<Envelope<Health>> {
    Json(Envelope::data(Health::ok("orders")))
}

/// Look up an order and enforce ownership. A hit owned by someone else is
/// reported as absent so order ids cannot be probed.
fn owned_order(state: &AppState, identity: &Identity, id: &str) -> Result<Order, ApiError> {
    state
        .orders
        .get(id)
        .filter(|order| order.user_id == identity.user_id)
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))
}
