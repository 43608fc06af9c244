use std::sync::Arc;

use agora_core::ApiError;
use chrono::Utc;
use dashmap::DashMap;

use crate::model::{Cart, CartItem, Order, OrderStatus};

/// Carts keyed by user id. Multi-step mutations hold the map entry for the
/// duration of the change, so each cart update is atomic per user.
#[derive(Clone, Default)]
pub struct CartStore {
    inner: Arc<DashMap<String, Cart>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the user's cart, creating an empty one on first touch.
    pub fn get_or_create(&self, user_id: &str) -> Cart {
        self.inner
            .entry(user_id.to_string())
            .or_insert_with(|| Cart::empty(user_id))
            .clone()
    }

    pub fn get(&self, user_id: &str) -> Option<Cart> {
        self.inner.get(user_id).map(|cart| cart.clone())
    }

    pub fn item_quantity(&self, user_id: &str, product_id: &str) -> u32 {
        self.inner
            .get(user_id)
            .map(|cart| cart.quantity_of(product_id))
            .unwrap_or(0)
    }

    /// Add a line, or fold it into an existing line for the same product.
    /// Folding accumulates the quantity and refreshes the price and name
    /// snapshots to the values just fetched from the catalog.
    pub fn upsert_item(&self, user_id: &str, item: CartItem) -> Cart {
        let mut entry = self
            .inner
            .entry(user_id.to_string())
            .or_insert_with(|| Cart::empty(user_id));
        let cart = entry.value_mut();
        match cart
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            Some(line) => {
                line.quantity += item.quantity;
                line.price = item.price;
                line.name = item.name;
            }
            None => cart.items.push(item),
        }
        cart.updated_at = Utc::now();
        cart.clone()
    }

    /// Set a line's quantity outright. The line must already exist.
    pub fn update_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let mut entry = self
            .inner
            .entry(user_id.to_string())
            .or_insert_with(|| Cart::empty(user_id));
        let cart = entry.value_mut();
        match cart
            .items
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            Some(line) => {
                line.quantity = quantity;
                cart.updated_at = Utc::now();
                Ok(cart.clone())
            }
            None => Err(ApiError::NotFound(format!(
                "product {product_id} is not in the cart"
            ))),
        }
    }

    /// Drop a line. Removing a product that is not in the cart is a no-op.
    pub fn remove_item(&self, user_id: &str, product_id: &str) -> Cart {
        let mut entry = self
            .inner
            .entry(user_id.to_string())
            .or_insert_with(|| Cart::empty(user_id));
        let cart = entry.value_mut();
        cart.items.retain(|line| line.product_id != product_id);
        cart.updated_at = Utc::now();
        cart.clone()
    }

    /// Empty the cart but keep the row, so the next read still finds it.
    pub fn clear(&self, user_id: &str) -> Cart {
        let mut entry = self
            .inner
            .entry(user_id.to_string())
            .or_insert_with(|| Cart::empty(user_id));
        let cart = entry.value_mut();
        cart.items.clear();
        cart.updated_at = Utc::now();
        cart.clone()
    }
}

/// Orders keyed by order id.
#[derive(Clone, Default)]
pub struct OrderStore {
    inner: Arc<DashMap<String, Order>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: Order) {
        self.inner.insert(order.id.clone(), order);
    }

    pub fn get(&self, id: &str) -> Option<Order> {
        self.inner.get(id).map(|order| order.clone())
    }

    /// All orders for a user, newest first.
    pub fn for_user(&self, user_id: &str) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .inner
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Compare-and-set status change. The read of the current status and the
    /// write of the new one happen under the entry guard; when transitions
    /// race on one order, only one sees `Pending` and succeeds.
    ///
    /// Only `Pending` orders move; a terminal current status or a `Pending`
    /// target is an `InvalidTransition`.
    pub fn transition(
        &self,
        id: &str,
        to: OrderStatus,
        payment_id: Option<String>,
    ) -> Result<Order, ApiError> {
        let mut entry = self
            .inner
            .get_mut(id)
            .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;
        let order = entry.value_mut();

        if to == OrderStatus::Pending {
            return Err(ApiError::InvalidTransition(
                "orders cannot return to pending".to_string(),
            ));
        }
        if order.status.is_terminal() {
            return Err(ApiError::InvalidTransition(format!(
                "order is {} and cannot move to {}",
                order.status, to
            )));
        }

        order.status = to;
        if payment_id.is_some() {
            order.payment_id = payment_id;
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}
