use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::model::Payment;

/// Payments keyed by order id, at most one per order.
#[derive(Clone, Default)]
pub struct PaymentStore {
    inner: Arc<DashMap<String, Payment>>,
}

impl PaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_order(&self, order_id: &str) -> Option<Payment> {
        self.inner.get(order_id).map(|p| p.clone())
    }

    /// Store a payment unless the order already has one. The existence check
    /// and the insert share the entry lock, so when two settlements race the
    /// loser gets the winner's record back and its own is discarded. Returns
    /// the stored record and whether this call inserted it.
    pub fn insert_unique(&self, payment: Payment) -> (Payment, bool) {
        match self.inner.entry(payment.order_id.clone()) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(slot) => {
                let stored = slot.insert(payment);
                (stored.clone(), true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
