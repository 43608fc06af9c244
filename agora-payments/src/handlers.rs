use std::sync::Arc;

use agora_core::health::Health;
use agora_core::{ApiError, ApiJson, Envelope, Identity, RequestId};
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::model::{Payment, PaymentMethod, PaymentStatus};
use crate::orders_client::OrderState;
use crate::AppState;

#[derive(Deserialize)]
pub struct ProcessRequest {
    pub order_id: String,
    pub method: PaymentMethod,
}

/// Settle an order. At most one payment record ever exists per order; a
/// repeat call returns the original record and performs no side effects.
pub async fn process(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    request_id: RequestId,
    ApiJson(body): ApiJson<ProcessRequest>,
) -> Result<Json<Envelope<Payment>>, ApiError> {
    // Fast path for repeats; the insert below closes the race window this
    // check leaves open.
    if let Some(existing) = state.payments.by_order(&body.order_id) {
        tracing::info!(order_id = %body.order_id, payment_id = %existing.id, "repeat settlement request");
        return Ok(Json(Envelope::with_message(
            existing,
            "payment already processed",
        )));
    }

    let order = state
        .orders
        .order(&body.order_id, &identity, request_id.as_str())
        .await?;
    if order.status != OrderState::Pending {
        // A concurrent settlement may have flipped the order between the
        // gate above and this fetch; its record satisfies the caller.
        if let Some(existing) = state.payments.by_order(&body.order_id) {
            return Ok(Json(Envelope::with_message(
                existing,
                "payment already processed",
            )));
        }
        return Err(ApiError::InvalidTransition(format!(
            "order is {} and cannot be settled",
            order.status
        )));
    }

    let success = state.simulator.settle().await;

    let now = Utc::now();
    let payment = Payment {
        id: Uuid::new_v4().to_string(),
        order_id: body.order_id.clone(),
        user_id: identity.user_id.clone(),
        amount: order.total_amount,
        status: if success {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Failed
        },
        transaction_id: format!("txn_{}", Uuid::new_v4().simple()),
        method: body.method,
        processed_at: now,
        created_at: now,
    };

    let (stored, inserted) = state.payments.insert_unique(payment);
    if !inserted {
        // A concurrent settlement won the insert; its record stands and it
        // owns the callback.
        tracing::info!(order_id = %stored.order_id, payment_id = %stored.id, "lost settlement race");
        return Ok(Json(Envelope::with_message(
            stored,
            "payment already processed",
        )));
    }

    // Best-effort callback. A failure leaves the order pending and is only
    // logged; there is no retry.
    let target = match stored.status {
        PaymentStatus::Completed => OrderState::Paid,
        PaymentStatus::Failed => OrderState::Cancelled,
    };
    if let Err(err) = state
        .orders
        .set_status(&stored.order_id, target, &stored.id, request_id.as_str())
        .await
    {
        tracing::warn!(
            order_id = %stored.order_id,
            payment_id = %stored.id,
            error = %err,
            "order status callback failed"
        );
    }

    tracing::info!(
        payment_id = %stored.id,
        order_id = %stored.order_id,
        status = %stored.status,
        amount = %stored.amount,
        "payment processed"
    );
    Ok(Json(Envelope::with_message(stored, "payment processed")))
}

pub async fn by_order(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(order_id): Path<String>,
) -> Result<Json<Envelope<Payment>>, ApiError> {
    state
        .payments
        .by_order(&order_id)
        .filter(|payment| payment.user_id == identity.user_id)
        .map(|payment| Json(Envelope::data(payment)))
        .ok_or_else(|| ApiError::NotFound(format!("no payment for order {order_id}")))
}

pub async fn health() -> Json<Envelope<Health>> {
    Json(Envelope::data(Health::ok("payments")))
}
