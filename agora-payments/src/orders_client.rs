use std::time::Duration;

use agora_core::{
    ApiError, Envelope, Identity, REQUEST_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The slice of an order this service needs. Deserialized from the orders
/// service's wire shape; extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderSummary {
    pub id: String,
    pub user_id: String,
    pub total_amount: Decimal,
    pub status: OrderState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Pending,
    Paid,
    Cancelled,
}

impl OrderState {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::Pending => "pending",
            OrderState::Paid => "paid",
            OrderState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP client for the orders service.
#[derive(Clone)]
pub struct OrdersClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OrdersClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Fetch one order on behalf of the caller. The caller's identity headers
    /// are forwarded, so ownership is enforced by the orders service and a
    /// foreign order comes back as 404.
    pub async fn order(
        &self,
        id: &str,
        identity: &Identity,
        request_id: &str,
    ) -> Result<OrderSummary, ApiError> {
        let url = format!("{}/orders/{}", self.base_url, id);

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header(USER_ID_HEADER, &identity.user_id)
            .header(USER_ROLE_HEADER, identity.role.as_str())
            .header(REQUEST_ID_HEADER, request_id)
            .send()
            .await
            .map_err(|e| ApiError::UpstreamUnavailable(format!("orders unreachable: {e}")))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(format!("order {id} not found")));
        }
        if !resp.status().is_success() {
            return Err(ApiError::UpstreamUnavailable(format!(
                "orders returned {}",
                resp.status()
            )));
        }

        let envelope = resp
            .json::<Envelope<OrderSummary>>()
            .await
            .map_err(|e| ApiError::UpstreamUnavailable(format!("invalid orders response: {e}")))?;
        envelope.data.ok_or_else(|| {
            ApiError::UpstreamUnavailable("orders response carried no order".to_string())
        })
    }

    /// Report a settlement outcome. Any failure surfaces as
    /// `UpstreamUnavailable`; the caller decides whether that is fatal.
    pub async fn set_status(
        &self,
        id: &str,
        status: OrderState,
        payment_id: &str,
        request_id: &str,
    ) -> Result<(), ApiError> {
        let url = format!("{}/orders/{}/status", self.base_url, id);

        let resp = self
            .client
            .put(&url)
            .timeout(self.timeout)
            .header(REQUEST_ID_HEADER, request_id)
            .json(&json!({ "status": status, "payment_id": payment_id }))
            .send()
            .await
            .map_err(|e| ApiError::UpstreamUnavailable(format!("orders unreachable: {e}")))?;

        if !resp.status().is_success() {
            return Err(ApiError::UpstreamUnavailable(format!(
                "orders returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
