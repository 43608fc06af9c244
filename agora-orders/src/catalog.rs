use std::time::Duration;

use agora_core::{ApiError, Envelope, REQUEST_ID_HEADER};

use crate::model::Product;

/// HTTP client for the product catalog service.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Fetch one product. 404 maps to `NotFound`; a timeout, connection
    /// failure, or non-success status maps to `UpstreamUnavailable`.
    pub async fn product(&self, id: &str, request_id: &str) -> Result<Product, ApiError> {
        let url = format!("{}/products/{}", self.base_url, id);

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header(REQUEST_ID_HEADER, request_id)
            .send()
            .await
            .map_err(|e| ApiError::UpstreamUnavailable(format!("catalog unreachable: {e}")))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(format!("product {id} not found")));
        }
        if !resp.status().is_success() {
            return Err(ApiError::UpstreamUnavailable(format!(
                "catalog returned {}",
                resp.status()
            )));
        }

        let envelope = resp
            .json::<Envelope<Product>>()
            .await
            .map_err(|e| ApiError::UpstreamUnavailable(format!("invalid catalog response: {e}")))?;
        envelope.data.ok_or_else(|| {
            ApiError::UpstreamUnavailable("catalog response carried no product".to_string())
        })
    }
}
