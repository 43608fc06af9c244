use std::time::Duration;

use agora_core::envelope::ErrorBody;
use agora_core::{ApiError, Envelope, Role, REQUEST_ID_HEADER};
use http::header::AUTHORIZATION;
use serde::Deserialize;

/// Claims the gateway needs from the identity verifier.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedUser {
    pub sub: String,
    pub role: Role,
}

/// Client for the identity verifier's `GET /verify`.
///
/// The two failure modes stay distinct: a verifier that answers 401 means
/// the caller is not allowed (`Unauthenticated`), a verifier that cannot
/// be reached means we cannot tell (`UpstreamUnavailable`).
#[derive(Clone)]
pub struct VerifyClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl VerifyClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    pub async fn verify(&self, token: &str, request_id: &str) -> Result<VerifiedUser, ApiError> {
        let url = format!("{}/verify", self.base_url);

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(REQUEST_ID_HEADER, request_id)
            .send()
            .await
            .map_err(|e| {
                ApiError::UpstreamUnavailable(format!("identity verifier unreachable: {e}"))
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            let detail = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.details)
                .and_then(|details| details.as_str().map(str::to_string))
                .unwrap_or_else(|| "invalid token".to_string());
            return Err(ApiError::Unauthenticated(detail));
        }
        if !status.is_success() {
            return Err(ApiError::UpstreamUnavailable(format!(
                "identity verifier returned {status}"
            )));
        }

        let envelope = resp
            .json::<Envelope<VerifiedUser>>()
            .await
            .map_err(|e| {
                ApiError::UpstreamUnavailable(format!("invalid verifier response: {e}"))
            })?;
        envelope.data.ok_or_else(|| {
            ApiError::UpstreamUnavailable("verifier response carried no claims".to_string())
        })
    }
}
