//! Request extractors shared by the downstream services.
//!
//! The gateway is the only component that sees bearer tokens. After verifying
//! one it injects the resolved subject and role as the trusted headers
//! [`USER_ID_HEADER`] / [`USER_ROLE_HEADER`] and strips any caller-supplied
//! values for the same names, so a service behind the gateway can take the
//! headers at face value.

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Trusted header carrying the authenticated subject id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Trusted header carrying the authenticated role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Marketplace roles, matching the accepted set at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Vendor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Vendor => "vendor",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "vendor" => Ok(Role::Vendor),
            other => Err(ApiError::InvalidRequest(format!("unknown role: {other}"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller identity resolved by the gateway.
///
/// Fails with `Unauthenticated` when the trusted headers are absent, which
/// means the request did not come through the gateway's verification step.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)?;
        let role = header_value(parts, USER_ROLE_HEADER)?
            .parse::<Role>()
            .map_err(|_| ApiError::Unauthenticated("invalid identity headers".into()))?;
        Ok(Identity { user_id, role })
    }
}

fn header_value(parts: &Parts, name: &str) -> Result<String, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            tracing::debug!(uri = %parts.uri, header = name, "missing identity header");
            ApiError::Unauthenticated("missing identity headers".into())
        })
}

/// JSON body extractor that reports rejections through the failure envelope.
///
/// `axum::Json` replies to malformed bodies with a plain-text 4xx; wrapping it
/// keeps the error contract uniform across all endpoints.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::InvalidRequest(rejection.body_text())),
        }
    }
}
