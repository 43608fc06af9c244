//! Request ID middleware: propagates or generates a correlation identifier.
//!
//! 1. Reads `X-Request-Id` from the incoming request; if absent, generates a
//!    UUID v4.
//! 2. Stores the ID as a request extension (extractable in handlers).
//! 3. Copies the ID into the response `X-Request-Id` header.
//!
//! Client wrappers forward the same ID on downstream calls so one checkout
//! shows up under one identifier in all four service logs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue};
use axum::response::Response;

/// Correlation header name, shared by the gateway and the service clients.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

static X_REQUEST_ID: HeaderName = HeaderName::from_static(REQUEST_ID_HEADER);

/// A request identifier, either propagated from the incoming `X-Request-Id`
/// header or generated as a UUID v4.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId(uuid::Uuid::new_v4().to_string()));
        Ok(id)
    }
}

/// Middleware function that injects the request ID. Install with
/// `axum::middleware::from_fn(request_id::set_request_id)`.
pub async fn set_request_id(
    mut req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let id = req
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let request_id = RequestId(id);
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&request_id.0) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), val);
    }

    response
}
