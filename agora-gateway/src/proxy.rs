use std::sync::Arc;

use agora_core::{ApiError, RequestId, REQUEST_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, Method};

use crate::routes::is_public;
use crate::verify::VerifiedUser;
use crate::AppState;

/// Fallback handler: everything that is not the gateway's own `/health`
/// lands here and is relayed to a downstream service.
///
/// Protected paths are resolved to an identity first; the downstream then
/// sees the trusted `X-User-Id` / `X-User-Role` pair instead of a token.
/// Caller-supplied values for those headers are dropped unconditionally.
pub async fn proxy(
    State(state): State<Arc<AppState>>,
    request_id: RequestId,
    req: Request,
) -> Result<Response, ApiError> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();

    let mut url = state
        .routes
        .resolve(&path)
        .ok_or_else(|| ApiError::NotFound(format!("no route for {path}")))?;
    if let Some(query) = parts.uri.query() {
        url = format!("{url}?{query}");
    }

    let identity = if is_public(&parts.method, &path) {
        None
    } else {
        let token = bearer_token(&parts.headers)?;
        Some(state.verifier.verify(token, request_id.as_str()).await?)
    };

    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("unreadable request body: {e}")))?;

    relay(
        &state,
        parts.method,
        url,
        &parts.headers,
        body,
        identity.as_ref(),
        &request_id,
    )
    .await
}

async fn relay(
    state: &AppState,
    method: Method,
    url: String,
    headers: &HeaderMap,
    body: Bytes,
    identity: Option<&VerifiedUser>,
    request_id: &RequestId,
) -> Result<Response, ApiError> {
    let mut forwarded = HeaderMap::new();
    for (name, value) in headers.iter() {
        if is_hop_by_hop(name) || is_trusted_identity(name) {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        forwarded.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    if let Some(user) = identity {
        let sub = HeaderValue::from_str(&user.sub)
            .map_err(|_| ApiError::Internal("subject is not header-safe".to_string()))?;
        forwarded.insert(HeaderName::from_static(USER_ID_HEADER), sub);
        forwarded.insert(
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderValue::from_static(user.role.as_str()),
        );
    }

    tracing::debug!(method = %method, url = %url, "relaying");
    let resp = state
        .http
        .request(method, &url)
        .timeout(state.upstream_timeout)
        .headers(forwarded)
        .body(body)
        .send()
        .await
        .map_err(|e| ApiError::UpstreamUnavailable(format!("downstream unreachable: {e}")))?;

    let status = resp.status();
    let resp_headers = resp.headers().clone();
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| ApiError::UpstreamUnavailable(format!("downstream body failed: {e}")))?;

    let mut builder = Response::builder().status(status);
    if let Some(out) = builder.headers_mut() {
        for (name, value) in resp_headers.iter() {
            if is_hop_by_hop(name) {
                continue;
            }
            out.append(name.clone(), value.clone());
        }
    }
    builder
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Internal(format!("response assembly failed: {e}")))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthenticated("missing bearer token".to_string()))
}

/// Headers that describe one hop, not the request, and must not cross it.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    *name == HOST || *name == CONTENT_LENGTH || *name == CONNECTION || *name == TRANSFER_ENCODING
}

fn is_trusted_identity(name: &HeaderName) -> bool {
    name.as_str() == USER_ID_HEADER || name.as_str() == USER_ROLE_HEADER
}
