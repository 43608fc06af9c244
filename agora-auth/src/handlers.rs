use std::sync::Arc;

use agora_core::health::Health;
use agora_core::{ApiError, ApiJson, Envelope, Role};
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::claims::TokenPair;
use crate::store::UserRecord;
use crate::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct UserOut {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl From<&UserRecord> for UserOut {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            email: record.email.clone(),
            role: record.role,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Claims as reported to callers of `GET /verify`. The gateway reads `sub`
/// and `role` from this to fill the trusted identity headers.
#[derive(Serialize, Deserialize)]
pub struct TokenInfo {
    pub sub: String,
    pub role: Role,
    pub jti: String,
    pub exp: u64,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<Json<Envelope<UserOut>>, ApiError> {
    if !body.email.contains('@') {
        return Err(ApiError::InvalidRequest("invalid email address".to_string()));
    }
    check_password_strength(&body.password)?;

    let record = state
        .users
        .create(
            body.email,
            body.password,
            body.role,
            body.full_name.unwrap_or_default(),
        )
        .await?;
    tracing::info!(user_id = %record.id, role = %record.role, "account registered");

    Ok(Json(Envelope::with_message(
        UserOut::from(&record),
        "registration successful",
    )))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<Envelope<TokenPair>>, ApiError> {
    let record = state
        .users
        .verify_credentials(&body.email, &body.password)
        .await?;
    let pair = state.tokens.issue(&record.id, record.role)?;
    tracing::info!(user_id = %record.id, "login");

    Ok(Json(Envelope::with_message(pair, "login successful")))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> Result<Json<Envelope<TokenPair>>, ApiError> {
    let pair = state.tokens.refresh(&body.refresh_token)?;
    Ok(Json(Envelope::with_message(pair, "token refreshed")))
}

/// Revokes the presented access token and, when it still verifies, the
/// refresh token from the body. A refresh token that is already expired or
/// rotated needs no list entry; verification rejects it on its own.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<LogoutRequest>,
) -> Result<Json<Envelope<serde_json::Value>>, ApiError> {
    let claims = state.tokens.verify_access(bearer_token(&headers)?)?;
    state.tokens.revoke(&claims);

    if let Ok(refresh_claims) = state.tokens.verify_refresh(&body.refresh_token) {
        state.tokens.revoke(&refresh_claims);
    }
    tracing::info!(user_id = %claims.sub, "logout");

    Ok(Json(Envelope::message("logged out")))
}

pub async fn verify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Envelope<TokenInfo>>, ApiError> {
    let claims = state.tokens.verify_access(bearer_token(&headers)?)?;
    Ok(Json(Envelope::data(TokenInfo {
        sub: claims.sub,
        role: claims.role,
        jti: claims.jti,
        exp: claims.exp,
    })))
}

pub async fn health() -> Json<Envelope<Health>> {
    Json(Envelope::data(Health::ok("auth")))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthenticated("missing bearer token".to_string()))
}

fn check_password_strength(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::InvalidRequest(
            "password must be at least 8 characters long".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ApiError::InvalidRequest(
            "password must contain an upper case letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ApiError::InvalidRequest(
            "password must contain a lower case letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ApiError::InvalidRequest(
            "password must contain a digit".to_string(),
        ));
    }
    Ok(())
}
