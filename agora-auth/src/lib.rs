//! Agora identity verifier.
//!
//! Issues short-lived access tokens and longer-lived refresh tokens (HS256,
//! separate secrets, each carrying a fresh `jti`), rotates refresh tokens,
//! and keeps a self-pruning revocation list keyed by `jti`. The gateway
//! resolves every caller through this service's `GET /verify`.

pub mod claims;
pub mod handlers;
pub mod revocation;
pub mod settings;
pub mod store;
pub mod token;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

pub use claims::{Claims, TokenPair};
pub use revocation::RevocationList;
pub use settings::Settings;
pub use store::UserStore;
pub use token::TokenService;

/// Shared state for the auth service.
pub struct AppState {
    pub users: UserStore,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            users: UserStore::new(),
            tokens: TokenService::new(settings),
        }
    }
}

/// Assemble the auth router. Handed to `agora_core::serve` by the binary and
/// driven in-process by the tests.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route("/logout", post(handlers::logout))
        .route("/verify", get(handlers::verify))
        .route("/health", get(handlers::health))
        .layer(axum::middleware::from_fn(agora_core::request_id::set_request_id))
        .layer(agora_core::telemetry::trace_layer())
        .with_state(state)
}
