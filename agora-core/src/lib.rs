//! Shared kernel for the Agora marketplace services.
//!
//! Every service crate (auth, orders, payments, gateway) depends on this one
//! for the pieces that must agree across service boundaries:
//!
//! - [`ApiError`]: the error taxonomy, mapped to HTTP status codes and
//!   serialized as the failure envelope.
//! - [`Envelope`]: the `{success, data, message}` response wrapper shared by
//!   all public endpoints.
//! - [`Identity`]: the trusted-header identity injected by the gateway and
//!   consumed by downstream services.
//! - [`request_id`]: `X-Request-Id` propagation so a checkout can be traced
//!   across the auth, orders, and payments logs.

pub mod config;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod health;
pub mod request_id;
pub mod serve;
pub mod telemetry;

pub use envelope::Envelope;
pub use error::ApiError;
pub use extract::{ApiJson, Identity, Role, USER_ID_HEADER, USER_ROLE_HEADER};
pub use request_id::{RequestId, REQUEST_ID_HEADER};
pub use serve::serve;
pub use telemetry::init_tracing;
