//! Full-stack test harness for the Agora marketplace.
//!
//! Boots every service on an ephemeral port, wires them together, and talks
//! to the stack through the gateway exactly the way a client would. Also
//! home to the catalog double the orders service calls for product checks.

pub mod catalog;
pub mod client;
pub mod stack;

pub use catalog::{catalog_router, CreateProduct, ProductMap};
pub use client::{TestClient, TestRequest, TestResponse};
pub use stack::{spawn, Stack, StackConfig};
