use std::sync::Arc;

use axum::Router;
use dashmap::DashMap;

use crate::catalog::{catalog_router, ProductMap};
use crate::client::TestClient;

/// Bind a router on an ephemeral local port and serve it for the rest of
/// the test process.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test app");
    });
    format!("http://{addr}")
}

/// Knobs a scenario can turn before boot.
#[derive(Debug, Clone)]
pub struct StackConfig {
    /// Settlement success probability handed to the payments simulator.
    pub payment_success_rate: f64,
    /// Fixed simulator seed so scenarios replay identically.
    pub payment_seed: u64,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            payment_success_rate: 1.0,
            payment_seed: 42,
        }
    }
}

/// The whole marketplace on ephemeral ports, entered through the gateway.
pub struct Stack {
    pub gateway_url: String,
    pub auth_url: String,
    pub catalog_url: String,
    pub orders_url: String,
    pub payments_url: String,
    /// Direct handle on the catalog double's products.
    pub products: ProductMap,
}

impl Stack {
    /// Boot auth, catalog, orders, payments, and the gateway, wired to one
    /// another.
    pub async fn start(config: StackConfig) -> Self {
        let auth_settings = agora_auth::Settings {
            bind_addr: "127.0.0.1:0".into(),
            access_secret: "stack-access-secret".into(),
            refresh_secret: "stack-refresh-secret".into(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 3600,
        };
        let auth_url = spawn(agora_auth::router(Arc::new(agora_auth::AppState::new(
            &auth_settings,
        ))))
        .await;

        let products: ProductMap = Arc::new(DashMap::new());
        let catalog_url = spawn(catalog_router(products.clone())).await;

        let orders_settings = agora_orders::Settings {
            bind_addr: "127.0.0.1:0".into(),
            catalog_url: catalog_url.clone(),
            upstream_timeout_secs: 2,
        };
        let orders_url = spawn(agora_orders::router(Arc::new(agora_orders::AppState::new(
            &orders_settings,
        ))))
        .await;

        let payments_settings = agora_payments::Settings {
            bind_addr: "127.0.0.1:0".into(),
            orders_url: orders_url.clone(),
            success_rate: config.payment_success_rate,
            latency_ms: 0,
            rng_seed: Some(config.payment_seed),
            upstream_timeout_secs: 2,
        };
        let payments_url = spawn(agora_payments::router(Arc::new(
            agora_payments::AppState::new(&payments_settings),
        )))
        .await;

        let gateway_settings = agora_gateway::Settings {
            bind_addr: "127.0.0.1:0".into(),
            auth_url: auth_url.clone(),
            catalog_url: catalog_url.clone(),
            orders_url: orders_url.clone(),
            payments_url: payments_url.clone(),
            upstream_timeout_secs: 2,
            probe_timeout_secs: 1,
        };
        let gateway_url = spawn(agora_gateway::router(Arc::new(
            agora_gateway::AppState::new(&gateway_settings),
        )))
        .await;

        Self {
            gateway_url,
            auth_url,
            catalog_url,
            orders_url,
            payments_url,
            products,
        }
    }

    /// Client pointed at the gateway, the way real callers come in.
    pub fn client(&self) -> TestClient {
        TestClient::new(self.gateway_url.clone())
    }
}
