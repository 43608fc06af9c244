use agora_core::config::{env_or, env_parse};

/// Gateway configuration: where to bind and where each downstream lives.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub auth_url: String,
    pub catalog_url: String,
    pub orders_url: String,
    pub payments_url: String,
    /// Per-request timeout for forwarded calls, in seconds.
    pub upstream_timeout_secs: u64,
    /// Timeout for each downstream health probe, in seconds.
    pub probe_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("GATEWAY_BIND_ADDR", "0.0.0.0:8000"),
            auth_url: env_or("AUTH_URL", "http://127.0.0.1:8001"),
            catalog_url: env_or("CATALOG_URL", "http://127.0.0.1:8002"),
            orders_url: env_or("ORDERS_URL", "http://127.0.0.1:8003"),
            payments_url: env_or("PAYMENTS_URL", "http://127.0.0.1:8004"),
            upstream_timeout_secs: env_parse("UPSTREAM_TIMEOUT_SECS", 10),
            probe_timeout_secs: env_parse("HEALTH_PROBE_TIMEOUT_SECS", 2),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}
