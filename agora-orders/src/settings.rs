use agora_core::config::{env_or, env_parse};

/// Orders service configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    /// Base URL of the product catalog service.
    pub catalog_url: String,
    /// Per-request timeout for catalog calls, in seconds.
    pub upstream_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("ORDERS_BIND_ADDR", "0.0.0.0:8003"),
            catalog_url: env_or("CATALOG_URL", "http://127.0.0.1:8002"),
            upstream_timeout_secs: env_parse("UPSTREAM_TIMEOUT_SECS", 5),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}
