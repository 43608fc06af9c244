use agora_core::config::{env_or, env_parse};

/// Payments service configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    /// Base URL of the orders service.
    pub orders_url: String,
    /// Probability that a settlement succeeds.
    pub success_rate: f64,
    /// Simulated provider latency per settlement.
    pub latency_ms: u64,
    /// Fixed RNG seed; unset draws from entropy.
    pub rng_seed: Option<u64>,
    /// Per-request timeout for orders calls, in seconds.
    pub upstream_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("PAYMENTS_BIND_ADDR", "0.0.0.0:8004"),
            orders_url: env_or("ORDERS_URL", "http://127.0.0.1:8003"),
            success_rate: env_parse("PAYMENT_SUCCESS_RATE", 0.9),
            latency_ms: env_parse("PAYMENT_LATENCY_MS", 100),
            rng_seed: seed_from_env(),
            upstream_timeout_secs: env_parse("UPSTREAM_TIMEOUT_SECS", 5),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}

fn seed_from_env() -> Option<u64> {
    match std::env::var("PAYMENT_RNG_SEED") {
        Ok(raw) if !raw.is_empty() => match raw.parse() {
            Ok(seed) => Some(seed),
            Err(_) => {
                tracing::warn!(value = %raw, "unparseable PAYMENT_RNG_SEED, using entropy");
                None
            }
        },
        _ => None,
    }
}
