use agora_core::config::{env_or, env_parse};

/// Auth service configuration, read from the environment with defaults that
/// work for local development.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    /// HS256 secret for access tokens.
    pub access_secret: String,
    /// HS256 secret for refresh tokens. Distinct from the access secret so
    /// one token class can never pass for the other.
    pub refresh_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("AUTH_BIND_ADDR", "0.0.0.0:8001"),
            access_secret: env_or("AUTH_ACCESS_SECRET", "dev-access-secret-change-me"),
            refresh_secret: env_or("AUTH_REFRESH_SECRET", "dev-refresh-secret-change-me"),
            access_ttl_secs: env_parse("AUTH_ACCESS_TTL_SECS", 15 * 60),
            refresh_ttl_secs: env_parse("AUTH_REFRESH_TTL_SECS", 7 * 24 * 3600),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}
