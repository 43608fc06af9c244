//! Environment-driven configuration helpers.
//!
//! Every service carries a `Settings` struct built from environment
//! variables with sensible defaults, so a bare `cargo run` works and a
//! deployment overrides only what differs. `.env` files are honoured via
//! [`load_dotenv`].

/// Load a `.env` file from the working directory if present. Missing files
/// are not an error.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Read an environment variable, falling back to `default` when unset or
/// empty.
pub fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// Read and parse an environment variable, falling back to `default` when
/// unset or unparseable. A malformed value logs a warning rather than
/// aborting startup.
pub fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) if !raw.is_empty() => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "unparseable env value, using default");
                default
            }
        },
        _ => default,
    }
}
