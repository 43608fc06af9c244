use serde::{Deserialize, Serialize};

/// Minimal health payload served by every service at `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub service: String,
    pub status: String,
}

impl Health {
    pub fn ok(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            status: "ok".into(),
        }
    }
}
