use std::collections::BTreeMap;
use std::sync::Arc;

use agora_core::Envelope;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayHealth {
    pub service: String,
    pub status: String,
    pub dependencies: BTreeMap<String, String>,
}

/// Aggregated health: probes every downstream `/health` with a short
/// timeout. Answers 200 regardless so the report itself stays reachable;
/// a failing dependency flips `status` to `degraded`.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Envelope<GatewayHealth>> {
    let (auth, catalog, orders, payments) = tokio::join!(
        probe(&state, &state.probes.auth),
        probe(&state, &state.probes.catalog),
        probe(&state, &state.probes.orders),
        probe(&state, &state.probes.payments),
    );

    let mut dependencies = BTreeMap::new();
    dependencies.insert("auth".to_string(), auth);
    dependencies.insert("catalog".to_string(), catalog);
    dependencies.insert("orders".to_string(), orders);
    dependencies.insert("payments".to_string(), payments);

    let status = if dependencies.values().all(|s| s == "ok") {
        "ok"
    } else {
        "degraded"
    };

    Json(Envelope::data(GatewayHealth {
        service: "gateway".to_string(),
        status: status.to_string(),
        dependencies,
    }))
}

async fn probe(state: &AppState, base_url: &str) -> String {
    let url = format!("{base_url}/health");
    match state.http.get(&url).timeout(state.probe_timeout).send().await {
        Ok(resp) if resp.status().is_success() => "ok".to_string(),
        Ok(resp) => format!("error: {}", resp.status()),
        Err(_) => "unreachable".to_string(),
    }
}
