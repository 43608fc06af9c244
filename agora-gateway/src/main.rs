use std::sync::Arc;

use agora_gateway::{AppState, Settings};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    agora_core::config::load_dotenv();
    agora_core::init_tracing();

    let settings = Settings::from_env();
    let state = Arc::new(AppState::new(&settings));

    tracing::info!(
        addr = %settings.bind_addr,
        auth = %settings.auth_url,
        catalog = %settings.catalog_url,
        orders = %settings.orders_url,
        payments = %settings.payments_url,
        "gateway starting"
    );
    agora_core::serve(&settings.bind_addr, agora_gateway::router(state)).await
}
