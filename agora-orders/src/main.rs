use std::sync::Arc;

use agora_orders::{AppState, Settings};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    agora_core::config::load_dotenv();
    agora_core::init_tracing();

    let settings = Settings::from_env();
    let state = Arc::new(AppState::new(&settings));

    tracing::info!(
        addr = %settings.bind_addr,
        catalog = %settings.catalog_url,
        "orders service starting"
    );
    agora_core::serve(&settings.bind_addr, agora_orders::router(state)).await
}
