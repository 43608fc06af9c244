use std::sync::Arc;

use agora_payments::{AppState, Settings};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    agora_core::config::load_dotenv();
    agora_core::init_tracing();

    let settings = Settings::from_env();
    let state = Arc::new(AppState::new(&settings));

    tracing::info!(
        addr = %settings.bind_addr,
        orders = %settings.orders_url,
        success_rate = settings.success_rate,
        "payments service starting"
    );
    agora_core::serve(&settings.bind_addr, agora_payments::router(state)).await
}
