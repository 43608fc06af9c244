use std::sync::Arc;

use agora_auth::{AppState, Settings};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    agora_core::config::load_dotenv();
    agora_core::init_tracing();

    let settings = Settings::from_env();
    let state = Arc::new(AppState::new(&settings));

    tracing::info!(addr = %settings.bind_addr, "auth service starting");
    agora_core::serve(&settings.bind_addr, agora_auth::router(state)).await
}
