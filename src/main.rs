use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use barbershop::config::AppConfig;
use barbershop::db;
use barbershop::routes;
use barbershop::services::messaging::eskiz::EskizSmsProvider;
use barbershop::services::messaging::telegram::TelegramNotifier;
use barbershop::services::places::google::GooglePlacesClient;
use barbershop::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if config.eskiz_token.is_empty() {
        tracing::warn!("ESKIZ_TOKEN not set, OTP codes will not be texted");
    }
    if config.telegram_bot_token.is_empty() || config.telegram_chat_id.is_empty() {
        tracing::warn!("Telegram bot not configured, registration notifications disabled");
    }
    if config.google_places_api_key.is_empty() {
        tracing::warn!("GOOGLE_PLACES_API_KEY not set, places endpoints will fail");
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        sms: Box::new(EskizSmsProvider::new(
            config.eskiz_token.clone(),
            config.eskiz_sender.clone(),
        )),
        chat: Box::new(TelegramNotifier::new(
            config.telegram_bot_token.clone(),
            config.telegram_chat_id.clone(),
        )),
        places: Box::new(GooglePlacesClient::new(
            config.google_places_api_key.clone(),
        )),
        config: config.clone(),
    });

    let app = routes::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
