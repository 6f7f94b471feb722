// src/main.rs
use pallet_layout::config::AppConfig;
use pallet_layout::{api, session};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // .env may carry RUST_LOG, so it is read before the subscriber starts
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = dotenv {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();

    tracing::info!("🚀 Pallet layout service starting...");
    let layout = &app_config.layout;
    let session = match session::spawn(layout.layout_config(), layout.frame_rate()) {
        Ok(session) => session,
        Err(err) => {
            tracing::error!("❌ Invalid layout configuration: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = api::start_api_server(app_config.api, session).await {
        tracing::error!("❌ API server terminated with an error: {err}");
        std::process::exit(1);
    }
}
