mod auth;
mod config;
mod error;
mod handlers;
mod phone;
mod provider;
mod types;

use std::sync::Arc;

use anyhow::Context;
use envconfig::Envconfig;
use log::{info, warn};
use tower_http::cors::CorsLayer;

use config::RelayConfig;
use handlers::AppState;
use provider::TwilioClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let config = RelayConfig::init_from_env().context("failed to load relay configuration")?;

    if config.function_secret().is_none() {
        warn!("RETELL_FUNCTION_SECRET is not set; every send-sms request will be rejected");
    }
    if let Err(missing) = config.twilio_credentials() {
        warn!("{}", missing);
    }

    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let provider = Arc::new(TwilioClient::new(http, config.twilio_api_base_url.clone()));

    let addr = config.bind_addr();
    let cors_permissive = config.cors_permissive;
    let state = Arc::new(AppState { config, provider });

    let mut app = handlers::routes(state);
    if cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
