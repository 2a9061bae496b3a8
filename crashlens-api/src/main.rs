//! crashlens-api - Traffic incident monitoring service
//!
//! Lists normalized HERE traffic incidents, serves analytics summaries with
//! storage → live fallback, and a placeholder risk score per location.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crashlens_api::config::{Args, ServiceConfig};
use crashlens_api::{build_router, cors_layer, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let toml_config = crashlens_common::config::load_or_default(args.config.as_deref());

    let default_directive = toml_config
        .logging
        .level
        .clone()
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive)),
        )
        .init();

    // Build identification immediately after tracing init
    info!(
        "Starting CrashLens API (crashlens-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // The loader ran before the subscriber existed, so report its choice here
    match args
        .config
        .clone()
        .or_else(crashlens_common::config::default_config_path)
    {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file found, using environment and defaults"),
    }

    let config = ServiceConfig::resolve(args, toml_config)?;

    let state = AppState::from_config(&config).await?;
    let app = build_router(state).layer(cors_layer(&config.allowed_origins));

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
