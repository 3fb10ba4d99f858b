mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use sweep_api::auth::{AppState, AppStateInner};
use sweep_api::platform::LocalPlatform;
use sweep_engine::PurgeEngine;
use sweep_types::SnowflakeGenerator;

use crate::config::{Config, DEV_JWT_SECRET};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sweep=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.jwt_secret == DEV_JWT_SECRET {
        warn!("SWEEP_JWT_SECRET not set, using the development secret");
    }
    if config.operators.is_empty() {
        warn!("SWEEP_OPERATORS is empty, nobody can run purges");
    }

    // Init database
    let db = Arc::new(sweep_db::Database::open(&PathBuf::from(&config.db_path))?);

    // Flags are in-memory and start empty on every boot
    let engine = PurgeEngine::with_defaults(
        Arc::new(LocalPlatform::new(db.clone())),
        config.purge.clone(),
    );

    let state: AppState = Arc::new(AppStateInner {
        db,
        engine,
        ids: SnowflakeGenerator::new(),
        jwt_secret: config.jwt_secret.clone(),
        operators: config.operators.clone(),
        command_prefix: config.command_prefix.clone(),
    });

    let app = sweep_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        "Sweep server listening on {} ({} operators, history limit {})",
        addr,
        config.operators.len(),
        config.purge.history_limit
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
