use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use jobly_api::auth::TokenService;
use jobly_api::config;
use jobly_api::database::{DatabaseManager, PgExecutor};
use jobly_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting Jobly API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let db = Arc::new(PgExecutor::new(pool, config.database.clone()));
    let tokens = TokenService::new(&config.security.jwt_secret, config.security.jwt_expiry_hours)
        .context("SECRET_KEY must be set")?;

    let state = AppState::new(db, tokens, config.security.bcrypt_work_factor);
    let router = app(state, config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Jobly API listening on http://{}", bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
