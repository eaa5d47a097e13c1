mod config;
mod credentials;
mod db;
mod domain;
mod error;
mod forms;
mod state;
mod web;

use crate::db::seed;
use crate::state::SharedState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::load()?;
    tracing::debug!(
        "mail relay {}:{}, uploads to {} (max {} bytes)",
        config.mail.server,
        config.mail.port,
        config.upload.dir,
        config.upload.max_bytes
    );

    tracing::info!("connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!("failed to connect to database: {e}");
            e
        })?;

    tracing::info!("running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("failed to run database migrations: {e}");
        e
    })?;

    seed::seed_bootstrap_admin(&pool, &config.seed_admin_password).await?;

    let session_key = config.secret_key.as_bytes().to_vec();
    let shared: SharedState = Arc::new(state::AppState { pool, session_key });

    let app = web::routes(shared).layer(TraceLayer::new_for_http());

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
