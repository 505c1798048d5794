//! HTTP server for the Sobremesa site and its admin dashboard.

pub mod config;
pub mod error;
pub mod middleware;
pub mod render;
pub mod routes;
pub mod state;

use std::path::Path;

use axum::Router;
use sobremesa_core::store::{parse_ndjson, PgStore};
use sobremesa_core::Store;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::state::AppState;

/// Router with every route group and the tracing and CORS layers.
pub fn build_app(state: AppState) -> Router {
    routes::build_router(state)
        .layer(middleware::request_tracing::trace_layer())
        .layer(middleware::cors::cors_layer())
}

/// Postgres when `DATABASE_URL` is set (migrations applied), otherwise the
/// in-memory store loaded from `SEED_FILE`.
pub async fn build_store(config: &AppConfig) -> anyhow::Result<Store> {
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .min_connections(config.db_min_connections)
                .connect(url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;
            tracing::info!("Connected to PostgreSQL");

            sqlx::migrate!("../../migrations")
                .run(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
            tracing::info!("Database migrations applied");

            Ok(Store::Postgres(PgStore::new(pool, config.dataset.clone())))
        }
        None => {
            let store = Store::memory();
            if let Some(path) = &config.seed_file {
                let loaded = seed(&store, path).await?;
                tracing::info!(documents = loaded, file = %path.display(), "memory store seeded");
            } else {
                tracing::warn!("no DATABASE_URL or SEED_FILE, starting with an empty memory store");
            }
            Ok(store)
        }
    }
}

/// Load an NDJSON file of documents into `store`.
pub async fn seed(store: &Store, path: &Path) -> anyhow::Result<usize> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read seed file {}: {e}", path.display()))?;
    let docs = parse_ndjson(&text)?;
    Ok(store.load(docs).await?)
}
