//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use mediashelf_collections::{InMemoryMediaStore, MediaStore, PermissionGate};
use mediashelf_core::Config;
use mediashelf_db::MediaRepository;
use mediashelf_storage::create_gateway;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init().map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let store = setup_store(&config).await?;

    let gateway = create_gateway(&config)
        .await
        .context("Failed to initialize storage disks")?;

    let state = Arc::new(AppState::new(
        config.clone(),
        gateway,
        store,
        crate::catalog::owner_types(),
        Arc::new(PermissionGate),
    ));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Postgres when `DATABASE_URL` is set, otherwise records live in memory.
async fn setup_store(config: &Config) -> Result<Arc<dyn MediaStore>> {
    match config.database_url() {
        Some(url) => {
            let pool = database::setup_database(config, url).await?;
            Ok(Arc::new(MediaRepository::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, media records are kept in memory");
            Ok(Arc::new(InMemoryMediaStore::new()))
        }
    }
}
