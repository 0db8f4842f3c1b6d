//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::Result;
use roster_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry()?;

    tracing::info!(
        environment = %config.environment(),
        storage_backend = %config.storage_backend(),
        email_enabled = config.email_enabled(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;

    let storage = storage::setup_storage(&config).await?;

    let notifier = roster_services::create_notifier(&config);

    let state = services::initialize_services(
        &config,
        services::Repositories::postgres(pool),
        storage,
        notifier,
        roster_services::CredentialIssuer::new(),
    );

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
