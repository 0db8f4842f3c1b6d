use anyhow::{Context, Result};
use roster_core::Config;
use roster_storage::{create_storage, Storage};
use std::sync::Arc;

/// Select and initialize the configured storage backend.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    match config.storage_backend() {
        roster_storage::StorageBackend::S3 => tracing::info!(
            bucket = ?config.storage().s3_bucket,
            endpoint = ?config.storage().s3_endpoint,
            signed_url_ttl_secs = config.signed_url_ttl().as_secs(),
            "S3 storage initialized"
        ),
        roster_storage::StorageBackend::Local => tracing::info!(
            path = %config.storage().local_storage_path,
            base_url = %config.storage().local_storage_base_url,
            "Local storage initialized"
        ),
    }

    Ok(storage)
}
