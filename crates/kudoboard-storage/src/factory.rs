#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::{s3::S3Options, S3Storage};
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use kudoboard_core::StorageSettings;
use std::sync::Arc;

/// Create the storage backend selected by configuration.
///
/// Called once at startup; the returned handle is shared by every component
/// that needs storage.
pub async fn create_storage(settings: &StorageSettings) -> StorageResult<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match settings.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = settings
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::Config("S3_BUCKET not configured".to_string()))?;
            let region = settings
                .s3_region
                .clone()
                .ok_or_else(|| StorageError::Config("S3_REGION not configured".to_string()))?;

            let storage = S3Storage::new(S3Options {
                bucket,
                region,
                endpoint: settings.s3_endpoint.clone(),
                access_key: settings.s3_access_key.clone(),
                secret_key: settings.s3_secret_key.clone(),
                public_url: settings.s3_public_url.clone(),
            })?;
            Arc::new(storage)
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => {
            return Err(StorageError::Config(
                "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
            ))
        }

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let storage = LocalStorage::new(
                settings.local_storage_path.clone(),
                settings.local_url_prefix.clone(),
            )
            .await?;
            Arc::new(storage)
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => {
            return Err(StorageError::Config(
                "Local storage backend not available (storage-local feature not enabled)"
                    .to_string(),
            ))
        }
    };

    tracing::info!(backend = %storage.backend_type(), "Storage backend initialized");
    Ok(storage)
}
