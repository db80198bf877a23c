#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageGateway, StorageResult};
use mediashelf_core::Config;
use std::path::Path;
use std::sync::Arc;

/// Build the gateway for every configured disk.
///
/// The public, private and extra disks use the configured backend. The uploads
/// disk is always local so staged files can be validated in place.
pub async fn create_gateway(config: &Config) -> StorageResult<StorageGateway> {
    let root = Path::new(config.storage_root());
    let mut gateway = StorageGateway::new();

    let uploads = create_local_disk(root, config.uploads_disk(), String::new()).await?;
    gateway.register_disk(config.uploads_disk(), uploads);

    let mut disks: Vec<(&str, String)> = vec![
        (config.public_disk(), config.public_base_url().to_string()),
        (config.private_disk(), String::new()),
    ];
    disks.extend(
        config
            .extra_disks()
            .iter()
            .map(|name| (name.as_str(), String::new())),
    );

    for (name, base_url) in disks {
        let storage = create_disk(config, root, name, base_url).await?;
        tracing::info!(disk = %name, backend = %storage.backend_type(), "Disk configured");
        gateway.register_disk(name, storage);
    }

    Ok(gateway)
}

async fn create_disk(
    config: &Config,
    root: &Path,
    name: &str,
    base_url: String,
) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config
                .s3_region()
                .map(String::from)
                .or_else(|| config.aws_region().map(String::from))
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let storage = S3Storage::new(bucket, region, name.to_string(), endpoint)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        StorageBackend::Local => create_local_disk(root, name, base_url).await,
    }
}

#[cfg(feature = "storage-local")]
async fn create_local_disk(
    root: &Path,
    name: &str,
    base_url: String,
) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(root.join(name), base_url).await?;
    Ok(Arc::new(storage))
}

#[cfg(not(feature = "storage-local"))]
async fn create_local_disk(
    _root: &Path,
    _name: &str,
    _base_url: String,
) -> StorageResult<Arc<dyn Storage>> {
    Err(StorageError::ConfigError(
        "Local storage backend not available (storage-local feature not enabled)".to_string(),
    ))
}
