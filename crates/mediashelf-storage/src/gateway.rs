//! Named disk routing.
//!
//! The gateway owns one `Storage` per disk name and is the only way the rest of
//! mediashelf touches files.

use crate::content_type;
use crate::keys::sanitize_file_name;
use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

/// Address of a stored file, plus what was learned while storing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageHandle {
    pub disk: String,
    pub path: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[derive(Clone, Default)]
pub struct StorageGateway {
    disks: HashMap<String, Arc<dyn Storage>>,
}

impl fmt::Debug for StorageGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.disks.keys().collect();
        names.sort();
        f.debug_struct("StorageGateway").field("disks", &names).finish()
    }
}

impl StorageGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disk(mut self, name: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        self.register_disk(name, storage);
        self
    }

    pub fn register_disk(&mut self, name: impl Into<String>, storage: Arc<dyn Storage>) {
        self.disks.insert(name.into(), storage);
    }

    pub fn has_disk(&self, name: &str) -> bool {
        self.disks.contains_key(name)
    }

    pub fn disk(&self, name: &str) -> StorageResult<&Arc<dyn Storage>> {
        self.disks
            .get(name)
            .ok_or_else(|| StorageError::UnknownDisk(name.to_string()))
    }

    /// Copy a local file into `disk` at `key`. The source is left in place.
    pub async fn put(&self, source: &Path, disk: &str, key: &str) -> StorageResult<StorageHandle> {
        let storage = self.disk(disk)?;

        let data = fs::read(source).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(source.display().to_string()),
            _ => StorageError::IoError(e),
        })?;

        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = content_type::detect(&data, &file_name);

        self.write(storage, disk, key, data, mime_type).await
    }

    /// Store in-memory bytes in `disk` at `key`.
    pub async fn put_bytes(
        &self,
        disk: &str,
        key: &str,
        data: Vec<u8>,
        file_name: &str,
    ) -> StorageResult<StorageHandle> {
        let storage = self.disk(disk)?;
        let mime_type = content_type::detect(&data, &sanitize_file_name(file_name));
        self.write(storage, disk, key, data, mime_type).await
    }

    async fn write(
        &self,
        storage: &Arc<dyn Storage>,
        disk: &str,
        key: &str,
        data: Vec<u8>,
        mime_type: String,
    ) -> StorageResult<StorageHandle> {
        let size_bytes = data.len() as u64;
        storage.put(key, data, &mime_type).await?;

        tracing::debug!(disk = %disk, key = %key, size_bytes, mime_type = %mime_type, "Stored file");

        Ok(StorageHandle {
            disk: disk.to_string(),
            path: key.to_string(),
            mime_type,
            size_bytes,
        })
    }

    /// Stream a stored file; `NotFound` if it is absent.
    pub async fn get(&self, disk: &str, path: &str) -> StorageResult<ByteStream> {
        self.disk(disk)?.download_stream(path).await
    }

    pub async fn exists(&self, disk: &str, path: &str) -> StorageResult<bool> {
        self.disk(disk)?.exists(path).await
    }

    /// Best-effort removal; a missing file is not an error.
    pub async fn delete(&self, disk: &str, path: &str) -> StorageResult<()> {
        self.disk(disk)?.delete(path).await
    }

    pub async fn size(&self, disk: &str, path: &str) -> StorageResult<u64> {
        self.disk(disk)?.content_length(path).await
    }

    /// Direct URL of a file on `disk`.
    pub fn url(&self, disk: &str, path: &str) -> StorageResult<String> {
        Ok(self.disk(disk)?.url(path))
    }
}
