use mediashelf_core::{AppError, Config, MediaRecord};
use mediashelf_storage::keys;
use mediashelf_storage::StorageGateway;
use std::sync::Arc;

/// Turns records into URLs a browser can fetch.
///
/// Files on the public disk get the disk's own URL. Everything else goes through
/// the view endpoint, which re-checks permissions on every request.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    gateway: Arc<StorageGateway>,
    public_disk: String,
    view_endpoint: String,
}

impl UrlResolver {
    pub fn new(
        gateway: Arc<StorageGateway>,
        public_disk: impl Into<String>,
        view_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            public_disk: public_disk.into(),
            view_endpoint: view_endpoint.into(),
        }
    }

    pub fn from_config(config: &Config, gateway: Arc<StorageGateway>) -> Self {
        Self::new(gateway, config.public_disk(), config.view_endpoint())
    }

    pub fn resolve(&self, record: &MediaRecord) -> Result<String, AppError> {
        self.route(&record.disk, &record.storage_path)
    }

    /// URL of a derived file such as `thumb_200`.
    pub fn resolve_conversion(&self, record: &MediaRecord, conversion: &str) -> Result<String, AppError> {
        let path = keys::conversion_key(record.id, &record.file_name, conversion);
        self.route(&record.disk, &path)
    }

    fn route(&self, disk: &str, path: &str) -> Result<String, AppError> {
        let path = normalize_path(path);
        if disk == self.public_disk {
            return Ok(self.gateway.url(disk, &path)?);
        }
        Ok(format!("{}?path={}", self.view_endpoint, encode_path(&path)))
    }
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Percent-encode each segment, keeping the `/` separators readable.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mediashelf_core::{CustomProperties, OwnerRef};
    use mediashelf_storage::LocalStorage;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn record(disk: &str, storage_path: &str) -> MediaRecord {
        MediaRecord {
            id: Uuid::nil(),
            owner: OwnerRef::new("post", Uuid::nil()),
            collection_name: "documents".to_string(),
            disk: disk.to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 10,
            custom_properties: CustomProperties::new(),
            file_name: "scan 1.pdf".to_string(),
            storage_path: storage_path.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn resolver() -> (tempfile::TempDir, UrlResolver) {
        let dir = tempdir().unwrap();
        let public = LocalStorage::new(dir.path().join("media"), "http://localhost:4000/media".into())
            .await
            .unwrap();
        let gateway = StorageGateway::new().with_disk("media", Arc::new(public));
        (dir, UrlResolver::new(Arc::new(gateway), "media", "/view"))
    }

    #[tokio::test]
    async fn test_private_disk_goes_through_view_endpoint() {
        let (_dir, resolver) = resolver().await;
        let id = Uuid::nil();
        let url = resolver
            .resolve(&record("media_private", &format!("{}\\scan.pdf", id)))
            .unwrap();
        assert_eq!(url, format!("/view?path={}/scan.pdf", id));
    }

    #[tokio::test]
    async fn test_public_disk_uses_direct_url() {
        let (_dir, resolver) = resolver().await;
        let url = resolver.resolve(&record("media", "abc/photo.png")).unwrap();
        assert_eq!(url, "http://localhost:4000/media/abc/photo.png");
    }

    #[tokio::test]
    async fn test_segments_are_encoded() {
        let (_dir, resolver) = resolver().await;
        let url = resolver
            .resolve(&record("archive", "abc/scan 1.pdf"))
            .unwrap();
        assert_eq!(url, "/view?path=abc/scan%201.pdf");
    }

    #[tokio::test]
    async fn test_conversion_url() {
        let (_dir, resolver) = resolver().await;
        let url = resolver
            .resolve_conversion(&record("media_private", "x"), "thumb_200")
            .unwrap();
        assert_eq!(
            url,
            format!("/view?path={}/conversions/scan%201-thumb_200.jpg", Uuid::nil())
        );
    }
}
