//! Permission-checked file streaming for the view endpoint.

use mediashelf_core::{AppError, MediaRecord};
use mediashelf_storage::{content_type, ByteStream, StorageError, StorageGateway};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::context::MediaContext;
use crate::gate::{authorize_optional, AccessGate};
use crate::owner::OwnerResolver;
use crate::store::MediaStore;

/// A file ready to be streamed back to the client.
pub struct FileView {
    pub body: ByteStream,
    pub content_type: String,
    pub file_name: String,
}

impl FileView {
    /// `inline; filename="<basename>"`
    pub fn content_disposition(&self) -> String {
        format!("inline; filename=\"{}\"", self.file_name.replace('"', "'"))
    }
}

impl fmt::Debug for FileView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileView")
            .field("content_type", &self.content_type)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct FileViewService {
    store: Arc<dyn MediaStore>,
    owners: Arc<dyn OwnerResolver>,
    gateway: Arc<StorageGateway>,
    gate: Arc<dyn AccessGate>,
}

impl FileViewService {
    pub fn new(
        store: Arc<dyn MediaStore>,
        owners: Arc<dyn OwnerResolver>,
        gateway: Arc<StorageGateway>,
        gate: Arc<dyn AccessGate>,
    ) -> Self {
        Self {
            store,
            owners,
            gateway,
            gate,
        }
    }

    /// Resolve `<media id>/<relative path>` to a stream the actor may read.
    #[tracing::instrument(skip(self, ctx), fields(actor = %ctx.actor.id, operation = "view"))]
    pub async fn view(&self, ctx: &MediaContext, path: Option<&str>) -> Result<FileView, AppError> {
        let path = path
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::InvalidInput("The path field is required.".to_string()))?
            .replace('\\', "/");

        let (media_id, _) = path.split_once('/').unwrap_or((path.as_str(), ""));
        let media_id = Uuid::parse_str(media_id).map_err(|_| medium_not_found())?;

        let record = self
            .store
            .find(media_id)
            .await?
            .ok_or_else(medium_not_found)?;

        let owner = self
            .owners
            .resolve(&record.owner)
            .await?
            .ok_or_else(medium_not_found)?;

        let registry = owner.build_registry(&ctx.defaults);
        let policy = registry.get(&record.collection_name).ok_or_else(|| {
            tracing::debug!(
                media_id = %media_id,
                collection = %record.collection_name,
                "Collection no longer registered"
            );
            medium_not_found()
        })?;

        authorize_optional(
            self.gate.as_ref(),
            policy.view_permission(),
            &ctx.actor,
            &record.owner,
        )?;

        let exists = self
            .gateway
            .exists(policy.disk_name(), &path)
            .await
            .map_err(file_error)?;
        if !exists {
            tracing::debug!(disk = %policy.disk_name(), path = %path, "File missing from disk");
            return Err(file_not_found());
        }

        let body = self
            .gateway
            .get(policy.disk_name(), &path)
            .await
            .map_err(file_error)?;
        let file_name = path.rsplit('/').next().unwrap_or_default().to_string();

        tracing::debug!(media_id = %media_id, disk = %policy.disk_name(), "Streaming file");

        Ok(FileView {
            body,
            content_type: served_content_type(&record, &path, &file_name),
            file_name,
        })
    }
}

/// The record's type for its own file; derived files are typed by extension.
fn served_content_type(record: &MediaRecord, path: &str, file_name: &str) -> String {
    if path == record.storage_path.replace('\\', "/") {
        return record.mime_type.clone();
    }
    match content_type::from_file_name(file_name) {
        guessed if guessed == content_type::OCTET_STREAM => record.mime_type.clone(),
        guessed => guessed,
    }
}

fn medium_not_found() -> AppError {
    AppError::NotFound("Medium not found".to_string())
}

fn file_not_found() -> AppError {
    AppError::NotFound("File not found".to_string())
}

/// A path the disk refuses to resolve names no file.
fn file_error(err: StorageError) -> AppError {
    match err {
        StorageError::InvalidKey(key) => {
            tracing::debug!(path = %key, "Unresolvable view path");
            file_not_found()
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::PermissionGate;
    use crate::owner::{MediaOwner, OwnerTypeRegistry};
    use crate::policy::CollectionDefaults;
    use crate::registry::CollectionRegistry;
    use crate::store::InMemoryMediaStore;
    use chrono::Utc;
    use futures::StreamExt;
    use mediashelf_core::{Actor, CustomProperties, OwnerRef};
    use mediashelf_storage::LocalStorage;
    use tempfile::{tempdir, TempDir};

    struct Post {
        id: Uuid,
    }

    impl MediaOwner for Post {
        fn owner_ref(&self) -> OwnerRef {
            OwnerRef::new("post", self.id)
        }

        fn register_media_collections(&self, registry: &mut CollectionRegistry) {
            registry.register("gallery").accepts(["image/*"]);
            registry.register("documents").private().can_view("vop.view");
        }
    }

    struct Harness {
        _dir: TempDir,
        service: FileViewService,
        store: Arc<InMemoryMediaStore>,
        gateway: Arc<StorageGateway>,
        owner: OwnerRef,
    }

    async fn harness() -> Harness {
        let dir = tempdir().unwrap();
        let mut gateway = StorageGateway::new();
        for disk in ["media", "media_private"] {
            let storage = LocalStorage::new(dir.path().join(disk), String::new())
                .await
                .unwrap();
            gateway.register_disk(disk, Arc::new(storage));
        }
        let gateway = Arc::new(gateway);
        let store = Arc::new(InMemoryMediaStore::new());
        let owners = OwnerTypeRegistry::new()
            .register("post", |id| Arc::new(Post { id }) as Arc<dyn MediaOwner>);
        let service = FileViewService::new(
            store.clone(),
            Arc::new(owners),
            gateway.clone(),
            Arc::new(PermissionGate),
        );

        Harness {
            _dir: dir,
            service,
            store,
            gateway,
            owner: OwnerRef::new("post", Uuid::new_v4()),
        }
    }

    impl Harness {
        async fn add(&self, collection: &str, disk: &str, file_name: &str, bytes: &[u8]) -> MediaRecord {
            let id = Uuid::new_v4();
            let storage_path = format!("{}/{}", id, file_name);
            let handle = self
                .gateway
                .put_bytes(disk, &storage_path, bytes.to_vec(), file_name)
                .await
                .unwrap();
            let record = MediaRecord {
                id,
                owner: self.owner.clone(),
                collection_name: collection.to_string(),
                disk: disk.to_string(),
                mime_type: handle.mime_type,
                size_bytes: handle.size_bytes,
                custom_properties: CustomProperties::new(),
                file_name: file_name.to_string(),
                storage_path,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.store.insert(&record).await.unwrap();
            record
        }
    }

    fn ctx(permissions: &[&str]) -> MediaContext {
        MediaContext::new(
            Actor::new(Uuid::new_v4(), permissions.iter().copied()),
            CollectionDefaults::default(),
            "/unused",
        )
    }

    async fn body(view: FileView) -> Vec<u8> {
        let mut stream = view.body;
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_view_requires_permission_when_set() {
        let h = harness().await;
        let record = h
            .add("documents", "media_private", "scan.pdf", b"%PDF-1.4 body")
            .await;

        let denied = h.service.view(&ctx(&[]), Some(&record.storage_path)).await;
        assert!(matches!(denied, Err(AppError::PermissionDenied(p)) if p == "vop.view"));

        let view = h
            .service
            .view(&ctx(&["vop.view"]), Some(&record.storage_path))
            .await
            .unwrap();
        assert_eq!(view.content_type, "application/pdf");
        assert_eq!(view.content_disposition(), "inline; filename=\"scan.pdf\"");
        assert_eq!(body(view).await, b"%PDF-1.4 body");
    }

    #[tokio::test]
    async fn test_open_collection_needs_no_permission() {
        let h = harness().await;
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        let record = h.add("gallery", "media", "cat.png", &png).await;

        let view = h
            .service
            .view(&ctx(&[]), Some(&record.storage_path))
            .await
            .unwrap();
        assert_eq!(view.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_missing_path_is_invalid_input() {
        let h = harness().await;
        assert!(matches!(
            h.service.view(&ctx(&[]), None).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            h.service.view(&ctx(&[]), Some("  ")).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_traversal_below_medium_is_not_found() {
        let h = harness().await;
        let record = h
            .add("documents", "media_private", "scan.pdf", b"%PDF-1.4 body")
            .await;

        let up = format!("{}/../x", record.id);
        let deep = format!("{}/../../../etc/passwd", record.id);
        let back = format!("{}\\..\\x", record.id);
        for path in [up.as_str(), deep.as_str(), back.as_str()] {
            assert!(matches!(
                h.service.view(&ctx(&["vop.view"]), Some(path)).await,
                Err(AppError::NotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_unknown_medium_is_not_found() {
        let h = harness().await;
        let unknown = format!("{}/file.pdf", Uuid::new_v4());
        for path in ["not-a-uuid/file.pdf", unknown.as_str()] {
            assert!(matches!(
                h.service.view(&ctx(&["vop.view"]), Some(path)).await,
                Err(AppError::NotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_unregistered_collection_is_not_found() {
        let h = harness().await;
        let record = h.add("attachments", "media", "a.txt", b"hello").await;
        assert!(matches!(
            h.service.view(&ctx(&["*"]), Some(&record.storage_path)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let h = harness().await;
        let record = h
            .add("documents", "media_private", "scan.pdf", b"%PDF-1.4 body")
            .await;
        let other = format!("{}/other.pdf", record.id);

        let result = h.service.view(&ctx(&["vop.view"]), Some(&other)).await;
        assert!(matches!(result, Err(AppError::NotFound(m)) if m == "File not found"));
    }
}
