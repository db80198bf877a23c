//! Persistence seam for media records.

use async_trait::async_trait;
use mediashelf_core::{AppError, CustomProperties, MediaRecord, OwnerRef};
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError>;

    /// Records of one collection of one owner, oldest first.
    async fn list(&self, owner: &OwnerRef, collection: &str) -> Result<Vec<MediaRecord>, AppError>;

    async fn count(&self, owner: &OwnerRef, collection: &str) -> Result<u64, AppError>;

    async fn insert(&self, record: &MediaRecord) -> Result<(), AppError>;

    /// Returns false when no record has this id.
    async fn update_custom_properties(
        &self,
        id: Uuid,
        custom_properties: &CustomProperties,
    ) -> Result<bool, AppError>;

    /// Returns false when no record has this id.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Process-local store, used when no database is configured and in tests.
#[derive(Debug, Default)]
pub struct InMemoryMediaStore {
    records: RwLock<Vec<MediaRecord>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn find(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|record| record.id == id).cloned())
    }

    async fn list(&self, owner: &OwnerRef, collection: &str) -> Result<Vec<MediaRecord>, AppError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| record.belongs_to(owner, collection))
            .cloned()
            .collect())
    }

    async fn count(&self, owner: &OwnerRef, collection: &str) -> Result<u64, AppError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| record.belongs_to(owner, collection))
            .count() as u64)
    }

    async fn insert(&self, record: &MediaRecord) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(AppError::Internal(format!(
                "media record {} already exists",
                record.id
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn update_custom_properties(
        &self,
        id: Uuid,
        custom_properties: &CustomProperties,
    ) -> Result<bool, AppError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.custom_properties = custom_properties.clone();
                record.updated_at = chrono::Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.id != id);
        Ok(records.len() != before)
    }
}
