//! Media repository: the `media` table behind `MediaStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediashelf_collections::MediaStore;
use mediashelf_core::{AppError, CustomProperties, MediaRecord, OwnerRef};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const MEDIA_COLUMNS: &str = "id, owner_type, owner_id, collection_name, disk, mime_type, size_bytes, \
     custom_properties, file_name, storage_path, created_at, updated_at";

/// Row type for the media table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct MediaRow {
    pub id: Uuid,
    pub owner_type: String,
    pub owner_id: Uuid,
    pub collection_name: String,
    pub disk: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub custom_properties: Json<CustomProperties>,
    pub file_name: String,
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaRow {
    pub fn to_media_record(self) -> MediaRecord {
        MediaRecord {
            id: self.id,
            owner: OwnerRef::new(self.owner_type, self.owner_id),
            collection_name: self.collection_name,
            disk: self.disk,
            mime_type: self.mime_type,
            size_bytes: self.size_bytes.max(0) as u64,
            custom_properties: self.custom_properties.0,
            file_name: self.file_name,
            storage_path: self.storage_path,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Repository for the media table.
#[derive(Clone)]
pub struct MediaRepository {
    pool: PgPool,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaStore for MediaRepository {
    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select", db.record_id = %id))]
    async fn find(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError> {
        let row = sqlx::query_as::<Postgres, MediaRow>(&format!(
            "SELECT {} FROM media WHERE id = $1",
            MEDIA_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MediaRow::to_media_record))
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select", owner = %owner))]
    async fn list(&self, owner: &OwnerRef, collection: &str) -> Result<Vec<MediaRecord>, AppError> {
        let rows = sqlx::query_as::<Postgres, MediaRow>(&format!(
            "SELECT {} FROM media \
             WHERE owner_type = $1 AND owner_id = $2 AND collection_name = $3 \
             ORDER BY created_at ASC, id ASC",
            MEDIA_COLUMNS
        ))
        .bind(&owner.owner_type)
        .bind(owner.owner_id)
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MediaRow::to_media_record).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "count", owner = %owner))]
    async fn count(&self, owner: &OwnerRef, collection: &str) -> Result<u64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM media WHERE owner_type = $1 AND owner_id = $2 AND collection_name = $3",
        )
        .bind(&owner.owner_type)
        .bind(owner.owner_id)
        .bind(collection)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    #[tracing::instrument(skip(self, record), fields(db.table = "media", db.operation = "insert", db.record_id = %record.id))]
    async fn insert(&self, record: &MediaRecord) -> Result<(), AppError> {
        let size_bytes = i64::try_from(record.size_bytes)
            .map_err(|_| AppError::InvalidInput(format!("File size {} out of range", record.size_bytes)))?;

        sqlx::query(
            r#"
            INSERT INTO media (id, owner_type, owner_id, collection_name, disk, mime_type,
                               size_bytes, custom_properties, file_name, storage_path,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(record.id)
        .bind(&record.owner.owner_type)
        .bind(record.owner.owner_id)
        .bind(&record.collection_name)
        .bind(&record.disk)
        .bind(&record.mime_type)
        .bind(size_bytes)
        .bind(Json(&record.custom_properties))
        .bind(&record.file_name)
        .bind(&record.storage_path)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, custom_properties), fields(db.table = "media", db.operation = "update", db.record_id = %id))]
    async fn update_custom_properties(
        &self,
        id: Uuid,
        custom_properties: &CustomProperties,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE media SET custom_properties = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(Json(custom_properties))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> MediaRow {
        let mut props = CustomProperties::new();
        props.insert("name".into(), json!("Scan"));
        MediaRow {
            id: Uuid::new_v4(),
            owner_type: "post".to_string(),
            owner_id: Uuid::new_v4(),
            collection_name: "documents".to_string(),
            disk: "media_private".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 2048,
            custom_properties: Json(props),
            file_name: "scan.pdf".to_string(),
            storage_path: "x/scan.pdf".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_to_media_record() {
        let row = row();
        let owner_id = row.owner_id;
        let record = row.to_media_record();

        assert_eq!(record.owner, OwnerRef::new("post", owner_id));
        assert_eq!(record.size_bytes, 2048);
        assert_eq!(record.display_name(), "Scan");
    }

    #[test]
    fn test_negative_size_clamps_to_zero() {
        let mut row = row();
        row.size_bytes = -1;
        assert_eq!(row.to_media_record().size_bytes, 0);
    }

    /// Needs a migrated Postgres at `DATABASE_URL`.
    #[tokio::test]
    #[ignore]
    async fn test_repository_round_trip() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::migrate!("../../migrations").run(&pool).await.unwrap();
        let repo = MediaRepository::new(pool);

        let record = row().to_media_record();
        repo.insert(&record).await.unwrap();
        assert_eq!(repo.count(&record.owner, "documents").await.unwrap(), 1);

        let mut props = CustomProperties::new();
        props.insert("name".into(), json!("Renamed"));
        assert!(repo.update_custom_properties(record.id, &props).await.unwrap());
        let found = repo.find(record.id).await.unwrap().unwrap();
        assert_eq!(found.display_name(), "Renamed");

        assert!(repo.delete(record.id).await.unwrap());
        assert!(!repo.delete(record.id).await.unwrap());
        assert!(repo.list(&record.owner, "documents").await.unwrap().is_empty());
    }
}
