use mediashelf_core::{AppError, OwnerRef};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::registry::{CollectionRegistry, ConversionRegistry, THUMB_200};
use crate::store::MediaStore;
use crate::url::UrlResolver;

/// One entry of a thumbnail listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ThumbEntry {
    pub id: Uuid,
    pub url: String,
    pub thumb_url: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(rename = "mediaCollection")]
    pub media_collection: String,
    pub name: String,
    pub size: u64,
}

/// List a collection's media with 200x200 thumbnail URLs.
///
/// Non-image collections have no thumbnails, so their entries point `thumb_url` at
/// the file itself.
pub async fn thumbs_200_for_collection(
    store: &dyn MediaStore,
    urls: &UrlResolver,
    owner: &OwnerRef,
    registry: &CollectionRegistry,
    conversions: &ConversionRegistry,
    collection: &str,
) -> Result<Vec<ThumbEntry>, AppError> {
    let policy = registry
        .get(collection)
        .ok_or_else(|| AppError::NotFound(format!("Collection {} not found", collection)))?;

    if policy.is_image() && !conversions.has(collection, THUMB_200) {
        return Err(AppError::ThumbsNotConfigured(collection.to_string()));
    }

    let records = store.list(owner, collection).await?;
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let url = urls.resolve(&record)?;
        let thumb_url = if policy.is_image() {
            urls.resolve_conversion(&record, THUMB_200)?
        } else {
            url.clone()
        };

        entries.push(ThumbEntry {
            id: record.id,
            name: record.display_name(),
            url,
            thumb_url,
            mime_type: record.mime_type,
            media_collection: policy.name().to_string(),
            size: record.size_bytes,
        });
    }

    Ok(entries)
}
