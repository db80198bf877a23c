use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Open metadata map attached to a media record.
pub type CustomProperties = Map<String, JsonValue>;

/// Identity of the entity that owns media (entity type + id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct OwnerRef {
    pub owner_type: String,
    pub owner_id: Uuid,
}

impl OwnerRef {
    pub fn new(owner_type: impl Into<String>, owner_id: Uuid) -> Self {
        Self {
            owner_type: owner_type.into(),
            owner_id,
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner_type, self.owner_id)
    }
}

/// One stored file plus its metadata, belonging to one collection of one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MediaRecord {
    pub id: Uuid,
    pub owner: OwnerRef,
    pub collection_name: String,
    pub disk: String,
    pub mime_type: String,
    pub size_bytes: u64,
    #[schema(value_type = Object)]
    pub custom_properties: CustomProperties,
    pub file_name: String,
    /// Path relative to the disk root, `<id>/<file_name>` for files added by mediashelf.
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaRecord {
    /// Display name: the `name` custom property when set, else the file name.
    pub fn display_name(&self) -> String {
        match self.custom_properties.get("name") {
            Some(JsonValue::String(name)) => name.clone(),
            Some(JsonValue::Null) | None => self.file_name.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn belongs_to(&self, owner: &OwnerRef, collection_name: &str) -> bool {
        &self.owner == owner && self.collection_name == collection_name
    }

    /// Merge `metadata` into the custom properties, later keys winning.
    pub fn merge_custom_properties(&mut self, metadata: &CustomProperties) {
        for (key, value) in metadata {
            self.custom_properties.insert(key.clone(), value.clone());
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(custom: JsonValue) -> MediaRecord {
        let id = Uuid::new_v4();
        MediaRecord {
            id,
            owner: OwnerRef::new("post", Uuid::new_v4()),
            collection_name: "gallery".to_string(),
            disk: "media".to_string(),
            mime_type: "image/png".to_string(),
            size_bytes: 12,
            custom_properties: custom.as_object().cloned().unwrap_or_default(),
            file_name: "cat.png".to_string(),
            storage_path: format!("{}/cat.png", id),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_prefers_custom_name() {
        assert_eq!(record(json!({"name": "Kitty"})).display_name(), "Kitty");
        assert_eq!(record(json!({})).display_name(), "cat.png");
    }

    #[test]
    fn test_merge_custom_properties_overwrites_and_keeps() {
        let mut media = record(json!({"name": "Kitty", "width": 200}));
        let update = json!({"name": "Tom", "height": 100});
        media.merge_custom_properties(update.as_object().unwrap());
        assert_eq!(
            JsonValue::Object(media.custom_properties.clone()),
            json!({"name": "Tom", "width": 200, "height": 100})
        );
    }

    #[test]
    fn test_owner_ref_display() {
        let id = Uuid::nil();
        assert_eq!(
            OwnerRef::new("post", id).to_string(),
            "post:00000000-0000-0000-0000-000000000000"
        );
    }
}
