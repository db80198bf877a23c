use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::media::CustomProperties;

/// Requested change for a single medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaAction {
    Add,
    Update,
    Delete,
}

/// One requested change inside a batch.
///
/// Wire shape: `{"id"?, "collection_name", "path"?, "action"?, "meta_data"?}`.
/// A missing `action` means `update` when `id` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOperation")]
pub struct OperationInput {
    pub id: Option<Uuid>,
    pub collection_name: String,
    #[serde(rename = "path")]
    pub source_path: Option<String>,
    pub action: MediaAction,
    #[serde(rename = "meta_data")]
    pub metadata: CustomProperties,
}

#[derive(Deserialize)]
struct RawOperation {
    #[serde(default)]
    id: Option<Uuid>,
    collection_name: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    action: Option<MediaAction>,
    #[serde(default)]
    meta_data: Option<CustomProperties>,
}

impl TryFrom<RawOperation> for OperationInput {
    type Error = String;

    fn try_from(raw: RawOperation) -> Result<Self, Self::Error> {
        let action = match (raw.action, raw.id) {
            (Some(action), _) => action,
            (None, Some(_)) => MediaAction::Update,
            (None, None) => {
                return Err(format!(
                    "operation for collection {} has neither an id nor an action",
                    raw.collection_name
                ))
            }
        };

        Ok(OperationInput {
            id: raw.id,
            collection_name: raw.collection_name,
            source_path: raw.path.filter(|p| !p.is_empty()),
            action,
            metadata: raw.meta_data.unwrap_or_default(),
        })
    }
}

impl OperationInput {
    pub fn add(collection_name: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            id: None,
            collection_name: collection_name.into(),
            source_path: Some(source_path.into()),
            action: MediaAction::Add,
            metadata: CustomProperties::new(),
        }
    }

    pub fn update(collection_name: impl Into<String>, id: Uuid) -> Self {
        Self {
            id: Some(id),
            collection_name: collection_name.into(),
            source_path: None,
            action: MediaAction::Update,
            metadata: CustomProperties::new(),
        }
    }

    pub fn delete(collection_name: impl Into<String>, id: Uuid) -> Self {
        Self {
            id: Some(id),
            collection_name: collection_name.into(),
            source_path: None,
            action: MediaAction::Delete,
            metadata: CustomProperties::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: CustomProperties) -> Self {
        self.metadata = metadata;
        self
    }

    /// Check the id/path combination required by the action.
    pub fn check_shape(&self) -> Result<(), String> {
        match self.action {
            MediaAction::Add if self.id.is_some() => {
                Err("an add operation must not carry an id".to_string())
            }
            MediaAction::Add if self.source_path.is_none() => {
                Err("an add operation requires a path".to_string())
            }
            MediaAction::Update | MediaAction::Delete if self.id.is_none() => Err(format!(
                "an {} operation requires an id",
                match self.action {
                    MediaAction::Update => "update",
                    _ => "delete",
                }
            )),
            _ => Ok(()),
        }
    }
}

/// Mapping from collection name to the ordered operations requested for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaBatch {
    operations: HashMap<String, Vec<OperationInput>>,
}

impl MediaBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; replaces any operations already set for `collection`.
    pub fn with(mut self, collection: impl Into<String>, operations: Vec<OperationInput>) -> Self {
        self.operations.insert(collection.into(), operations);
        self
    }

    pub fn push(&mut self, operation: OperationInput) {
        self.operations
            .entry(operation.collection_name.clone())
            .or_default()
            .push(operation);
    }

    /// Operations for `collection`, empty if none were submitted.
    pub fn for_collection(&self, collection: &str) -> &[OperationInput] {
        self.operations
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_batch() {
        let id = Uuid::new_v4();
        let batch: MediaBatch = serde_json::from_value(json!({
            "gallery": [
                {
                    "collection_name": "gallery",
                    "path": "test.jpg",
                    "action": "add",
                    "meta_data": {"name": "test", "width": 200, "height": 200}
                },
                {"id": id, "collection_name": "gallery", "meta_data": {"name": "renamed"}}
            ]
        }))
        .unwrap();

        let ops = batch.for_collection("gallery");
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].action, MediaAction::Add);
        assert_eq!(ops[0].source_path.as_deref(), Some("test.jpg"));
        assert_eq!(ops[0].metadata.get("width"), Some(&json!(200)));
        assert_eq!(ops[1].action, MediaAction::Update);
        assert_eq!(ops[1].id, Some(id));
        assert!(batch.for_collection("documents").is_empty());
    }

    #[test]
    fn test_operation_without_id_or_action_is_rejected() {
        let result: Result<OperationInput, _> =
            serde_json::from_value(json!({"collection_name": "gallery", "path": "a.jpg"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_check_shape() {
        assert!(OperationInput::add("gallery", "a.jpg").check_shape().is_ok());
        assert!(OperationInput::delete("gallery", Uuid::new_v4())
            .check_shape()
            .is_ok());

        let mut add_with_id = OperationInput::add("gallery", "a.jpg");
        add_with_id.id = Some(Uuid::new_v4());
        assert!(add_with_id.check_shape().is_err());

        let mut add_without_path = OperationInput::add("gallery", "a.jpg");
        add_without_path.source_path = None;
        assert!(add_without_path.check_shape().is_err());

        let mut delete_without_id = OperationInput::delete("gallery", Uuid::new_v4());
        delete_without_id.id = None;
        assert!(delete_without_id.check_shape().is_err());
    }

    #[test]
    fn test_push_groups_by_collection() {
        let mut batch = MediaBatch::new();
        assert!(batch.is_empty());
        batch.push(OperationInput::add("gallery", "a.jpg"));
        batch.push(OperationInput::add("gallery", "b.jpg"));
        batch.push(OperationInput::add("documents", "c.pdf"));
        assert_eq!(batch.for_collection("gallery").len(), 2);
        assert_eq!(batch.collection_names().count(), 2);
    }
}
