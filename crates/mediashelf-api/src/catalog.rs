//! Owner types served by this binary.

use mediashelf_collections::{
    CollectionRegistry, Conversion, ConversionRegistry, Fit, MediaOwner, OwnerTypeRegistry,
};
use mediashelf_core::OwnerRef;
use std::sync::Arc;
use uuid::Uuid;

const MAX_FILES: u64 = 20;
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

pub const VIEW_PERMISSION: &str = "vop.view";
pub const UPLOAD_PERMISSION: &str = "vop.upload";

/// A post with an open gallery and two private attachment collections.
pub struct Post {
    pub id: Uuid,
}

impl MediaOwner for Post {
    fn owner_ref(&self) -> OwnerRef {
        OwnerRef::new("post", self.id)
    }

    fn register_media_collections(&self, registry: &mut CollectionRegistry) {
        registry
            .register("gallery")
            .max_number_of_files(MAX_FILES)
            .max_file_size(MAX_FILE_SIZE)
            .accepts(["image/*"]);

        registry
            .register("documents")
            .private()
            .can_view(VIEW_PERMISSION)
            .can_upload(UPLOAD_PERMISSION)
            .max_number_of_files(MAX_FILES)
            .max_file_size(MAX_FILE_SIZE)
            .accepts(["application/pdf", "application/msword"]);

        registry
            .register("zip")
            .private()
            .can_view(VIEW_PERMISSION)
            .can_upload(UPLOAD_PERMISSION)
            .max_number_of_files(MAX_FILES)
            .max_file_size(MAX_FILE_SIZE)
            .accepts(["application/octet-stream"]);
    }

    fn register_media_conversions(
        &self,
        registry: &CollectionRegistry,
        conversions: &mut ConversionRegistry,
    ) {
        conversions.auto_register_thumb_200(registry);
        conversions.add(Conversion {
            name: "thumb".to_string(),
            width: 368,
            height: 232,
            fit: Fit::Crop,
            collections: vec!["gallery".to_string()],
        });
    }
}

/// Every owner type the service can resolve from a stored record.
pub fn owner_types() -> OwnerTypeRegistry {
    OwnerTypeRegistry::new().register("post", |id| Arc::new(Post { id }) as Arc<dyn MediaOwner>)
}
