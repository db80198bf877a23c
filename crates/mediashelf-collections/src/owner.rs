//! Owning entities and how to find them again from a stored record.

use async_trait::async_trait;
use mediashelf_core::{AppError, OwnerRef};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::policy::CollectionDefaults;
use crate::registry::{CollectionRegistry, ConversionRegistry};

/// An entity that has media collections.
///
/// Implementors only describe their collections; storing and validating files is
/// done by the `Reconciler`.
pub trait MediaOwner: Send + Sync {
    fn owner_ref(&self) -> OwnerRef;

    fn register_media_collections(&self, registry: &mut CollectionRegistry);

    /// Defaults to a 200x200 thumbnail for every image collection.
    fn register_media_conversions(
        &self,
        registry: &CollectionRegistry,
        conversions: &mut ConversionRegistry,
    ) {
        conversions.auto_register_thumb_200(registry);
    }

    fn build_registry(&self, defaults: &CollectionDefaults) -> CollectionRegistry {
        let mut registry = CollectionRegistry::new(defaults.clone());
        self.register_media_collections(&mut registry);
        registry
    }

    fn build_conversions(&self, registry: &CollectionRegistry) -> ConversionRegistry {
        let mut conversions = ConversionRegistry::new();
        self.register_media_conversions(registry, &mut conversions);
        conversions
    }
}

/// Loads the owning entity of a record.
#[async_trait]
pub trait OwnerResolver: Send + Sync {
    /// `Ok(None)` when the owner no longer exists.
    async fn resolve(&self, owner: &OwnerRef) -> Result<Option<Arc<dyn MediaOwner>>, AppError>;
}

type OwnerFactory = Arc<dyn Fn(Uuid) -> Arc<dyn MediaOwner> + Send + Sync>;

/// Resolver keyed by owner type, building owners from their id alone.
#[derive(Clone, Default)]
pub struct OwnerTypeRegistry {
    factories: HashMap<String, OwnerFactory>,
}

impl OwnerTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(mut self, owner_type: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Uuid) -> Arc<dyn MediaOwner> + Send + Sync + 'static,
    {
        self.factories.insert(owner_type.into(), Arc::new(factory));
        self
    }

    pub fn owner_types(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

#[async_trait]
impl OwnerResolver for OwnerTypeRegistry {
    async fn resolve(&self, owner: &OwnerRef) -> Result<Option<Arc<dyn MediaOwner>>, AppError> {
        Ok(self
            .factories
            .get(&owner.owner_type)
            .map(|factory| factory(owner.owner_id)))
    }
}
