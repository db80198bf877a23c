//! Per-owner collection and conversion registries.

use std::collections::HashMap;

use crate::policy::{CollectionDefaults, CollectionPolicy};

/// Name of the 200x200 thumbnail conversion.
pub const THUMB_200: &str = "thumb_200";

/// Insertion-ordered map of collection name to policy.
///
/// Registering a name twice replaces the earlier policy in place: lookups see the
/// later registration, iteration keeps the position of the first one.
#[derive(Debug, Clone, Default)]
pub struct CollectionRegistry {
    defaults: CollectionDefaults,
    policies: Vec<CollectionPolicy>,
    index: HashMap<String, usize>,
}

impl CollectionRegistry {
    pub fn new(defaults: CollectionDefaults) -> Self {
        Self {
            defaults,
            policies: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn defaults(&self) -> &CollectionDefaults {
        &self.defaults
    }

    pub fn register(&mut self, name: impl Into<String>) -> &mut CollectionPolicy {
        let name = name.into();
        let policy = CollectionPolicy::new(name.clone(), &self.defaults);

        let position = match self.index.get(&name) {
            Some(&position) => {
                tracing::warn!(collection = %name, "Collection registered twice, keeping the later registration");
                self.policies[position] = policy;
                position
            }
            None => {
                self.policies.push(policy);
                self.index.insert(name, self.policies.len() - 1);
                self.policies.len() - 1
            }
        };

        &mut self.policies[position]
    }

    pub fn get(&self, name: &str) -> Option<&CollectionPolicy> {
        self.index.get(name).map(|&position| &self.policies[position])
    }

    /// Policies in registration order.
    pub fn all(&self) -> impl Iterator<Item = &CollectionPolicy> {
        self.policies.iter()
    }

    pub fn image_collections(&self) -> impl Iterator<Item = &CollectionPolicy> {
        self.policies.iter().filter(|policy| policy.is_image())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    Crop,
    Contain,
}

/// A derived file (thumbnail etc.) declared for some collections.
///
/// Only the declaration is tracked; rendering happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub fit: Fit,
    pub collections: Vec<String>,
}

impl Conversion {
    pub fn applies_to(&self, collection: &str) -> bool {
        self.collections.iter().any(|c| c == collection)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversionRegistry {
    conversions: Vec<Conversion>,
}

impl ConversionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conversion: Conversion) {
        self.conversions.push(conversion);
    }

    /// Register a 200x200 crop for every image collection.
    pub fn auto_register_thumb_200(&mut self, registry: &CollectionRegistry) {
        for policy in registry.image_collections() {
            self.add(Conversion {
                name: THUMB_200.to_string(),
                width: 200,
                height: 200,
                fit: Fit::Crop,
                collections: vec![policy.name().to_string()],
            });
        }
    }

    pub fn for_collection<'a>(&'a self, collection: &'a str) -> impl Iterator<Item = &'a Conversion> {
        self.conversions
            .iter()
            .filter(move |conversion| conversion.applies_to(collection))
    }

    pub fn has(&self, collection: &str, conversion: &str) -> bool {
        self.for_collection(collection)
            .any(|candidate| candidate.name == conversion)
    }
}
