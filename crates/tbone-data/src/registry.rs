//! The model registry.
//!
//! Reference fields name their target model instead of holding it, so model
//! types register their schema here under their model name. The global
//! [`MODELS`] registry is what [`DbRefField::new`](crate::fields::DbRefField::new)
//! and [`SchemaBuilder::register`](crate::model::SchemaBuilder::register) use.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::model::ModelSchema;

/// A thread-safe map of model name to schema.
///
/// # Examples
///
/// ```
/// use tbone_data::model::ModelSchema;
/// use tbone_data::registry::ModelRegistry;
///
/// let registry = ModelRegistry::new();
/// let movie = ModelSchema::builder("Movie").build().unwrap();
/// registry.register(movie);
///
/// assert!(registry.is_registered("Movie"));
/// assert_eq!(registry.get("Movie").unwrap().name(), "Movie");
/// ```
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: RwLock<HashMap<String, Arc<ModelSchema>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its model name, returning the schema it
    /// replaced, if any.
    pub fn register(&self, schema: Arc<ModelSchema>) -> Option<Arc<ModelSchema>> {
        let name = schema.name().to_string();
        let previous = self
            .models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), schema);
        if previous.is_some() {
            tracing::debug!(model = %name, "replaced registered model");
        } else {
            tracing::debug!(model = %name, "registered model");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModelSchema>> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<ModelSchema>> {
        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Registered model names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// The global model registry.
pub static MODELS: Lazy<ModelRegistry> = Lazy::new(ModelRegistry::new);
