//! Resolved configuration: plain structs applied while building resources, and the
//! registry of built resources used at runtime.

use crate::error::ConfigError;
use crate::model::{InputTransformer, OutputTransformer, Resource, ValidationHook, ValidationRule};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-column additions applied on top of the introspected definition.
#[derive(Clone, Default)]
pub struct ColumnSettings {
    pub rules: Vec<ValidationRule>,
    pub input_transformer: Option<InputTransformer>,
    pub output_transformer: Option<OutputTransformer>,
}

/// Overrides for the defaults derived from a table's schema.
#[derive(Clone, Default)]
pub struct ResourceConfig {
    /// Replaces the default editable set (every non-key column).
    pub editable_columns: Option<Vec<String>>,
    /// Replaces the default list page columns (every column).
    pub index_columns: Option<Vec<String>>,
    pub per_page: Option<u32>,
    pub columns: Vec<(String, ColumnSettings)>,
    pub before_validation: Option<ValidationHook>,
    pub after_validation: Option<ValidationHook>,
}

/// All resources being served, keyed by table name. Built at startup, read-only afterwards.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: Vec<Arc<Resource>>,
    by_name: HashMap<String, usize>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: Resource) -> Result<(), ConfigError> {
        let name = resource.table_name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(ConfigError::DuplicateResource(name));
        }
        self.by_name.insert(name, self.resources.len());
        self.resources.push(Arc::new(resource));
        Ok(())
    }

    pub fn resource(&self, name: &str) -> Option<&Arc<Resource>> {
        self.by_name.get(name).map(|&i| &self.resources[i])
    }

    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.table_name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
