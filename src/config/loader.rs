//! Load resource configuration files and build the resource registry from them.

use crate::config::types::*;
use crate::config::{ColumnSettings, ResourceConfig, ResourceRegistry};
use crate::error::{AppError, ConfigError};
use crate::model::{
    ColumnDefinition, ColumnTypeRegistry, DbValue, InputTransformer, OutputTransformer, Resource,
    ValidationRule,
};
use crate::schema::{PgSchemaProvider, SchemaProvider, StaticSchemaProvider};
use crate::service::{DataAccess, GenericSqlDao, InMemoryDao};
use regex::Regex;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Read every `*.json` file in `dir`, in file name order. Each file holds one resource.
pub async fn load_resource_files(dir: &Path) -> Result<Vec<ResourceFileConfig>, ConfigError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", dir.display(), e)))?;
    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", dir.display(), e)))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut configs = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        let config: ResourceFileConfig = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), table = %config.table, "loaded resource config");
        configs.push(config);
    }
    Ok(configs)
}

pub fn named_transformer(name: TransformName) -> InputTransformer {
    match name {
        TransformName::Trim => Arc::new(|s: &str| s.trim().to_string()),
        TransformName::Lowercase => Arc::new(|s: &str| s.to_lowercase()),
        TransformName::Uppercase => Arc::new(|s: &str| s.to_uppercase()),
        TransformName::Sha256 => Arc::new(|s: &str| format!("{:x}", Sha256::digest(s.as_bytes()))),
    }
}

pub fn labels_transformer(labels: HashMap<String, String>) -> OutputTransformer {
    Arc::new(move |value: &DbValue| {
        let raw = value.to_string();
        labels.get(&raw).cloned().unwrap_or(raw)
    })
}

impl ResourceFileConfig {
    pub fn to_resource_config(&self) -> Result<ResourceConfig, ConfigError> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for (name, column) in &self.columns {
            let mut rules = Vec::new();
            if column.rules.required == Some(true) {
                rules.push(ValidationRule::Required);
            }
            if let Some(n) = column.rules.min_length {
                rules.push(ValidationRule::MinimumLength(n as usize));
            }
            if let Some(n) = column.rules.max_length {
                rules.push(ValidationRule::MaximumLength(n as usize));
            }
            if let Some(pattern) = &column.rules.pattern {
                let re = Regex::new(pattern).map_err(|e| {
                    ConfigError::Validation(format!(
                        "table {} column {}: invalid pattern: {}",
                        self.table, name, e
                    ))
                })?;
                rules.push(ValidationRule::Pattern(re));
            }
            columns.push((
                name.clone(),
                ColumnSettings {
                    rules,
                    input_transformer: column.input_transform.map(named_transformer),
                    output_transformer: column.labels.clone().map(labels_transformer),
                },
            ));
        }
        Ok(ResourceConfig {
            editable_columns: self.editable.clone(),
            index_columns: self.index_columns.clone(),
            per_page: self.per_page,
            columns,
            before_validation: None,
            after_validation: None,
        })
    }

    /// Column definitions declared in the file, if any. Declared type names may be
    /// pseudo types such as `serial`, so they are never used as parameter casts.
    pub fn static_columns(&self, types: &ColumnTypeRegistry) -> Option<Vec<ColumnDefinition>> {
        let schema = self.schema.as_ref()?;
        Some(
            schema
                .iter()
                .map(|c| {
                    let column_type = types.canonicalize(&c.type_);
                    if c.key {
                        ColumnDefinition::key(&c.name, column_type)
                    } else {
                        ColumnDefinition::new(&c.name, column_type)
                    }
                })
                .collect(),
        )
    }
}

impl ResourceRegistry {
    /// Introspect and build one resource per file, each bound to a SQL data access object.
    pub async fn load_postgres(
        pool: &PgPool,
        types: &ColumnTypeRegistry,
        files: &[ResourceFileConfig],
    ) -> Result<Self, AppError> {
        let mut registry = ResourceRegistry::new();
        for file in files {
            let (table, columns) = match file.static_columns(types) {
                Some(columns) => (
                    file.table.clone(),
                    StaticSchemaProvider::new(columns).column_definitions().await?,
                ),
                None => {
                    let provider = PgSchemaProvider::new(pool.clone(), &file.table, types.clone());
                    (provider.table_name().await?, provider.column_definitions().await?)
                }
            };
            let pool = pool.clone();
            let resource = Resource::build(&table, columns, file.to_resource_config()?, move |schema| {
                Arc::new(GenericSqlDao::new(pool, schema)) as Arc<dyn DataAccess>
            })?;
            tracing::info!(table = %table, columns = resource.columns().len(), "resource ready");
            registry.insert(resource)?;
        }
        Ok(registry)
    }

    /// Build resources backed by [`InMemoryDao`]. Every file must declare its schema.
    pub fn load_in_memory(types: &ColumnTypeRegistry, files: &[ResourceFileConfig]) -> Result<Self, ConfigError> {
        let mut registry = ResourceRegistry::new();
        for file in files {
            let columns = file.static_columns(types).ok_or_else(|| {
                ConfigError::Validation(format!("table {}: in-memory resources need a schema", file.table))
            })?;
            let resource = Resource::build(&file.table, columns, file.to_resource_config()?, |schema| {
                Arc::new(InMemoryDao::new(schema)) as Arc<dyn DataAccess>
            })?;
            registry.insert(resource)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnType;

    const LOCATIONS: &str = r#"{
        "table": "locations",
        "index_columns": ["id", "name", "active"],
        "per_page": 10,
        "columns": {
            "name": { "rules": { "required": true, "max_length": 40 }, "input_transform": "trim" },
            "active": { "labels": { "true": "Yes", "false": "No" } }
        },
        "schema": [
            { "name": "id", "type": "serial", "key": true },
            { "name": "name", "type": "varchar" },
            { "name": "favorite_number", "type": "int4" },
            { "name": "active", "type": "bool" }
        ]
    }"#;

    fn locations() -> ResourceFileConfig {
        serde_json::from_str(LOCATIONS).unwrap()
    }

    #[test]
    fn file_config_converts_rules_and_transformers() {
        let config = locations().to_resource_config().unwrap();
        assert_eq!(config.per_page, Some(10));
        let (_, active) = config.columns.iter().find(|(n, _)| n == "active").unwrap();
        let label = active.output_transformer.as_ref().unwrap();
        assert_eq!(label(&DbValue::Boolean(true)), "Yes");
        assert_eq!(label(&DbValue::Null), "");
        let (_, name) = config.columns.iter().find(|(n, _)| n == "name").unwrap();
        assert_eq!(name.rules.len(), 2);
        assert_eq!((name.input_transformer.as_ref().unwrap())("  x "), "x");
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let mut file = locations();
        file.columns.get_mut("name").unwrap().rules.pattern = Some("(".into());
        assert!(matches!(file.to_resource_config(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn sha256_transformer_hex_encodes() {
        let t = named_transformer(TransformName::Sha256);
        assert_eq!(
            t("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn static_columns_are_canonicalized() {
        let columns = locations().static_columns(&ColumnTypeRegistry::default()).unwrap();
        assert_eq!(columns[0].column_type, ColumnType::Integer);
        assert!(columns[0].key_column);
        assert_eq!(columns[1].column_type, ColumnType::String);
        assert_eq!(columns[1].native_type(), None);
        assert_eq!(columns[3].column_type, ColumnType::Boolean);
    }

    #[test]
    fn in_memory_registry_requires_schema() {
        let mut file = locations();
        let registry = ResourceRegistry::load_in_memory(&ColumnTypeRegistry::default(), &[file.clone()]).unwrap();
        let resource = registry.resource("locations").unwrap();
        assert_eq!(resource.index_columns().len(), 3);
        assert!(resource.before_validation().is_none());

        file.schema = None;
        assert!(ResourceRegistry::load_in_memory(&ColumnTypeRegistry::default(), &[file]).is_err());
    }

    #[test]
    fn duplicate_tables_are_rejected() {
        let file = locations();
        let err = ResourceRegistry::load_in_memory(&ColumnTypeRegistry::default(), &[file.clone(), file])
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateResource(ref t) if t == "locations"));
    }

    #[tokio::test]
    async fn loads_json_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_locations.json"), LOCATIONS).unwrap();
        std::fs::write(dir.path().join("a_people.json"), r#"{"table": "people"}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let files = load_resource_files(dir.path()).await.unwrap();
        let tables: Vec<_> = files.iter().map(|f| f.table.as_str()).collect();
        assert_eq!(tables, vec!["people", "locations"]);
    }

    #[tokio::test]
    async fn malformed_file_names_its_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let err = load_resource_files(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
