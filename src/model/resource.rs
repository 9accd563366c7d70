//! Resource: the runtime representation of one managed table.

use crate::config::{validate_resource_config, ResourceConfig};
use crate::error::{ConfigError, InvalidInput};
use crate::model::{ColumnDefinition, FormPostEntry, InputKind, ValidationMode};
use crate::service::DataAccess;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Resource-level hook run before or after per-column validation. May reject the
/// submission or mutate it (e.g. derive one field from another).
pub type ValidationHook =
    Arc<dyn Fn(ValidationMode, &mut FormPostEntry) -> Result<(), InvalidInput> + Send + Sync>;

pub fn validation_hook<F>(f: F) -> ValidationHook
where
    F: Fn(ValidationMode, &mut FormPostEntry) -> Result<(), InvalidInput> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Rows per list page unless configured otherwise.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Table name and its frozen column definitions, shared by a resource and its DAO.
#[derive(Debug)]
pub struct TableSchema {
    table_name: String,
    columns: Vec<Arc<ColumnDefinition>>,
}

impl TableSchema {
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Result<Self, ConfigError> {
        let table_name = table_name.into();
        if table_name.trim().is_empty() {
            return Err(ConfigError::EmptyTableName);
        }
        let mut seen = HashSet::new();
        for c in &columns {
            if !seen.insert(c.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate column {} on table {}",
                    c.name, table_name
                )));
            }
        }
        Ok(TableSchema {
            table_name,
            columns: columns.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[Arc<ColumnDefinition>] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Arc<ColumnDefinition>> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Key columns in column order. This order fixes the layout of compound identifiers.
    pub fn primary_keys(&self) -> Vec<&Arc<ColumnDefinition>> {
        self.columns.iter().filter(|c| c.key_column).collect()
    }

    pub fn editable_columns(&self) -> Vec<&Arc<ColumnDefinition>> {
        self.columns.iter().filter(|c| c.editable).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormInput {
    pub name: String,
    pub kind: InputKind,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FormGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    pub inputs: Vec<FormInput>,
}

pub struct Resource {
    schema: Arc<TableSchema>,
    index_columns: Vec<String>,
    form_layout: Vec<FormGroup>,
    per_page: u32,
    before_validation: Option<ValidationHook>,
    after_validation: Option<ValidationHook>,
    dao: Arc<dyn DataAccess>,
}

impl Resource {
    /// Build a resource from introspected columns.
    ///
    /// Every non-key column starts out editable and every column is shown on the
    /// list page; `config` then overrides those defaults. `make_dao` receives the
    /// frozen schema so the data access object is bound to exactly these columns.
    pub fn build<F>(
        table_name: &str,
        mut columns: Vec<ColumnDefinition>,
        config: ResourceConfig,
        make_dao: F,
    ) -> Result<Resource, ConfigError>
    where
        F: FnOnce(Arc<TableSchema>) -> Arc<dyn DataAccess>,
    {
        validate_resource_config(table_name, &columns, &config)?;

        for c in columns.iter_mut() {
            tracing::trace!(table = %table_name, column = %c.name, "adding default column settings");
            c.editable = match &config.editable_columns {
                Some(names) => names.iter().any(|n| *n == c.name),
                None => !c.key_column,
            };
        }
        for (name, settings) in config.columns {
            if let Some(c) = columns.iter_mut().find(|c| c.name == name) {
                c.rules.extend(settings.rules);
                if settings.input_transformer.is_some() {
                    c.input_transformer = settings.input_transformer;
                }
                if settings.output_transformer.is_some() {
                    c.output_transformer = settings.output_transformer;
                }
            }
        }

        let index_columns = config
            .index_columns
            .unwrap_or_else(|| columns.iter().map(|c| c.name.clone()).collect());
        let form_layout = vec![FormGroup {
            header: None,
            inputs: columns
                .iter()
                .filter(|c| c.editable)
                .map(|c| FormInput {
                    name: c.name.clone(),
                    kind: c.column_type.input_kind(),
                })
                .collect(),
        }];

        let schema = Arc::new(TableSchema::new(table_name, columns)?);
        let dao = make_dao(schema.clone());
        Ok(Resource {
            schema,
            index_columns,
            form_layout,
            per_page: config.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1),
            before_validation: config.before_validation,
            after_validation: config.after_validation,
            dao,
        })
    }

    pub fn table_name(&self) -> &str {
        self.schema.table_name()
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn columns(&self) -> &[Arc<ColumnDefinition>] {
        self.schema.columns()
    }

    pub fn column(&self, name: &str) -> Option<&Arc<ColumnDefinition>> {
        self.schema.column(name)
    }

    pub fn primary_keys(&self) -> Vec<&Arc<ColumnDefinition>> {
        self.schema.primary_keys()
    }

    pub fn editable_columns(&self) -> Vec<&Arc<ColumnDefinition>> {
        self.schema.editable_columns()
    }

    pub fn index_columns(&self) -> &[String] {
        &self.index_columns
    }

    pub fn form_layout(&self) -> &[FormGroup] {
        &self.form_layout
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn before_validation(&self) -> Option<&ValidationHook> {
        self.before_validation.as_ref()
    }

    pub fn after_validation(&self) -> Option<&ValidationHook> {
        self.after_validation.as_ref()
    }

    pub fn dao(&self) -> &dyn DataAccess {
        self.dao.as_ref()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("schema", &self.schema)
            .field("index_columns", &self.index_columns)
            .field("form_layout", &self.form_layout)
            .field("per_page", &self.per_page)
            .finish_non_exhaustive()
    }
}
