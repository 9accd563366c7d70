//! Column metadata: type, role and per-column behaviour.

use crate::error::InvalidInput;
use crate::model::{ColumnType, DbValue};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// User-supplied rule with the same contract as the built-in ones.
pub type CustomRule = Arc<dyn Fn(&ColumnDefinition, &str) -> Result<(), InvalidInput> + Send + Sync>;

/// Rewrites a validated raw value before it is persisted (e.g. hashing a password).
pub type InputTransformer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Renders a stored value for the list page (e.g. a code to a friendly label).
pub type OutputTransformer = Arc<dyn Fn(&DbValue) -> String + Send + Sync>;

/// Validation applied to the raw string submitted for a column.
#[derive(Clone)]
pub enum ValidationRule {
    /// Fails on blank input.
    Required,
    /// Fails on blank input or fewer characters.
    MinimumLength(usize),
    MaximumLength(usize),
    /// Fails when non-blank input does not match.
    Pattern(Regex),
    Custom(CustomRule),
}

impl ValidationRule {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&ColumnDefinition, &str) -> Result<(), InvalidInput> + Send + Sync + 'static,
    {
        ValidationRule::Custom(Arc::new(f))
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationRule::Required => f.write_str("Required"),
            ValidationRule::MinimumLength(n) => write!(f, "MinimumLength({})", n),
            ValidationRule::MaximumLength(n) => write!(f, "MaximumLength({})", n),
            ValidationRule::Pattern(re) => write!(f, "Pattern({})", re.as_str()),
            ValidationRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Describes one column of a resource.
///
/// Created by a schema provider, adjusted by resource configuration, then frozen
/// behind an `Arc` for the lifetime of the process.
#[derive(Clone)]
pub struct ColumnDefinition {
    /// Case sensitive, unique within a resource.
    pub name: String,
    pub column_type: ColumnType,
    /// Type name as reported by the catalog, used to cast bound parameters.
    pub native_type: Option<String>,
    /// Part of the row identifier.
    pub key_column: bool,
    /// May be supplied by users through create/edit forms.
    pub editable: bool,
    pub rules: Vec<ValidationRule>,
    pub input_transformer: Option<InputTransformer>,
    pub output_transformer: Option<OutputTransformer>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnDefinition {
            name: name.into(),
            column_type,
            native_type: None,
            key_column: false,
            editable: false,
            rules: Vec::new(),
            input_transformer: None,
            output_transformer: None,
        }
    }

    pub fn key(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnDefinition {
            key_column: true,
            ..ColumnDefinition::new(name, column_type)
        }
    }

    pub fn native_type(&self) -> Option<&str> {
        self.native_type.as_deref()
    }
}

impl fmt::Debug for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDefinition")
            .field("name", &self.name)
            .field("column_type", &self.column_type)
            .field("native_type", &self.native_type)
            .field("key_column", &self.key_column)
            .field("editable", &self.editable)
            .field("rules", &self.rules)
            .field("input_transformer", &self.input_transformer.is_some())
            .field("output_transformer", &self.output_transformer.is_some())
            .finish()
    }
}
