//! Raw resource configuration as read from JSON files.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRuleConfig {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Built-in input transformers selectable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformName {
    Trim,
    Lowercase,
    Uppercase,
    /// Hex encoded SHA-256 digest, e.g. for password columns.
    Sha256,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ColumnFileConfig {
    #[serde(default)]
    pub rules: ValidationRuleConfig,
    #[serde(default)]
    pub input_transform: Option<TransformName>,
    /// Stored value to display label on the list page. Unlisted values are shown as-is.
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,
}

/// Column declared in configuration instead of introspected.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticColumnConfig {
    pub name: String,
    /// Native type name, canonicalized like an introspected one.
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub key: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceFileConfig {
    pub table: String,
    #[serde(default)]
    pub editable: Option<Vec<String>>,
    #[serde(default)]
    pub index_columns: Option<Vec<String>>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnFileConfig>,
    /// When present the table is not introspected.
    #[serde(default)]
    pub schema: Option<Vec<StaticColumnConfig>>,
}
