//! Canonical column types and the native type alias registry.

use crate::error::CoercionError;
use crate::model::DbValue;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Textual timestamp pattern accepted for `Datetime` input and used when rendering.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Closed set of column types the engine understands, independent of the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Boolean,
    Datetime,
    /// Bounded text.
    String,
    /// Unbounded text.
    Text,
}

/// How a column is presented on the create/edit form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Checkbox,
    MultiLine,
    DateTime,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Boolean => "boolean",
            ColumnType::Datetime => "datetime",
            ColumnType::String => "string",
            ColumnType::Text => "text",
        }
    }

    pub fn input_kind(self) -> InputKind {
        match self {
            ColumnType::Boolean => InputKind::Checkbox,
            ColumnType::Text => InputKind::MultiLine,
            ColumnType::Datetime => InputKind::DateTime,
            ColumnType::Integer | ColumnType::String => InputKind::Text,
        }
    }

    /// Parse raw user input for a column of this type. Empty input is `Null`.
    pub fn parse(self, column: &str, raw: &str) -> Result<DbValue, CoercionError> {
        if raw.is_empty() {
            return Ok(DbValue::Null);
        }
        let fail = || CoercionError {
            column: column.to_string(),
            expected: self.as_str(),
            value: raw.to_string(),
        };
        Ok(match self {
            ColumnType::Integer => DbValue::Integer(raw.trim().parse::<i64>().map_err(|_| fail())?),
            ColumnType::Boolean => {
                let v = raw.trim();
                if v.eq_ignore_ascii_case("true") {
                    DbValue::Boolean(true)
                } else if v.eq_ignore_ascii_case("false") {
                    DbValue::Boolean(false)
                } else {
                    return Err(fail());
                }
            }
            ColumnType::Datetime => DbValue::Datetime(
                NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT).map_err(|_| fail())?,
            ),
            ColumnType::String | ColumnType::Text => DbValue::Text(raw.to_string()),
        })
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const BUILTIN_ALIASES: &[(&str, ColumnType)] = &[
    ("int", ColumnType::Integer),
    ("int unsigned", ColumnType::Integer),
    ("int2", ColumnType::Integer),
    ("int4", ColumnType::Integer),
    ("int8", ColumnType::Integer),
    ("int32", ColumnType::Integer),
    ("smallint", ColumnType::Integer),
    ("integer", ColumnType::Integer),
    ("bigint", ColumnType::Integer),
    ("bigint unsigned", ColumnType::Integer),
    ("serial", ColumnType::Integer),
    ("serial4", ColumnType::Integer),
    ("serial8", ColumnType::Integer),
    ("smallserial", ColumnType::Integer),
    ("bigserial", ColumnType::Integer),
    ("bool", ColumnType::Boolean),
    ("boolean", ColumnType::Boolean),
    ("tinyint", ColumnType::Boolean),
    ("bit", ColumnType::Boolean),
    ("datetime", ColumnType::Datetime),
    ("timestamp", ColumnType::Datetime),
    ("timestamptz", ColumnType::Datetime),
    ("timestamp without time zone", ColumnType::Datetime),
    ("timestamp with time zone", ColumnType::Datetime),
    ("date", ColumnType::Datetime),
    ("varchar", ColumnType::String),
    ("character varying", ColumnType::String),
    ("char", ColumnType::String),
    ("character", ColumnType::String),
    ("bpchar", ColumnType::String),
    ("uuid", ColumnType::String),
    ("citext", ColumnType::String),
    ("text", ColumnType::Text),
    ("json", ColumnType::Text),
    ("jsonb", ColumnType::Text),
    ("xml", ColumnType::Text),
];

/// Read-only lookup from native database type names to canonical types.
///
/// Built once at startup (optionally extended with [`ColumnTypeRegistry::with_alias`])
/// and handed to schema providers; never mutated while serving.
#[derive(Clone, Debug)]
pub struct ColumnTypeRegistry {
    aliases: HashMap<String, ColumnType>,
}

impl Default for ColumnTypeRegistry {
    fn default() -> Self {
        ColumnTypeRegistry {
            aliases: BUILTIN_ALIASES
                .iter()
                .map(|(name, ty)| (name.to_string(), *ty))
                .collect(),
        }
    }
}

impl ColumnTypeRegistry {
    /// Map an additional native type name (case-insensitive).
    pub fn with_alias(mut self, native: &str, column_type: ColumnType) -> Self {
        self.aliases.insert(normalize(native), column_type);
        self
    }

    pub fn lookup(&self, native: &str) -> Option<ColumnType> {
        self.aliases.get(&normalize(native)).copied()
    }

    /// Canonical type for a native type name. Unknown names degrade to `String`.
    pub fn canonicalize(&self, native: &str) -> ColumnType {
        match self.lookup(native) {
            Some(t) => t,
            None => {
                tracing::warn!(native_type = %native, "unsupported column type, treating as string");
                ColumnType::String
            }
        }
    }
}

fn normalize(native: &str) -> String {
    native.trim().to_lowercase()
}
