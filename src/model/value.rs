//! Decoded cell values and rows.

use crate::model::column_type::DATETIME_FORMAT;
use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::cmp::Ordering;

/// One decoded cell, tagged with the canonical type it was decoded as.
#[derive(Clone, Debug, PartialEq)]
pub enum DbValue {
    Null,
    Integer(i64),
    Boolean(bool),
    Datetime(NaiveDateTime),
    Text(String),
}

impl DbValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DbValue::Null)
    }

    pub fn to_json(&self) -> Value {
        match self {
            DbValue::Null => Value::Null,
            DbValue::Integer(n) => Value::Number((*n).into()),
            DbValue::Boolean(b) => Value::Bool(*b),
            DbValue::Datetime(_) | DbValue::Text(_) => Value::String(self.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            DbValue::Boolean(_) => 0,
            DbValue::Integer(_) => 1,
            DbValue::Datetime(_) => 2,
            DbValue::Text(_) => 3,
            DbValue::Null => 4,
        }
    }

    /// Total order used for in-memory sorting. Nulls sort last, as PostgreSQL does
    /// for an ascending `ORDER BY`; reversing the comparison puts them first.
    pub fn sort_cmp(&self, other: &DbValue) -> Ordering {
        match (self, other) {
            (DbValue::Integer(a), DbValue::Integer(b)) => a.cmp(b),
            (DbValue::Boolean(a), DbValue::Boolean(b)) => a.cmp(b),
            (DbValue::Datetime(a), DbValue::Datetime(b)) => a.cmp(b),
            (DbValue::Text(a), DbValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::fmt::Display for DbValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbValue::Null => Ok(()),
            DbValue::Integer(n) => write!(f, "{}", n),
            DbValue::Boolean(b) => write!(f, "{}", b),
            DbValue::Datetime(d) => write!(f, "{}", d.format(DATETIME_FORMAT)),
            DbValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for DbValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DbValue::Null => serializer.serialize_none(),
            DbValue::Integer(n) => serializer.serialize_i64(*n),
            DbValue::Boolean(b) => serializer.serialize_bool(*b),
            DbValue::Datetime(_) => serializer.collect_str(self),
            DbValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// One persisted row: column name to decoded value, in select order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatabaseEntry {
    properties: Vec<(String, DbValue)>,
}

impl DatabaseEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&DbValue> {
        self.properties.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Set a property, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: DbValue) {
        let name = name.into();
        match self.properties.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DbValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl FromIterator<(String, DbValue)> for DatabaseEntry {
    fn from_iter<I: IntoIterator<Item = (String, DbValue)>>(iter: I) -> Self {
        let mut entry = DatabaseEntry::new();
        for (k, v) in iter {
            entry.insert(k, v);
        }
        entry
    }
}

impl Serialize for DatabaseEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len()))?;
        for (k, v) in &self.properties {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
