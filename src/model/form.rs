//! Parsed and filtered representation of one user submission.

use crate::error::InvalidInput;
use crate::model::{ColumnDefinition, Resource, TableSchema};
use std::sync::Arc;

/// Whether a submission creates a new row or edits an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Edit,
}

type Slot = (Arc<ColumnDefinition>, String);

/// Key values and editable values of one submission, each in insertion order.
#[derive(Clone, Debug)]
pub struct FormPostEntry {
    schema: Arc<TableSchema>,
    key_values: Vec<Slot>,
    values: Vec<Slot>,
}

impl FormPostEntry {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        FormPostEntry {
            schema,
            key_values: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Keep only parameters naming a key or editable column of `resource`.
    ///
    /// When a name was submitted more than once the first value wins. Columns not
    /// submitted stay absent, so an update only touches what was sent.
    pub fn extract(resource: &Resource, params: &[(String, String)]) -> Self {
        let mut entry = FormPostEntry::new(resource.schema().clone());
        for column in resource.columns() {
            if !column.key_column && !column.editable {
                continue;
            }
            let Some((_, value)) = params.iter().find(|(k, _)| *k == column.name) else {
                continue;
            };
            if column.key_column {
                entry.add_key_value(column.clone(), value.clone());
            } else {
                entry.add_value(column.clone(), value.clone());
            }
        }
        entry
    }

    pub fn table_schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn key_values(&self) -> &[(Arc<ColumnDefinition>, String)] {
        &self.key_values
    }

    pub fn values(&self) -> &[(Arc<ColumnDefinition>, String)] {
        &self.values
    }

    pub fn key_value(&self, name: &str) -> Option<&str> {
        lookup(&self.key_values, name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        lookup(&self.values, name)
    }

    pub fn add_key_value(&mut self, column: Arc<ColumnDefinition>, value: impl Into<String>) {
        upsert(&mut self.key_values, column, value.into());
    }

    pub fn add_value(&mut self, column: Arc<ColumnDefinition>, value: impl Into<String>) {
        upsert(&mut self.values, column, value.into());
    }

    /// Set a value by column name, routed to the key or value side by the column's role.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), InvalidInput> {
        let column = self
            .schema
            .column(name)
            .cloned()
            .ok_or_else(|| InvalidInput::Rejected(format!("unknown column {}", name)))?;
        if column.key_column {
            self.add_key_value(column, value);
        } else {
            self.add_value(column, value);
        }
        Ok(())
    }

    pub fn remove_value(&mut self, name: &str) -> Option<String> {
        let pos = self.values.iter().position(|(c, _)| c.name == name)?;
        Some(self.values.remove(pos).1)
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = (&Arc<ColumnDefinition>, &mut String)> {
        self.values.iter_mut().map(|(c, v)| (&*c, v))
    }

    /// Column name to submitted value, keys first.
    pub fn to_properties_map(&self) -> Vec<(String, String)> {
        self.key_values
            .iter()
            .chain(self.values.iter())
            .map(|(c, v)| (c.name.clone(), v.clone()))
            .collect()
    }
}

fn lookup<'a>(slots: &'a [Slot], name: &str) -> Option<&'a str> {
    slots.iter().find(|(c, _)| c.name == name).map(|(_, v)| v.as_str())
}

fn upsert(slots: &mut Vec<Slot>, column: Arc<ColumnDefinition>, value: String) {
    match slots.iter_mut().find(|(c, _)| c.name == column.name) {
        Some(slot) => slot.1 = value,
        None => slots.push((column, value)),
    }
}
