//! Value rewriting on the way in (input transformers) and out (list rendering).

use crate::model::{DatabaseEntry, DbValue, FormPostEntry, Resource};
use serde_json::{Map, Value};

/// Field carrying the row identifier in list rows.
pub const ROW_ID: &str = "DT_RowId";

/// Replace each editable value whose column has an input transformer. Key values are
/// left alone. Call once, after validation succeeded.
pub fn apply_input_transformers(entry: &mut FormPostEntry) {
    for (column, value) in entry.values_mut() {
        if let Some(transform) = &column.input_transformer {
            let transformed = transform(value.as_str());
            *value = transformed;
        }
    }
}

/// Key values of `row` joined by `/`, in key column order.
pub fn row_id(resource: &Resource, row: &DatabaseEntry) -> String {
    resource
        .primary_keys()
        .iter()
        .map(|k| row.get(&k.name).map(DbValue::to_string).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("/")
}

/// Render rows for the list page: index columns only, output transformers applied,
/// plus the row identifier.
pub fn transform_database_results(resource: &Resource, rows: &[DatabaseEntry]) -> Vec<Map<String, Value>> {
    rows.iter()
        .map(|row| {
            let mut out = Map::new();
            for name in resource.index_columns() {
                let value = row.get(name).unwrap_or(&DbValue::Null);
                let rendered = match resource.column(name).and_then(|c| c.output_transformer.as_ref()) {
                    Some(transform) => Value::String(transform(value)),
                    None => value.to_json(),
                };
                out.insert(name.clone(), rendered);
            }
            out.insert(ROW_ID.to_string(), Value::String(row_id(resource, row)));
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{labels_transformer, named_transformer, ColumnSettings, ResourceConfig, TransformName};
    use crate::model::{ColumnDefinition, ColumnType};
    use crate::service::InMemoryDao;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn resource() -> Resource {
        let columns = vec![
            ColumnDefinition::key("region", ColumnType::String),
            ColumnDefinition::key("code", ColumnType::Integer),
            ColumnDefinition::new("password", ColumnType::String),
            ColumnDefinition::new("status", ColumnType::String),
        ];
        let labels = HashMap::from([("a".to_string(), "Active".to_string())]);
        let config = ResourceConfig {
            index_columns: Some(vec!["code".into(), "status".into()]),
            columns: vec![
                (
                    "password".into(),
                    ColumnSettings {
                        input_transformer: Some(named_transformer(TransformName::Uppercase)),
                        ..ColumnSettings::default()
                    },
                ),
                (
                    "status".into(),
                    ColumnSettings {
                        output_transformer: Some(labels_transformer(labels)),
                        ..ColumnSettings::default()
                    },
                ),
            ],
            ..ResourceConfig::default()
        };
        Resource::build("areas", columns, config, |schema| Arc::new(InMemoryDao::new(schema))).unwrap()
    }

    #[test]
    fn input_transformers_skip_keys_and_untransformed_columns() {
        let r = resource();
        let mut entry = FormPostEntry::new(r.schema().clone());
        entry.set("region", "north").unwrap();
        entry.set("password", "secret").unwrap();
        entry.set("status", "a").unwrap();
        apply_input_transformers(&mut entry);
        assert_eq!(entry.key_value("region"), Some("north"));
        assert_eq!(entry.value("password"), Some("SECRET"));
        assert_eq!(entry.value("status"), Some("a"));
    }

    #[test]
    fn list_rows_carry_index_columns_labels_and_row_id() {
        let r = resource();
        let row: DatabaseEntry = vec![
            ("region".to_string(), DbValue::Text("north".into())),
            ("code".to_string(), DbValue::Integer(7)),
            ("password".to_string(), DbValue::Text("x".into())),
            ("status".to_string(), DbValue::Text("a".into())),
        ]
        .into_iter()
        .collect();
        let out = transform_database_results(&r, &[row]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["code"], Value::from(7));
        assert_eq!(out[0]["status"], Value::from("Active"));
        assert_eq!(out[0][ROW_ID], Value::from("north/7"));
        assert!(!out[0].contains_key("password"));
    }
}
