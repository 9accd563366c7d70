//! Config validation: every referenced column must exist on the table.

use crate::config::ResourceConfig;
use crate::error::ConfigError;
use crate::model::ColumnDefinition;
use std::collections::HashSet;

pub fn validate_resource_config(
    table: &str,
    columns: &[ColumnDefinition],
    config: &ResourceConfig,
) -> Result<(), ConfigError> {
    if table.trim().is_empty() {
        return Err(ConfigError::EmptyTableName);
    }
    let names: HashSet<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let check = |column: &str| {
        if names.contains(column) {
            Ok(())
        } else {
            Err(ConfigError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
        }
    };

    for c in config.editable_columns.iter().flatten() {
        check(c)?;
    }
    if let Some(index) = &config.index_columns {
        if index.is_empty() {
            return Err(ConfigError::Validation(format!(
                "table {}: index columns must not be empty",
                table
            )));
        }
        for c in index {
            check(c)?;
        }
    }
    for (c, _) in &config.columns {
        check(c)?;
    }
    if config.per_page == Some(0) {
        return Err(ConfigError::Validation(format!("table {}: per_page must be positive", table)));
    }
    Ok(())
}
