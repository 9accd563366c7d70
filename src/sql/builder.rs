//! Builds parameterized SELECT, INSERT, UPDATE, DELETE and COUNT for any table schema.
//! Identifiers come from the schema only and are always quoted; values are always parameters.

use crate::error::DataAccessError;
use crate::model::{ColumnDefinition, ColumnType, FormPostEntry, TableSchema};
use crate::sql::params::{bind_value, PgBindValue};

/// Upper bound on rows returned by one list query.
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Bind `raw` for `column` and return its placeholder, cast to the native type when known.
    fn push_param(&mut self, schema: &TableSchema, column: &str, raw: &str) -> Result<String, DataAccessError> {
        let value = bind_value(schema, column, raw)?;
        self.params.push(value);
        let n = self.params.len();
        Ok(match schema.column(column) {
            Some(c) if is_bit(c) => format!("${}::int4::{}", n, quoted("bit")),
            Some(c) => match c.native_type() {
                Some(t) => format!("${}::{}", n, quoted(t)),
                None => format!("${}", n),
            },
            None => format!("${}", n),
        })
    }
}

/// A `bit` column read and written as a boolean. PostgreSQL casts between `bit` and
/// `int4` but not `bool`, so values go through `int4` both ways.
fn is_bit(c: &ColumnDefinition) -> bool {
    c.column_type == ColumnType::Boolean && c.native_type().is_some_and(|t| t.eq_ignore_ascii_case("bit"))
}

/// Select expression decoding to the column's canonical Rust type.
fn select_expr(c: &ColumnDefinition) -> String {
    let q = quoted(&c.name);
    match c.column_type {
        ColumnType::Integer => format!("{}::int8 AS {}", q, q),
        ColumnType::Datetime => format!("{}::timestamp AS {}", q, q),
        ColumnType::String | ColumnType::Text => format!("{}::text AS {}", q, q),
        ColumnType::Boolean if is_bit(c) => format!("({}::int4 <> 0) AS {}", q, q),
        ColumnType::Boolean => q,
    }
}

fn select_column_list(schema: &TableSchema) -> String {
    schema
        .columns()
        .iter()
        .map(|c| select_expr(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `k1 = $n AND k2 = $m ...` over the primary keys, in key order.
fn key_predicate(q: &mut QueryBuf, schema: &TableSchema, keys: &[String]) -> Result<String, DataAccessError> {
    let primary_keys = schema.primary_keys();
    if primary_keys.is_empty() {
        return Err(DataAccessError::NoKeyColumns(schema.table_name().to_string()));
    }
    if primary_keys.len() != keys.len() {
        return Err(DataAccessError::KeyArity {
            expected: primary_keys.len(),
            actual: keys.len(),
        });
    }
    let mut parts = Vec::with_capacity(keys.len());
    for (column, raw) in primary_keys.iter().zip(keys) {
        let ph = q.push_param(schema, &column.name, raw)?;
        parts.push(format!("{} = {}", quoted(&column.name), ph));
    }
    Ok(parts.join(" AND "))
}

/// SELECT one row by its key values, given in key column order.
pub fn select_one(schema: &TableSchema, keys: &[String]) -> Result<QueryBuf, DataAccessError> {
    let mut q = QueryBuf::new();
    let predicate = key_predicate(&mut q, schema, keys)?;
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} LIMIT 1",
        select_column_list(schema),
        quoted(schema.table_name()),
        predicate
    );
    Ok(q)
}

/// SELECT one page ordered by `sort_column`, which must be a column of the table.
/// `count` is capped at [`MAX_PAGE_SIZE`].
pub fn select_multiple(
    schema: &TableSchema,
    offset: u64,
    count: u64,
    sort_column: &str,
    ascending: bool,
) -> Result<QueryBuf, DataAccessError> {
    if schema.column(sort_column).is_none() {
        return Err(DataAccessError::UnknownSortColumn(sort_column.to_string()));
    }
    let mut q = QueryBuf::new();
    let table = quoted(schema.table_name());
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {}.{} {} LIMIT {} OFFSET {}",
        select_column_list(schema),
        table,
        table,
        quoted(sort_column),
        if ascending { "ASC" } else { "DESC" },
        count.min(MAX_PAGE_SIZE),
        offset
    );
    Ok(q)
}

/// INSERT key values then editable values; `DEFAULT VALUES` when the entry is empty.
pub fn insert(schema: &TableSchema, entry: &FormPostEntry) -> Result<QueryBuf, DataAccessError> {
    let mut q = QueryBuf::new();
    let table = quoted(schema.table_name());
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (column, raw) in entry.key_values().iter().chain(entry.values()) {
        placeholders.push(q.push_param(schema, &column.name, raw)?);
        cols.push(quoted(&column.name));
    }
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", table)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            placeholders.join(", ")
        )
    };
    Ok(q)
}

/// UPDATE the submitted editable values of the row identified by the entry's key values.
/// Editable values are bound first, then keys.
pub fn update(schema: &TableSchema, entry: &FormPostEntry) -> Result<QueryBuf, DataAccessError> {
    if entry.values().is_empty() {
        return Err(DataAccessError::EmptyStatement("update"));
    }
    if entry.key_values().is_empty() {
        return Err(DataAccessError::EmptyStatement("match"));
    }
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(entry.values().len());
    for (column, raw) in entry.values() {
        let ph = q.push_param(schema, &column.name, raw)?;
        sets.push(format!("{} = {}", quoted(&column.name), ph));
    }
    let keys = schema
        .primary_keys()
        .iter()
        .map(|k| entry.key_value(&k.name).map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or(DataAccessError::KeyArity {
            expected: schema.primary_keys().len(),
            actual: entry.key_values().len(),
        })?;
    let predicate = key_predicate(&mut q, schema, &keys)?;
    q.sql = format!(
        "UPDATE {} SET {} WHERE {}",
        quoted(schema.table_name()),
        sets.join(", "),
        predicate
    );
    Ok(q)
}

pub fn delete(schema: &TableSchema, keys: &[String]) -> Result<QueryBuf, DataAccessError> {
    let mut q = QueryBuf::new();
    let predicate = key_predicate(&mut q, schema, keys)?;
    q.sql = format!("DELETE FROM {} WHERE {}", quoted(schema.table_name()), predicate);
    Ok(q)
}

pub fn count(schema: &TableSchema) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT COUNT(*) FROM {}", quoted(schema.table_name()));
    q
}
