//! Schema providers: where a resource's column definitions come from.

use crate::error::DataAccessError;
use crate::model::{ColumnDefinition, ColumnTypeRegistry};
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::OnceCell;

#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Every column of the table, in table order.
    async fn column_definitions(&self) -> Result<Vec<ColumnDefinition>, DataAccessError>;

    /// Key columns in table order.
    async fn key_columns(&self) -> Result<Vec<ColumnDefinition>, DataAccessError> {
        Ok(self
            .column_definitions()
            .await?
            .into_iter()
            .filter(|c| c.key_column)
            .collect())
    }
}

const COLUMNS_SQL: &str = r#"
SELECT c.table_name::text, c.column_name::text, c.udt_name::text,
    EXISTS (
        SELECT 1
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage k
            ON k.constraint_schema = tc.constraint_schema
            AND k.constraint_name = tc.constraint_name
            AND k.table_name = tc.table_name
        WHERE tc.constraint_type = 'PRIMARY KEY'
            AND tc.table_schema = c.table_schema
            AND tc.table_name = c.table_name
            AND k.column_name = c.column_name
    ) AS is_key
FROM information_schema.columns c
WHERE c.table_schema = current_schema() AND lower(c.table_name::text) = lower($1::text)
ORDER BY c.table_name::text <> $1::text, c.table_name::text, c.ordinal_position
"#;

/// Table name as stored in the catalog plus its columns.
#[derive(Clone, Debug)]
struct Introspected {
    table_name: String,
    columns: Vec<ColumnDefinition>,
}

/// Reads one table's columns and primary key from `information_schema` in the
/// connection's current schema. The table name is matched case-insensitively, an
/// exact match winning over other spellings. The catalog is queried once; later
/// calls reuse the result.
pub struct PgSchemaProvider {
    pool: PgPool,
    table: String,
    types: ColumnTypeRegistry,
    introspected: OnceCell<Introspected>,
}

impl PgSchemaProvider {
    pub fn new(pool: PgPool, table: impl Into<String>, types: ColumnTypeRegistry) -> Self {
        PgSchemaProvider {
            pool,
            table: table.into(),
            types,
            introspected: OnceCell::new(),
        }
    }

    /// The table name as the catalog spells it. This is the name to quote into statements.
    pub async fn table_name(&self) -> Result<String, DataAccessError> {
        Ok(self.load().await?.table_name.clone())
    }

    async fn load(&self) -> Result<&Introspected, DataAccessError> {
        self.introspected.get_or_try_init(|| self.introspect()).await
    }

    async fn introspect(&self) -> Result<Introspected, DataAccessError> {
        tracing::debug!(table = %self.table, "introspecting table");
        let rows = sqlx::query_as::<_, (String, String, String, bool)>(COLUMNS_SQL)
            .bind(&self.table)
            .fetch_all(&self.pool)
            .await?;
        let Some(table_name) = rows.first().map(|r| r.0.clone()) else {
            return Err(DataAccessError::TableNotFound(self.table.clone()));
        };
        if table_name != self.table {
            tracing::debug!(requested = %self.table, table = %table_name, "table name resolved from catalog");
        }
        let columns = rows
            .into_iter()
            .filter(|r| r.0 == table_name)
            .map(|(_, name, udt_name, is_key)| {
                let mut c = if is_key {
                    ColumnDefinition::key(name, self.types.canonicalize(&udt_name))
                } else {
                    ColumnDefinition::new(name, self.types.canonicalize(&udt_name))
                };
                c.native_type = Some(udt_name);
                c
            })
            .collect();
        Ok(Introspected { table_name, columns })
    }
}

#[async_trait]
impl SchemaProvider for PgSchemaProvider {
    async fn column_definitions(&self) -> Result<Vec<ColumnDefinition>, DataAccessError> {
        Ok(self.load().await?.columns.clone())
    }
}

/// Fixed column list, e.g. declared in a resource file.
pub struct StaticSchemaProvider {
    columns: Vec<ColumnDefinition>,
}

impl StaticSchemaProvider {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        StaticSchemaProvider { columns }
    }
}

#[async_trait]
impl SchemaProvider for StaticSchemaProvider {
    async fn column_definitions(&self) -> Result<Vec<ColumnDefinition>, DataAccessError> {
        Ok(self.columns.clone())
    }
}
