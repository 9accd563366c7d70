//! Generic CRUD execution against PostgreSQL.

use crate::error::DataAccessError;
use crate::model::{ColumnType, DatabaseEntry, DbValue, FormPostEntry, TableSchema};
use crate::service::DataAccess;
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

/// SQL data access object for one table, sharing the resource's frozen schema.
pub struct GenericSqlDao {
    pool: PgPool,
    schema: Arc<TableSchema>,
}

impl GenericSqlDao {
    pub fn new(pool: PgPool, schema: Arc<TableSchema>) -> Self {
        GenericSqlDao { pool, schema }
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    async fn query_many(&self, q: &QueryBuf) -> Result<Vec<DatabaseEntry>, DataAccessError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(|r| self.decode_row(r)).collect()
    }

    /// Run a statement that must touch exactly one row.
    async fn execute_one(&self, q: &QueryBuf) -> Result<(), DataAccessError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let affected = query.execute(&self.pool).await?.rows_affected();
        if affected != 1 {
            return Err(DataAccessError::UnexpectedRowCount { actual: affected });
        }
        Ok(())
    }

    fn decode_row(&self, row: &PgRow) -> Result<DatabaseEntry, DataAccessError> {
        let mut entry = DatabaseEntry::new();
        for c in self.schema.columns() {
            let name = c.name.as_str();
            let value = match c.column_type {
                ColumnType::Integer => row.try_get::<Option<i64>, _>(name)?.map(DbValue::Integer),
                ColumnType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(DbValue::Boolean),
                ColumnType::Datetime => row
                    .try_get::<Option<chrono::NaiveDateTime>, _>(name)?
                    .map(DbValue::Datetime),
                ColumnType::String | ColumnType::Text => {
                    row.try_get::<Option<String>, _>(name)?.map(DbValue::Text)
                }
            };
            entry.insert(name, value.unwrap_or(DbValue::Null));
        }
        Ok(entry)
    }
}

#[async_trait]
impl DataAccess for GenericSqlDao {
    async fn select_one(&self, keys: &[String]) -> Result<Option<DatabaseEntry>, DataAccessError> {
        let q = sql::select_one(&self.schema, keys)?;
        Ok(self.query_many(&q).await?.into_iter().next())
    }

    async fn select_multiple(
        &self,
        offset: u64,
        count: u64,
        sort_column: &str,
        ascending: bool,
    ) -> Result<Vec<DatabaseEntry>, DataAccessError> {
        let q = sql::select_multiple(&self.schema, offset, count, sort_column, ascending)?;
        self.query_many(&q).await
    }

    async fn insert(&self, entry: &FormPostEntry) -> Result<(), DataAccessError> {
        let q = sql::insert(&self.schema, entry)?;
        self.execute_one(&q).await
    }

    async fn update(&self, entry: &FormPostEntry) -> Result<(), DataAccessError> {
        let q = sql::update(&self.schema, entry)?;
        self.execute_one(&q).await
    }

    async fn delete(&self, keys: &[String]) -> Result<(), DataAccessError> {
        let q = sql::delete(&self.schema, keys)?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        query.execute(&self.pool).await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, DataAccessError> {
        let q = sql::count(&self.schema);
        tracing::debug!(sql = %q.sql, "query");
        let n: i64 = sqlx::query_scalar(&q.sql).fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }
}
