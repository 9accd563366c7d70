//! Bind raw column input to PostgreSQL parameters with the column's canonical type.

use crate::error::DataAccessError;
use crate::model::{ColumnType, DbValue, TableSchema};
use chrono::NaiveDateTime;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// A parsed value plus the type of the column it is bound for, so nulls are typed too.
#[derive(Clone, Debug, PartialEq)]
pub struct PgBindValue {
    pub value: DbValue,
    pub column_type: ColumnType,
}

impl PgBindValue {
    fn pg_type(&self) -> PgTypeInfo {
        let column_type = match &self.value {
            DbValue::Null => self.column_type,
            DbValue::Integer(_) => ColumnType::Integer,
            DbValue::Boolean(_) => ColumnType::Boolean,
            DbValue::Datetime(_) => ColumnType::Datetime,
            DbValue::Text(_) => ColumnType::Text,
        };
        match column_type {
            ColumnType::Integer => PgTypeInfo::with_name("INT8"),
            ColumnType::Boolean => PgTypeInfo::with_name("BOOL"),
            ColumnType::Datetime => PgTypeInfo::with_name("TIMESTAMP"),
            ColumnType::String | ColumnType::Text => PgTypeInfo::with_name("TEXT"),
        }
    }
}

/// Parse `raw` for column `name` of `schema`.
pub fn bind_value(schema: &TableSchema, name: &str, raw: &str) -> Result<PgBindValue, DataAccessError> {
    let column = schema
        .column(name)
        .ok_or_else(|| DataAccessError::MissingColumnDefinition(name.to_string()))?;
    Ok(PgBindValue {
        value: column.column_type.parse(&column.name, raw)?,
        column_type: column.column_type,
    })
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match &self.value {
            DbValue::Null => IsNull::Yes,
            DbValue::Integer(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            DbValue::Boolean(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            DbValue::Datetime(dt) => <NaiveDateTime as Encode<Postgres>>::encode_by_ref(dt, buf)?,
            DbValue::Text(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(self.pg_type())
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}
