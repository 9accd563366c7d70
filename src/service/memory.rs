//! In-memory data access object with the same contract as the SQL one.

use crate::error::DataAccessError;
use crate::model::{ColumnType, DatabaseEntry, DbValue, FormPostEntry, TableSchema};
use crate::service::DataAccess;
use crate::sql::{bind_value, MAX_PAGE_SIZE};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Rows kept in insertion order. A single integer key left blank on insert is
/// assigned the next free value.
pub struct InMemoryDao {
    schema: Arc<TableSchema>,
    rows: RwLock<Vec<DatabaseEntry>>,
}

type Key = Vec<(String, DbValue)>;

impl InMemoryDao {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        InMemoryDao {
            schema,
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    fn parse_keys(&self, keys: &[String]) -> Result<Key, DataAccessError> {
        let primary_keys = self.schema.primary_keys();
        if primary_keys.is_empty() {
            return Err(DataAccessError::NoKeyColumns(self.schema.table_name().to_string()));
        }
        if primary_keys.len() != keys.len() {
            return Err(DataAccessError::KeyArity {
                expected: primary_keys.len(),
                actual: keys.len(),
            });
        }
        primary_keys
            .iter()
            .zip(keys)
            .map(|(c, raw)| Ok((c.name.clone(), bind_value(&self.schema, &c.name, raw)?.value)))
            .collect()
    }

    fn key_of(&self, row: &DatabaseEntry) -> Key {
        self.schema
            .primary_keys()
            .iter()
            .map(|c| (c.name.clone(), row.get(&c.name).cloned().unwrap_or(DbValue::Null)))
            .collect()
    }

    fn next_id(&self, rows: &[DatabaseEntry], column: &str) -> Result<i64, DataAccessError> {
        rows.iter()
            .filter_map(|r| match r.get(column) {
                Some(DbValue::Integer(n)) => Some(*n),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| {
                DataAccessError::Conflict(format!(
                    "no {} value left to assign in {}",
                    column,
                    self.schema.table_name()
                ))
            })
    }
}

fn matches(row: &DatabaseEntry, key: &Key) -> bool {
    key.iter().all(|(name, value)| row.get(name) == Some(value))
}

#[async_trait]
impl DataAccess for InMemoryDao {
    async fn select_one(&self, keys: &[String]) -> Result<Option<DatabaseEntry>, DataAccessError> {
        let key = self.parse_keys(keys)?;
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|r| matches(r, &key)).cloned())
    }

    async fn select_multiple(
        &self,
        offset: u64,
        count: u64,
        sort_column: &str,
        ascending: bool,
    ) -> Result<Vec<DatabaseEntry>, DataAccessError> {
        if self.schema.column(sort_column).is_none() {
            return Err(DataAccessError::UnknownSortColumn(sort_column.to_string()));
        }
        let mut rows = self.rows.read().await.clone();
        rows.sort_by(|a, b| {
            let (a, b) = (
                a.get(sort_column).unwrap_or(&DbValue::Null),
                b.get(sort_column).unwrap_or(&DbValue::Null),
            );
            if ascending {
                a.sort_cmp(b)
            } else {
                b.sort_cmp(a)
            }
        });
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(count.min(MAX_PAGE_SIZE) as usize)
            .collect())
    }

    async fn insert(&self, entry: &FormPostEntry) -> Result<(), DataAccessError> {
        let mut row = DatabaseEntry::new();
        for (column, raw) in entry.key_values().iter().chain(entry.values()) {
            row.insert(column.name.as_str(), bind_value(&self.schema, &column.name, raw)?.value);
        }

        let mut rows = self.rows.write().await;
        let primary_keys = self.schema.primary_keys();
        if let [key] = primary_keys.as_slice() {
            let blank = row.get(&key.name).map_or(true, DbValue::is_null);
            if key.column_type == ColumnType::Integer && blank {
                row.insert(key.name.as_str(), DbValue::Integer(self.next_id(&rows, &key.name)?));
            }
        }
        let mut full = DatabaseEntry::new();
        for c in self.schema.columns() {
            full.insert(c.name.as_str(), row.get(&c.name).cloned().unwrap_or(DbValue::Null));
        }
        if !primary_keys.is_empty() {
            let key = self.key_of(&full);
            if rows.iter().any(|r| matches(r, &key)) {
                return Err(DataAccessError::Conflict(format!(
                    "duplicate key in {}",
                    self.schema.table_name()
                )));
            }
        }
        tracing::debug!(table = %self.schema.table_name(), "insert");
        rows.push(full);
        Ok(())
    }

    async fn update(&self, entry: &FormPostEntry) -> Result<(), DataAccessError> {
        if entry.values().is_empty() {
            return Err(DataAccessError::EmptyStatement("update"));
        }
        if entry.key_values().is_empty() {
            return Err(DataAccessError::EmptyStatement("match"));
        }
        let keys = self
            .schema
            .primary_keys()
            .iter()
            .map(|k| entry.key_value(&k.name).map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or(DataAccessError::KeyArity {
                expected: self.schema.primary_keys().len(),
                actual: entry.key_values().len(),
            })?;
        let key = self.parse_keys(&keys)?;
        let mut values = Vec::with_capacity(entry.values().len());
        for (column, raw) in entry.values() {
            values.push((column.name.clone(), bind_value(&self.schema, &column.name, raw)?.value));
        }

        let mut rows = self.rows.write().await;
        let hits = rows.iter().filter(|r| matches(r, &key)).count() as u64;
        if hits != 1 {
            return Err(DataAccessError::UnexpectedRowCount { actual: hits });
        }
        if let Some(row) = rows.iter_mut().find(|r| matches(r, &key)) {
            for (name, value) in values {
                row.insert(name, value);
            }
        }
        tracing::debug!(table = %self.schema.table_name(), "update");
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), DataAccessError> {
        let key = self.parse_keys(keys)?;
        self.rows.write().await.retain(|r| !matches(r, &key));
        tracing::debug!(table = %self.schema.table_name(), "delete");
        Ok(())
    }

    async fn count(&self) -> Result<u64, DataAccessError> {
        Ok(self.rows.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnDefinition;
    use chrono::NaiveDate;

    fn locations() -> Arc<TableSchema> {
        let editable = |name: &str, t| {
            let mut c = ColumnDefinition::new(name, t);
            c.editable = true;
            c
        };
        Arc::new(
            TableSchema::new(
                "locations",
                vec![
                    ColumnDefinition::key("id", ColumnType::Integer),
                    editable("name", ColumnType::String),
                    editable("favorite_number", ColumnType::Integer),
                    editable("created", ColumnType::Datetime),
                    editable("active", ColumnType::Boolean),
                ],
            )
            .unwrap(),
        )
    }

    fn entry(schema: &Arc<TableSchema>, pairs: &[(&str, &str)]) -> FormPostEntry {
        let mut e = FormPostEntry::new(schema.clone());
        for (k, v) in pairs {
            e.set(k, *v).unwrap();
        }
        e
    }

    #[tokio::test]
    async fn insert_then_select_coerces_values() {
        let schema = locations();
        let dao = InMemoryDao::new(schema.clone());
        dao.insert(&entry(
            &schema,
            &[
                ("name", "Lab"),
                ("favorite_number", "042"),
                ("created", "2024-01-02 03:04:05"),
                ("active", "TRUE"),
            ],
        ))
        .await
        .unwrap();

        let row = dao.select_one(&["1".to_string()]).await.unwrap().unwrap();
        assert_eq!(row.get("id"), Some(&DbValue::Integer(1)));
        assert_eq!(row.get("favorite_number"), Some(&DbValue::Integer(42)));
        assert_eq!(row.get("active"), Some(&DbValue::Boolean(true)));
        let created = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        assert_eq!(row.get("created"), Some(&DbValue::Datetime(created)));
        assert!(dao.select_one(&["2".to_string()]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_touches_only_submitted_columns() {
        let schema = locations();
        let dao = InMemoryDao::new(schema.clone());
        dao.insert(&entry(&schema, &[("name", "Lab"), ("favorite_number", "7")]))
            .await
            .unwrap();
        dao.update(&entry(&schema, &[("id", "1"), ("name", "Annex")])).await.unwrap();
        let row = dao.select_one(&["1".to_string()]).await.unwrap().unwrap();
        assert_eq!(row.get("name"), Some(&DbValue::Text("Annex".into())));
        assert_eq!(row.get("favorite_number"), Some(&DbValue::Integer(7)));
    }

    #[tokio::test]
    async fn update_of_missing_row_reports_row_count() {
        let schema = locations();
        let dao = InMemoryDao::new(schema.clone());
        let err = dao
            .update(&entry(&schema, &[("id", "9"), ("name", "x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, DataAccessError::UnexpectedRowCount { actual: 0 }));
    }

    #[tokio::test]
    async fn duplicate_key_conflicts() {
        let schema = locations();
        let dao = InMemoryDao::new(schema.clone());
        dao.insert(&entry(&schema, &[("id", "5"), ("name", "a")])).await.unwrap();
        let err = dao.insert(&entry(&schema, &[("id", "5"), ("name", "b")])).await.unwrap_err();
        assert!(matches!(err, DataAccessError::Conflict(_)));
        assert_eq!(dao.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn generated_key_exhaustion_conflicts() {
        let schema = locations();
        let dao = InMemoryDao::new(schema.clone());
        let max = i64::MAX.to_string();
        dao.insert(&entry(&schema, &[("id", max.as_str()), ("name", "a")]))
            .await
            .unwrap();
        let err = dao.insert(&entry(&schema, &[("name", "b")])).await.unwrap_err();
        assert!(matches!(err, DataAccessError::Conflict(_)));
        assert_eq!(dao.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn select_multiple_sorts_and_pages() {
        let schema = locations();
        let dao = InMemoryDao::new(schema.clone());
        for (name, n) in [("a", "3"), ("b", ""), ("c", "10")] {
            dao.insert(&entry(&schema, &[("name", name), ("favorite_number", n)]))
                .await
                .unwrap();
        }
        let desc = dao.select_multiple(0, 10, "favorite_number", false).await.unwrap();
        let names: Vec<_> = desc.iter().map(|r| r.get("name").unwrap().to_string()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);

        let asc = dao.select_multiple(0, 10, "favorite_number", true).await.unwrap();
        let names: Vec<_> = asc.iter().map(|r| r.get("name").unwrap().to_string()).collect();
        assert_eq!(names, vec!["a", "c", "b"]);

        let page = dao.select_multiple(1, 1, "favorite_number", true).await.unwrap();
        assert_eq!(page[0].get("name"), Some(&DbValue::Text("c".into())));

        assert!(matches!(
            dao.select_multiple(0, 10, "nope", true).await,
            Err(DataAccessError::UnknownSortColumn(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_matching_row() {
        let schema = locations();
        let dao = InMemoryDao::new(schema.clone());
        dao.insert(&entry(&schema, &[("name", "a")])).await.unwrap();
        dao.insert(&entry(&schema, &[("name", "b")])).await.unwrap();
        dao.delete(&["1".to_string()]).await.unwrap();
        assert_eq!(dao.count().await.unwrap(), 1);
        assert!(matches!(
            dao.delete(&["x".to_string()]).await,
            Err(DataAccessError::Coercion(_))
        ));
    }
}
