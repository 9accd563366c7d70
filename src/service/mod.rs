//! Data access, validation and transformation for generic resources.

mod crud;
mod memory;
mod transform;
mod validation;

pub use crud::GenericSqlDao;
pub use memory::InMemoryDao;
pub use transform::{apply_input_transformers, row_id, transform_database_results, ROW_ID};
pub use validation::InputValidator;

use crate::error::DataAccessError;
use crate::model::{DatabaseEntry, FormPostEntry};
use async_trait::async_trait;

/// Persistence operations for one resource. Each implementation is bound to a single
/// table schema at construction; key values are always given in key column order.
#[async_trait]
pub trait DataAccess: Send + Sync {
    async fn select_one(&self, keys: &[String]) -> Result<Option<DatabaseEntry>, DataAccessError>;

    async fn select_multiple(
        &self,
        offset: u64,
        count: u64,
        sort_column: &str,
        ascending: bool,
    ) -> Result<Vec<DatabaseEntry>, DataAccessError>;

    /// Must affect exactly one row.
    async fn insert(&self, entry: &FormPostEntry) -> Result<(), DataAccessError>;

    /// Must affect exactly one row. Only the entry's editable values are written.
    async fn update(&self, entry: &FormPostEntry) -> Result<(), DataAccessError>;

    async fn delete(&self, keys: &[String]) -> Result<(), DataAccessError>;

    async fn count(&self) -> Result<u64, DataAccessError>;
}
