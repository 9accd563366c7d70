//! Table admin: schema-driven create/read/update/delete over arbitrary PostgreSQL tables.

pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;

pub use config::{load_resource_files, ColumnSettings, ResourceConfig, ResourceFileConfig, ResourceRegistry};
pub use error::{AppError, ConfigError, DataAccessError, InvalidInput};
pub use model::{
    ColumnDefinition, ColumnType, ColumnTypeRegistry, DatabaseEntry, DbValue, FormPostEntry, Resource,
    ValidationMode, ValidationRule,
};
pub use routes::{admin_routes, common_routes_with_ready};
pub use schema::{PgSchemaProvider, SchemaProvider, StaticSchemaProvider};
pub use service::{DataAccess, GenericSqlDao, InMemoryDao, InputValidator};
pub use settings::Settings;
pub use state::AppState;
