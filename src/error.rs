//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("table name must not be empty")]
    EmptyTableName,
    #[error("unknown column: table {table} column {column}")]
    UnknownColumn { table: String, column: String },
    #[error("duplicate resource: {0}")]
    DuplicateResource(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Failure of the data store or of a statement built against it.
#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("no column definition for column '{0}'")]
    MissingColumnDefinition(String),
    #[error("statement affected {actual} rows, expected 1")]
    UnexpectedRowCount { actual: u64 },
    #[error("table '{0}' not found")]
    TableNotFound(String),
    #[error("table '{0}' has no key columns")]
    NoKeyColumns(String),
    #[error("expected {expected} key values, got {actual}")]
    KeyArity { expected: usize, actual: usize },
    #[error("unknown sort column '{0}'")]
    UnknownSortColumn(String),
    #[error("nothing to {0}")]
    EmptyStatement(&'static str),
    #[error(transparent)]
    Coercion(#[from] CoercionError),
    #[error("conflict: {0}")]
    Conflict(String),
}

/// A raw string that does not parse as its column's canonical type.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{column} is not a valid {expected}: '{value}'")]
pub struct CoercionError {
    pub column: String,
    pub expected: &'static str,
    pub value: String,
}

/// Rejected user input. Expected during normal operation, so it is reported to the
/// user as-is and never logged as a system error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInput {
    #[error("key column {0} is missing")]
    MissingKeyColumn(String),
    #[error("column {0} is not editable")]
    ColumnNotEditable(String),
    #[error(transparent)]
    Unparsable(#[from] CoercionError),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::DataAccess(DataAccessError::Db(e))
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::DataAccess(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        let message = match &self {
            AppError::DataAccess(e) => {
                tracing::error!(error = %e, "data access failure");
                "could not access the data store".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
