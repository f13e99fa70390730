use std::path::PathBuf;

use thiserror::Error;

/// Result alias for warehouse operations.
pub type Result<T> = std::result::Result<T, WarehouseError>;

/// Errors raised by the warehouse collaborators.
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("invalid warehouse configuration: {0}")]
    InvalidConfig(String),
    #[error("no .sql files found in {0}")]
    NoSchemaFiles(PathBuf),
    #[error("refusing to drop schemas without confirmation")]
    ConfirmationRequired,
    #[error("column '{column}' has unsupported type {type_name}; cast it to text in the query")]
    UnsupportedColumn { column: String, type_name: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
