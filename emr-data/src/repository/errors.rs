use rusqlite::ffi;
use thiserror::Error;
use crate::database::DatabaseError;

/// Error type for repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A UNIQUE constraint rejected the write
    #[error("Duplicate value: {0}")]
    Duplicate(String),

    /// A FOREIGN KEY constraint rejected the write
    #[error("Referenced record does not exist: {0}")]
    ForeignKey(String),

    /// Not found error
    #[error("Record not found: {0}")]
    NotFound(String),

    /// JSON column could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(error: rusqlite::Error) -> Self {
        match error {
            rusqlite::Error::SqliteFailure(ref code, ref message) => {
                let detail = message.clone().unwrap_or_else(|| code.to_string());
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        RepositoryError::Duplicate(detail)
                    },
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::ForeignKey(detail),
                    _ => RepositoryError::Sqlite(error),
                }
            },
            other => RepositoryError::Sqlite(other),
        }
    }
}

impl From<String> for RepositoryError {
    fn from(error: String) -> Self {
        if error.contains("validation") || error.contains("invalid") {
            RepositoryError::Validation(error)
        } else {
            RepositoryError::Database(DatabaseError::GenericError(error))
        }
    }
}
