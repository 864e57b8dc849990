use crate::error::Error as CrateError;
use thiserror::Error;

/// Failures of the libsql chunk index
#[derive(Debug, Error)]
pub enum DbError {
    #[error("LibSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    #[error("SQL query error: {0}")]
    Query(String),

    /// Creating tables or indexes failed
    #[error("Schema error: {0}")]
    Schema(String),

    /// A stored row could not be decoded, e.g. a malformed embedding blob
    #[error("Data error: {0}")]
    Data(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Chunks can only be written to or read from a created collection
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
}

impl From<DbError> for CrateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::CollectionNotFound(_) => CrateError::InvalidRequest(err.to_string()),
            _ => CrateError::Database(err.to_string()),
        }
    }
}
