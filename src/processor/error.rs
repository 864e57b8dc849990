use crate::error::Error as CrateError;
use thiserror::Error;

/// Chunking failure
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Options that cannot produce chunks, such as a zero chunk size
    #[error("Invalid chunk options: {0}")]
    InvalidOptions(String),
}

impl From<ProcessError> for CrateError {
    fn from(err: ProcessError) -> Self {
        CrateError::Config(err.to_string())
    }
}
