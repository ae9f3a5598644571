//! Input validation errors.
//!
//! Raised by the service layer before any SQL is issued; a request that
//! fails validation never touches storage.

use thiserror::Error;

/// Malformed request input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Item/source ids must be positive integers.
    #[error("invalid id: {0}")]
    InvalidId(i64),

    /// Mutations require at least one id.
    #[error("empty id list")]
    EmptyIdList,

    /// Requested page offset/size outside the permitted range.
    #[error("invalid page window: offset {offset}, size {size}")]
    InvalidPageWindow { offset: i64, size: i64 },

    /// Unparsable datetime in a client payload.
    #[error("unparsable datetime: {0}")]
    InvalidDatetime(String),
}

/// Check a batch of ids before building SQL from them.
pub fn validate_ids(ids: &[i64]) -> Result<(), ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::EmptyIdList);
    }
    match ids.iter().find(|&&id| id <= 0) {
        Some(&bad) => Err(ValidationError::InvalidId(bad)),
        None => Ok(()),
    }
}
