//! Request store error definitions

use crate::db::error::DbError;

/// Request store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An error in the database client
    #[error("database error: {0}")]
    Db(#[from] DbError),
    /// A record violates a uniqueness constraint
    #[error("duplicate record: {0}")]
    Duplicate(String),
    /// A stored record could not be converted into its domain type
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

#[allow(clippy::needless_pass_by_value)]
impl StoreError {
    /// Create a new duplicate record error
    pub fn duplicate<T: ToString>(msg: T) -> Self {
        Self::Duplicate(msg.to_string())
    }

    /// Create a new invalid record error
    pub fn invalid_record<T: ToString>(msg: T) -> Self {
        Self::InvalidRecord(msg.to_string())
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        StoreError::Db(DbError::from(error))
    }
}
