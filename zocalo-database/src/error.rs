//! Database error types.

use std::time::Duration;
use thiserror::Error;
use zocalo_core::{DatabaseError, Error};

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Failures raised by [`Db`](crate::Db) and [`Transaction`](crate::Transaction).
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Query failed: {source}")]
    Query { source: sqlx::Error, query: String },

    #[error("Query timed out after {limit:?}")]
    Timeout { query: String, limit: Duration },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("No columns to write")]
    EmptyData,
}

impl DbError {
    /// Statement that failed, when there was one.
    pub fn query(&self) -> Option<&str> {
        match self {
            DbError::Query { query, .. } | DbError::Timeout { query, .. } => Some(query),
            _ => None,
        }
    }

    /// Wrap as the core error type with a client-facing message.
    ///
    /// The driver message and statement travel along as details.
    pub fn into_database_error(self, message: impl Into<String>) -> DatabaseError {
        let query = self.query().map(str::to_string);
        let error = DatabaseError::new(message, self.to_string());
        match query {
            Some(query) => error.with_query(query),
            None => error,
        }
    }
}

impl From<DbError> for Error {
    fn from(err: DbError) -> Self {
        Error::Database(err.into_database_error("Database error occurred"))
    }
}

/// Attach a client-facing message when leaving the repository layer.
pub trait DbResultExt<T> {
    fn db_context(self, message: impl Into<String>) -> Result<T, Error>;
}

impl<T> DbResultExt<T> for DbResult<T> {
    fn db_context(self, message: impl Into<String>) -> Result<T, Error> {
        self.map_err(|e| Error::Database(e.into_database_error(message)))
    }
}
