//! Library error types.

use thiserror::Error;

/// Errors surfaced by storage and service operations.
///
/// Not-found is not an error: lookups return `Ok(None)` and deletes of
/// missing rows return `Ok(())`.
#[derive(Debug, Error)]
pub enum Error {
    /// A unique constraint rejected an insert or update. Carries the name
    /// of the violated constraint as reported by PostgreSQL.
    #[error("duplicate value for unique constraint `{0}`")]
    Duplicate(String),

    /// Any other failure from the store: connectivity, malformed
    /// statement, or transaction failure. Never retried internally.
    #[error("database error")]
    Database(#[source] sqlx::Error),

    /// Invalid or missing environment configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        // 23505 = unique_violation
        if let sqlx::Error::Database(db_err) = &err
            && db_err.code().as_deref() == Some("23505")
        {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return Error::Duplicate(constraint);
        }
        Error::Database(err)
    }
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
