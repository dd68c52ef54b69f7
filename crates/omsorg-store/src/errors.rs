//! Storage error type.

use thiserror::Error;

/// Anything that can go wrong talking to SQLite or the pool.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite-level failure (constraint, I/O, malformed SQL).
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// The pool could not hand out a connection.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
