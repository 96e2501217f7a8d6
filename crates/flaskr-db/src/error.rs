//! Error types for the database layer.

/// Errors produced by the connection provider and its handles.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The store at the configured path could not be opened or configured.
    #[error("failed to open database at '{path}': {source}")]
    Open {
        /// The configured database path.
        path: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// The connection was closed when its request context ended.
    #[error("cannot operate on a closed database")]
    Closed,

    /// The schema script failed to execute.
    #[error("schema initialization failed: {0}")]
    Schema(rusqlite::Error),

    /// A statement failed.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A thread panicked while holding the connection lock.
    #[error("database connection lock poisoned")]
    Poisoned,
}

impl DbError {
    /// Returns `true` if this is the use-after-close error.
    pub fn is_closed(&self) -> bool {
        matches!(self, DbError::Closed)
    }
}
