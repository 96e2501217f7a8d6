//! Error types for user and post operations.

use flaskr_db::DbError;

/// Errors that can occur during blog operations.
///
/// The `Display` text of the validation variants is shown to users as-is.
#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    /// The database layer failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A required form field was missing or invalid.
    #[error("{0}")]
    Invalid(String),

    /// The username is taken.
    #[error("User {0} is already registered.")]
    AlreadyRegistered(String),

    /// No user has this username.
    #[error("Incorrect username.")]
    IncorrectUsername,

    /// The password does not match.
    #[error("Incorrect password.")]
    IncorrectPassword,

    /// No post has this id.
    #[error("Post id {0} doesn't exist.")]
    PostNotFound(i64),

    /// A MAC key was rejected.
    #[error("invalid MAC key length")]
    MacKey,

    /// The post belongs to someone else.
    #[error("post {0} belongs to another author")]
    Forbidden(i64),
}

impl From<rusqlite::Error> for BlogError {
    fn from(e: rusqlite::Error) -> Self {
        BlogError::Db(DbError::Sqlite(e))
    }
}
