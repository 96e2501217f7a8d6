//! User registration and lookup.

use flaskr_db::FromRow;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use serde::Serialize;

use crate::error::BlogError;
use crate::password::{check_password, hash_password};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Database id.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Stored password hash. Never serialized.
    #[serde(skip)]
    pub password: String,
}

impl FromRow for User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            password: row.get("password")?,
        })
    }
}

/// Checks that both credentials are present.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), BlogError> {
    if username.is_empty() {
        return Err(BlogError::Invalid("Username is required.".to_string()));
    }
    if password.is_empty() {
        return Err(BlogError::Invalid("Password is required.".to_string()));
    }
    Ok(())
}

/// Registers a new user and returns its id.
///
/// # Errors
///
/// Returns `BlogError::Invalid` for missing fields and
/// `BlogError::AlreadyRegistered` if the username is taken.
pub fn register_user(conn: &Connection, username: &str, password: &str) -> Result<i64, BlogError> {
    validate_credentials(username, password)?;
    let hashed = hash_password(password)?;

    let result = conn.execute(
        "INSERT INTO user (username, password) VALUES (?1, ?2)",
        params![username, hashed],
    );

    match result {
        Ok(_) => {
            let id = conn.last_insert_rowid();
            tracing::info!(user_id = id, username, "user registered");
            Ok(id)
        }
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(BlogError::AlreadyRegistered(username.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Looks up a user by id.
pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, BlogError> {
    let user = conn
        .query_row(
            "SELECT id, username, password FROM user WHERE id = ?1",
            [id],
            |row| User::from_row(row),
        )
        .optional()?;
    Ok(user)
}

/// Looks up a user by username.
pub fn find_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>, BlogError> {
    let user = conn
        .query_row(
            "SELECT id, username, password FROM user WHERE username = ?1",
            [username],
            |row| User::from_row(row),
        )
        .optional()?;
    Ok(user)
}

/// Verifies a username/password pair.
///
/// # Errors
///
/// Returns `BlogError::IncorrectUsername` or `BlogError::IncorrectPassword`.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> Result<User, BlogError> {
    let user = find_user_by_username(conn, username)?.ok_or(BlogError::IncorrectUsername)?;
    if !check_password(&user.password, password) {
        return Err(BlogError::IncorrectPassword);
    }
    Ok(user)
}
