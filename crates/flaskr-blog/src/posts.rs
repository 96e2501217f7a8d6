//! Post CRUD.

use flaskr_db::{FromRow, Timestamp};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::BlogError;

/// A post joined with its author's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created: Timestamp,
    pub author_id: i64,
    pub username: String,
}

impl FromRow for Post {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            body: row.get("body")?,
            created: row.get("created")?,
            author_id: row.get("author_id")?,
            username: row.get("username")?,
        })
    }
}

/// Title and body submitted for a new or edited post.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl PostForm {
    fn validate(&self) -> Result<(), BlogError> {
        if self.title.is_empty() {
            return Err(BlogError::Invalid("Title is required.".to_string()));
        }
        Ok(())
    }
}

const SELECT_POST: &str = "SELECT p.id, title, body, created, author_id, username
     FROM post p JOIN user u ON p.author_id = u.id";

/// Lists all posts, newest first.
pub fn list_posts(conn: &Connection) -> Result<Vec<Post>, BlogError> {
    let mut stmt = conn.prepare(&format!("{SELECT_POST} ORDER BY created DESC, p.id DESC"))?;
    let rows = stmt.query_map([], |row| Post::from_row(row))?;
    let mut posts = Vec::new();
    for row in rows {
        posts.push(row?);
    }
    Ok(posts)
}

/// Fetches a post by id.
///
/// With `check_author`, the post must belong to that user.
///
/// # Errors
///
/// Returns `BlogError::PostNotFound` or `BlogError::Forbidden`.
pub fn get_post(conn: &Connection, id: i64, check_author: Option<i64>) -> Result<Post, BlogError> {
    let post = conn
        .query_row(&format!("{SELECT_POST} WHERE p.id = ?1"), [id], |row| {
            Post::from_row(row)
        })
        .optional()?
        .ok_or(BlogError::PostNotFound(id))?;

    if let Some(author_id) = check_author {
        if post.author_id != author_id {
            return Err(BlogError::Forbidden(id));
        }
    }
    Ok(post)
}

/// Creates a post and returns its id.
pub fn create_post(conn: &Connection, author_id: i64, form: &PostForm) -> Result<i64, BlogError> {
    form.validate()?;
    conn.execute(
        "INSERT INTO post (title, body, author_id, created) VALUES (?1, ?2, ?3, ?4)",
        params![form.title, form.body, author_id, Timestamp::now()],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(post_id = id, author_id, "post created");
    Ok(id)
}

/// Replaces the title and body of a post.
pub fn update_post(conn: &Connection, id: i64, form: &PostForm) -> Result<(), BlogError> {
    form.validate()?;
    let count = conn.execute(
        "UPDATE post SET title = ?1, body = ?2 WHERE id = ?3",
        params![form.title, form.body, id],
    )?;
    if count == 0 {
        return Err(BlogError::PostNotFound(id));
    }
    Ok(())
}

/// Deletes a post.
pub fn delete_post(conn: &Connection, id: i64) -> Result<(), BlogError> {
    let count = conn.execute("DELETE FROM post WHERE id = ?1", [id])?;
    if count == 0 {
        return Err(BlogError::PostNotFound(id));
    }
    tracing::info!(post_id = id, "post deleted");
    Ok(())
}
