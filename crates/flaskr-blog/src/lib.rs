//! Users and posts for the flaskr blog.
//!
//! Every operation takes a borrowed `rusqlite::Connection`; callers obtain
//! it from their request context (`DbHandle::with_conn`) so all queries in a
//! request share one connection. Rows decode through
//! [`flaskr_db::FromRow`] by column name.

mod error;
pub mod password;
pub mod posts;
pub mod users;

pub use error::BlogError;
pub use posts::{create_post, delete_post, get_post, list_posts, update_post, Post, PostForm};
pub use users::{authenticate, find_user_by_username, get_user, register_user, User};
