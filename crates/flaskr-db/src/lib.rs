//! Database layer for flaskr.
//!
//! Owns the per-request connection lifecycle: a [`RequestContext`] lazily
//! opens at most one SQLite connection ([`get_db`]), every caller in that
//! context shares the same [`DbHandle`], and the teardown hook
//! ([`close_db`]) closes it when the context ends. A handle that outlived its
//! context reports [`DbError::Closed`] on every use instead of reopening.
//!
//! The schema lives in `schema.sql`, embedded at compile time, and is applied
//! destructively by [`init_db`]. Rows are decoded by column name through
//! [`FromRow`], and timestamps cross the store boundary through the explicit
//! codec in [`timestamp`].

mod context;
mod error;
mod handle;
mod row;
mod schema;
pub mod timestamp;

pub use context::{close_db, get_db, RequestContext};
pub use error::DbError;
pub use handle::{open_connection, DbHandle, DbSettings};
pub use row::FromRow;
pub use schema::{init_db, ScriptSchema, SchemaInitializer, SCHEMA_SQL};
pub use timestamp::Timestamp;
