//! Destructive schema initialization.
//!
//! The script is embedded at compile time so it ships with the binary and
//! cannot drift from the code that queries it. Running it drops `post` and
//! `user` and recreates them empty; every run ends in the same state.

use crate::context::{get_db, RequestContext};
use crate::error::DbError;

/// The schema script defining the `user` and `post` tables.
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Something that can (re)create the schema within a request context.
///
/// The `init-db` command receives this as a capability so callers can
/// substitute their own implementation.
pub trait SchemaInitializer {
    /// Replaces the schema and all data reachable through `ctx`'s connection.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Schema` if the script fails, or whatever the
    /// connection provider returns.
    fn init_schema(&self, ctx: &RequestContext) -> Result<(), DbError>;
}

/// Runs a fixed SQL script against the context's connection.
#[derive(Debug, Clone, Copy)]
pub struct ScriptSchema {
    script: &'static str,
}

impl ScriptSchema {
    /// An initializer for an arbitrary script.
    pub const fn new(script: &'static str) -> Self {
        Self { script }
    }
}

impl Default for ScriptSchema {
    fn default() -> Self {
        Self::new(SCHEMA_SQL)
    }
}

impl SchemaInitializer for ScriptSchema {
    fn init_schema(&self, ctx: &RequestContext) -> Result<(), DbError> {
        let db = get_db(ctx)?;
        db.with_conn(|conn| conn.execute_batch(self.script).map_err(DbError::Schema))?;
        tracing::info!(context = %ctx.id(), path = db.path(), "database schema initialized");
        Ok(())
    }
}

/// Clears existing data and creates new tables using [`SCHEMA_SQL`].
///
/// # Errors
///
/// See [`SchemaInitializer::init_schema`].
pub fn init_db(ctx: &RequestContext) -> Result<(), DbError> {
    ScriptSchema::default().init_schema(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::DbSettings;

    fn user_tables(ctx: &RequestContext) -> Vec<String> {
        get_db(ctx)
            .expect("should open")
            .query_all(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
                [],
            )
            .expect("should list tables")
    }

    #[test]
    fn init_db_creates_user_and_post() {
        let ctx = RequestContext::new(DbSettings::new(":memory:"));
        init_db(&ctx).expect("init should succeed");
        assert_eq!(user_tables(&ctx), vec!["post".to_string(), "user".to_string()]);
    }

    #[test]
    fn init_db_twice_replaces_data() {
        let ctx = RequestContext::new(DbSettings::new(":memory:"));
        init_db(&ctx).expect("first init");

        let db = get_db(&ctx).expect("should open");
        db.execute(
            "INSERT INTO user (username, password) VALUES ('a', 'x')",
            [],
        )
        .expect("insert user");
        db.execute(
            "INSERT INTO post (author_id, title, body) VALUES (1, 't', 'b')",
            [],
        )
        .expect("insert post");

        init_db(&ctx).expect("second init should not fail on existing tables");

        let users: Option<i64> = db.query_opt("SELECT COUNT(*) FROM user", []).expect("count");
        let posts: Option<i64> = db.query_opt("SELECT COUNT(*) FROM post", []).expect("count");
        assert_eq!(users, Some(0));
        assert_eq!(posts, Some(0));
        assert_eq!(user_tables(&ctx), vec!["post".to_string(), "user".to_string()]);
    }

    #[test]
    fn malformed_script_is_a_schema_error() {
        let ctx = RequestContext::new(DbSettings::new(":memory:"));
        let err = ScriptSchema::new("CREATE TABLE (;")
            .init_schema(&ctx)
            .expect_err("malformed script should fail");
        assert!(matches!(err, DbError::Schema(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn post_author_must_exist() {
        let ctx = RequestContext::new(DbSettings::new(":memory:"));
        init_db(&ctx).expect("init");
        let err = get_db(&ctx)
            .expect("should open")
            .execute(
                "INSERT INTO post (author_id, title, body) VALUES (42, 't', 'b')",
                [],
            )
            .expect_err("dangling author should violate the foreign key");
        assert!(matches!(err, DbError::Sqlite(_)));
    }
}
