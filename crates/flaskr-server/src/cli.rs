//! Operator commands.

use flaskr_db::{DbError, DbSettings, RequestContext, SchemaInitializer};
use std::error::Error as StdError;
use std::io::Write;
use thiserror::Error;

/// Confirmation printed by `init-db` on success.
pub const INIT_DB_MESSAGE: &str = "Initialized the database.";

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The database operation failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The confirmation could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// `init-db` within an existing context: clear existing data and create new
/// tables, then confirm on `out`.
///
/// Nothing is written if initialization fails.
pub fn init_db_command(
    ctx: &RequestContext,
    initializer: &dyn SchemaInitializer,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    initializer.init_schema(ctx)?;
    writeln!(out, "{INIT_DB_MESSAGE}")?;
    out.flush()?;
    Ok(())
}

/// Runs `init-db` in a fresh context for the duration of the command.
pub fn run_init_db(
    settings: DbSettings,
    initializer: &dyn SchemaInitializer,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let ctx = RequestContext::new(settings);
    let result = init_db_command(&ctx, initializer, out);
    ctx.teardown(result.as_ref().err().map(|e| e as &(dyn StdError + 'static)));
    result
}
