//! Connection opening and the shared per-context handle.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OpenFlags, Params, Transaction};

use crate::error::DbError;
use crate::row::FromRow;

/// Where and how to open the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    /// Path to the SQLite database file.
    pub path: String,

    /// Busy timeout for the connection, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl DbSettings {
    /// Settings for `path` with the default busy timeout.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: 5_000,
        }
    }
}

/// Opens a SQLite connection with foreign keys and the busy timeout enabled.
///
/// # Errors
///
/// Returns `DbError::Open` if the file cannot be opened or the pragmas fail.
/// There is no retry.
pub fn open_connection(settings: &DbSettings) -> Result<Connection, DbError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    let open_err = |source| DbError::Open {
        path: settings.path.clone(),
        source,
    };

    let conn = Connection::open_with_flags(&settings.path, flags).map_err(open_err)?;
    conn.execute_batch(&format!(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {};",
        settings.busy_timeout_ms
    ))
    .map_err(open_err)?;

    Ok(conn)
}

/// A connection owned by one request context.
///
/// Every call site in the context shares the same handle. Once the context
/// closes it, every operation returns [`DbError::Closed`].
#[derive(Debug)]
pub struct DbHandle {
    path: String,
    conn: Mutex<Option<Connection>>,
}

impl DbHandle {
    pub(crate) fn new(path: impl Into<String>, conn: Connection) -> Self {
        Self {
            path: path.into(),
            conn: Mutex::new(Some(conn)),
        }
    }

    /// The path this handle was opened against.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `true` once the handle has been closed.
    pub fn is_closed(&self) -> bool {
        match self.conn.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    /// Runs `f` against the open connection.
    ///
    /// The lock is held for the duration of `f`, so statements issued
    /// through one handle never interleave.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Closed` (converted into `E`) if the handle is
    /// closed, or whatever `f` returns.
    pub fn with_conn<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(DbError::Closed)?;
        f(conn)
    }

    /// Runs `f` inside a transaction, committing if it returns `Ok`.
    ///
    /// The transaction rolls back when `f` fails.
    pub fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(DbError::from)?;
            let value = f(&tx)?;
            tx.commit().map_err(DbError::from)?;
            Ok(value)
        })
    }

    /// Executes a single statement, returning the number of changed rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize, DbError> {
        self.with_conn(|conn| Ok(conn.execute(sql, params)?))
    }

    /// Executes a batch of `;`-separated statements.
    pub fn execute_batch(&self, sql: &str) -> Result<(), DbError> {
        self.with_conn(|conn| Ok(conn.execute_batch(sql)?))
    }

    /// Decodes the first row of `sql`, if any.
    pub fn query_opt<T: FromRow, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Option<T>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query(params)?;
            let first = match rows.next()? {
                Some(row) => Some(T::from_row(row)?),
                None => None,
            };
            Ok(first)
        })
    }

    /// Decodes every row of `sql`.
    pub fn query_all<T: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<Vec<T>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params, |row| T::from_row(row))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    /// Closes the connection. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Sqlite` if SQLite refuses to close cleanly. The
    /// handle is marked closed either way.
    pub fn close(&self) -> Result<(), DbError> {
        let conn = match self.conn.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match conn {
            Some(conn) => conn.close().map_err(|(_, e)| DbError::Sqlite(e)),
            None => Ok(()),
        }
    }
}
