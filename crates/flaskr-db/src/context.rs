//! Request-scoped connection provider and teardown hook.

use std::error::Error;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::error::DbError;
use crate::handle::{open_connection, DbHandle, DbSettings};

#[derive(Debug)]
enum Slot {
    Empty,
    Open(Arc<DbHandle>),
    TornDown,
}

/// The scope of one request or CLI invocation.
///
/// Holds at most one database connection, opened on first use by
/// [`get_db`] and closed by [`close_db`] when the scope ends. Dropping the
/// context runs the teardown if the owner did not.
#[derive(Debug)]
pub struct RequestContext {
    id: Uuid,
    settings: DbSettings,
    slot: Mutex<Slot>,
}

impl RequestContext {
    /// Starts a new scope that will open `settings` on demand.
    pub fn new(settings: DbSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            slot: Mutex::new(Slot::Empty),
        }
    }

    /// Unique id of this scope, used in log fields.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The store this scope opens.
    pub fn settings(&self) -> &DbSettings {
        &self.settings
    }

    /// Returns `true` if a connection is currently open in this scope.
    pub fn has_connection(&self) -> bool {
        match self.slot.lock() {
            Ok(slot) => matches!(*slot, Slot::Open(_)),
            Err(poisoned) => matches!(*poisoned.into_inner(), Slot::Open(_)),
        }
    }

    /// Ends the scope, running the teardown hook. Later calls are no-ops.
    pub fn teardown(&self, error: Option<&(dyn Error + 'static)>) {
        close_db(self, error);
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        close_db(self, None);
    }
}

/// Returns the connection for `ctx`, opening it on first use.
///
/// Every call within one context returns the same handle (`Arc::ptr_eq`).
///
/// # Errors
///
/// Returns `DbError::Open` if the store cannot be opened, or
/// `DbError::Closed` if the context has already been torn down.
pub fn get_db(ctx: &RequestContext) -> Result<Arc<DbHandle>, DbError> {
    let mut slot = ctx.slot.lock().map_err(|_| DbError::Poisoned)?;
    match &*slot {
        Slot::Open(handle) => return Ok(Arc::clone(handle)),
        Slot::TornDown => return Err(DbError::Closed),
        Slot::Empty => {}
    }

    let conn = open_connection(&ctx.settings)?;
    let handle = Arc::new(DbHandle::new(ctx.settings.path.clone(), conn));
    tracing::debug!(context = %ctx.id, path = %ctx.settings.path, "opened database connection");
    *slot = Slot::Open(Arc::clone(&handle));
    Ok(handle)
}

/// Teardown hook: closes the connection for `ctx` if one was opened.
///
/// The error indicator describes why the scope ended and is only logged.
/// Never fails; a failed close is logged and the handle still reads as
/// closed.
pub fn close_db(ctx: &RequestContext, error: Option<&(dyn Error + 'static)>) {
    let previous = match ctx.slot.lock() {
        Ok(mut slot) => std::mem::replace(&mut *slot, Slot::TornDown),
        Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), Slot::TornDown),
    };

    if let Some(error) = error {
        tracing::debug!(context = %ctx.id, error = %error, "request context ended with error");
    }

    if let Slot::Open(handle) = previous {
        match handle.close() {
            Ok(()) => tracing::debug!(context = %ctx.id, "closed database connection"),
            Err(e) => tracing::warn!(context = %ctx.id, "failed to close database connection: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_context() -> RequestContext {
        RequestContext::new(DbSettings::new(":memory:"))
    }

    #[test]
    fn get_db_returns_same_handle_within_context() {
        let ctx = memory_context();
        let first = get_db(&ctx).expect("should open");
        let second = get_db(&ctx).expect("should reuse");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn get_db_is_lazy() {
        let ctx = memory_context();
        assert!(!ctx.has_connection());
        get_db(&ctx).expect("should open");
        assert!(ctx.has_connection());
    }

    #[test]
    fn separate_contexts_get_separate_handles() {
        let a = memory_context();
        let b = memory_context();
        let ha = get_db(&a).expect("should open a");
        let hb = get_db(&b).expect("should open b");
        assert!(!Arc::ptr_eq(&ha, &hb));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn teardown_closes_saved_handle() {
        let ctx = memory_context();
        let db = get_db(&ctx).expect("should open");
        ctx.teardown(None);

        let err = db.execute("SELECT 1", []).expect_err("use after close");
        assert!(err.is_closed());
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn get_db_after_teardown_does_not_reopen() {
        let ctx = memory_context();
        ctx.teardown(None);
        let err = get_db(&ctx).expect_err("torn down context");
        assert!(err.is_closed());
    }

    #[test]
    fn teardown_without_connection_is_noop() {
        let ctx = memory_context();
        let cause = std::io::Error::other("handler failed");
        ctx.teardown(Some(&cause));
        ctx.teardown(None);
        assert!(!ctx.has_connection());
    }

    #[test]
    fn drop_closes_connection() {
        let ctx = memory_context();
        let db = get_db(&ctx).expect("should open");
        drop(ctx);
        assert!(db.is_closed());
    }
}
