//! FeedX persistence adapter.
//!
//! [`SqliteStore`] implements every persistence port from [`domain::ports`]
//! over a single SQLite database. [`JsonReferenceData`] serves the read-only
//! ECET datasets from JSON files, and [`import_legacy`] loads content and
//! institute exports written by earlier FeedX deployments.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** SQL, row mapping, and file formats live here. Domain
//! rules (validation, workflow transitions) stay in `domain`; this crate only
//! enforces the storage-level guards the ports describe.
//!
//! ## Concurrency
//!
//! One connection is shared behind a mutex. Every query runs on the blocking
//! thread pool via [`tokio::task::spawn_blocking`].

mod content;
mod import;
mod institutes;
mod issues;
mod reference;
mod schema;
mod sql;
mod users;

use std::path::Path;
use std::sync::{Arc, Mutex};

use domain::StoreError;
use rusqlite::Connection;
use tracing::info;

pub use import::{import_legacy, ImportCount, ImportError};
pub use reference::JsonReferenceData;

use sql::SqlResultExt;

/// SQLite-backed implementation of the domain storage ports.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path).store_err()?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))
            .store_err()?;
        info!(path = %path.display(), "database opened");
        Self::with_connection(conn)
    }

    /// A private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory().store_err()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON").store_err()?;
        conn.busy_timeout(std::time::Duration::from_secs(5)).store_err()?;
        schema::apply(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `op` against the connection on the blocking pool.
    async fn call<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Backend("database connection mutex poisoned".into()))?;
            op(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("database task failed: {e}")))?
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}
