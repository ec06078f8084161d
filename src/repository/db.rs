//! Database Connection and Setup
//!
//! Opens the local SQLite file and runs migrations.

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Shared connection handle used by every repository
pub type DbConn = Arc<Mutex<Connection>>;

/// Open (or create) the database at `db_path`; `:memory:` gives a private
/// in-memory database.
pub fn init_db(db_path: &Path) -> DomainResult<DbConn> {
    let conn = if db_path.as_os_str() == ":memory:" {
        Connection::open_in_memory()?
    } else {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DomainError::Storage(e.to_string()))?;
        }
        Connection::open(db_path)?
    };

    run_migrations(&conn)?;
    log::info!("Local database ready at {}", db_path.display());
    Ok(Arc::new(Mutex::new(conn)))
}

fn run_migrations(conn: &Connection) -> DomainResult<()> {
    // Queue of operations waiting for the backend.
    // seq keeps insertion order stable when timestamps collide.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS pending_operations (
            id TEXT PRIMARY KEY,
            seq INTEGER NOT NULL,
            op_type TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            payload TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS client_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_pending_seq ON pending_operations(seq)",
        [],
    )?;

    Ok(())
}
