//! Pool construction and per-connection pragmas.

use std::path::Path;

use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::errors::Result;
use crate::migrations;

/// Shared handle to the SQLite connection pool.
pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;

/// A connection checked out of the pool.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Open (creating if necessary) the database at `path`, apply pragmas to
/// every pooled connection, and run pending migrations.
///
/// WAL keeps readers unblocked during the orchestrator's writes; the busy
/// timeout covers the short write bursts a chat turn produces.
pub fn open_pool(path: impl AsRef<Path>, max_size: u32) -> Result<ConnectionPool> {
    let path = path.as_ref();

    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
    });

    let pool = r2d2::Pool::builder().max_size(max_size).build(manager)?;

    let conn = pool.get()?;
    migrations::run_migrations(&conn)?;
    info!(path = %path.display(), "database ready");

    Ok(pool)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
