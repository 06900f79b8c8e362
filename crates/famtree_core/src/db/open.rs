//! Connection setup.
//!
//! # Invariants
//! - Foreign keys are enforced, so removing a `family_trees` row drops its
//!   people and lines.
//! - A connection is returned only after `migrate` succeeded on it.

use super::migrations::migrate;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) the tree database at `path`.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    connect("file", Connection::open(path.as_ref()))
}

/// Opens a throwaway in-memory tree database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    connect("memory", Connection::open_in_memory())
}

fn connect(target: &'static str, opened: rusqlite::Result<Connection>) -> DbResult<Connection> {
    let started = Instant::now();
    let result: DbResult<Connection> = opened.map_err(DbError::from).and_then(|mut conn| {
        prepare(&mut conn)?;
        Ok(conn)
    });
    let elapsed_ms = started.elapsed().as_millis();

    match &result {
        Ok(_) => info!("event=db_open module=db status=ok target={target} duration_ms={elapsed_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error target={target} duration_ms={elapsed_ms} error={err}"
        ),
    }
    result
}

fn prepare(conn: &mut Connection) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    migrate(conn)
}
