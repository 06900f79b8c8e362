//! Ordered schema upgrades.
//!
//! # Invariants
//! - Step `n` upgrades a schema at version `n - 1`; steps never change once
//!   released.
//! - All pending steps run in one transaction together with the version bump.
//! - A schema newer than `target_version()` is refused, never downgraded.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// SQL for each schema version, starting at version 1.
const STEPS: [&str; 2] = [
    include_str!("0001_init.sql"),
    include_str!("0002_relationship_lines.sql"),
];

/// Schema version this build writes.
pub fn target_version() -> u32 {
    STEPS.len() as u32
}

/// Version recorded in the database header.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Brings `conn` up to `target_version()`.
pub fn migrate(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let target = target_version();
    if found > target {
        return Err(DbError::SchemaTooNew {
            found,
            supported: target,
        });
    }
    if found == target {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for sql in &STEPS[found as usize..] {
        tx.execute_batch(sql)?;
    }
    tx.pragma_update(None, "user_version", target)?;
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={target}");
    Ok(())
}
