//! Schema migrations, versioned through SQLite's `user_version` pragma.

use crate::db::log::ttlog;
use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, Result};

struct Migration {
    version: i32,
    name: &'static str,
    apply: fn(&Connection) -> Result<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "index attendance records and presence events",
        apply: create_indexes,
    },
    Migration {
        version: 2,
        name: "add review_note to attendance_records",
        apply: add_review_note_column,
    },
    Migration {
        version: 3,
        name: "track the highest zone id ever issued",
        apply: create_meta_table,
    },
];

/// Check if `table` has a column called `column`.
fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{table}')"))?;
    let cols = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for c in cols {
        if c? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_records_user_time
            ON attendance_records(user_id, occurred_at);
        CREATE INDEX IF NOT EXISTS idx_records_status ON attendance_records(review_status);
        CREATE INDEX IF NOT EXISTS idx_presence_user_zone ON presence_events(user_id, zone_id, id);
        "#,
    )
}

fn add_review_note_column(conn: &Connection) -> Result<()> {
    if column_exists(conn, "attendance_records", "review_note")? {
        return Ok(());
    }
    conn.execute_batch("ALTER TABLE attendance_records ADD COLUMN review_note TEXT;")
}

fn create_meta_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            key   TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );
        INSERT OR IGNORE INTO meta (key, value)
            SELECT 'zone_id_high_water', IFNULL(MAX(id), 0) FROM zones;
        "#,
    )
}

pub fn schema_version(conn: &Connection) -> Result<i32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Apply every migration newer than the stored schema version, each in its
/// own transaction, and record it in the internal log.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    let current = schema_version(conn)?;

    for m in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.unchecked_transaction()?;

        (m.apply)(&tx)
            .map_err(|e| AppError::Migration(format!("v{} ({}): {e}", m.version, m.name)))?;
        tx.pragma_update(None, "user_version", m.version)?;
        ttlog(&tx, "migration_applied", &format!("v{}", m.version), m.name)?;
        tx.commit()?;

        tracing::info!(version = m.version, name = m.name, "database migration applied");
    }

    Ok(())
}
