use crate::db::migrate::run_pending_migrations;
use crate::errors::AppResult;
use rusqlite::Connection;

/// Initialize the database schema.
/// Creates the base tables if missing, then applies pending migrations.
pub fn init_db(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS zones (
            id             INTEGER PRIMARY KEY,
            name           TEXT NOT NULL,
            latitude       REAL NOT NULL,
            longitude      REAL NOT NULL,
            radius_meters  REAL NOT NULL CHECK (radius_meters > 0),
            is_active      INTEGER NOT NULL DEFAULT 1,
            permitted_types TEXT NOT NULL DEFAULT '',  -- comma separated record types
            work_start     TEXT NOT NULL,              -- HH:MM
            work_end       TEXT NOT NULL,              -- HH:MM
            work_days      TEXT NOT NULL               -- comma separated 0..6, 0 = Sunday
        );

        CREATE TABLE IF NOT EXISTS attendance_records (
            id             INTEGER PRIMARY KEY,
            user_id        TEXT NOT NULL,
            record_type    TEXT NOT NULL CHECK (record_type IN
                ('check_in','check_out','break_start','break_end','overtime_start','overtime_end')),
            occurred_at    TEXT NOT NULL,              -- ISO 8601
            zone_id        INTEGER NOT NULL,
            latitude       REAL NOT NULL,
            longitude      REAL NOT NULL,
            accuracy       REAL NOT NULL DEFAULT 0,
            review_status  TEXT NOT NULL DEFAULT 'pending' CHECK (review_status IN
                ('pending','approved','rejected','auto_approved')),
            photo_ref      TEXT,
            notes          TEXT
        );

        CREATE TABLE IF NOT EXISTS presence_events (
            id          INTEGER PRIMARY KEY,
            user_id     TEXT NOT NULL,
            zone_id     INTEGER NOT NULL,
            event_type  TEXT NOT NULL CHECK (event_type IN ('enter','exit')),
            latitude    REAL NOT NULL,
            longitude   REAL NOT NULL,
            accuracy    REAL NOT NULL DEFAULT 0,
            occurred_at TEXT NOT NULL                  -- ISO 8601
        );

        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        ",
    )?;
    run_pending_migrations(conn)?;
    Ok(())
}
