use crate::errors::{AppError, AppResult};
use crate::models::coordinate::Coordinate;
use crate::models::presence::{PresenceEvent, PresenceEventType, ZoneMembershipState};
use crate::models::record::{AttendanceRecord, ReviewStatus};
use crate::models::record_type::RecordType;
use crate::models::zone::{WorkingHours, Zone};
use chrono::{NaiveDateTime, NaiveTime};
use rusqlite::types::Type;
use rusqlite::{Connection, Result, Row, params};
use std::collections::BTreeSet;

pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIME_FORMAT: &str = "%H:%M";

fn conversion_error(col: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(err))
}

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn parse_datetime_col(row: &Row, name: &str) -> Result<NaiveDateTime> {
    let s: String = row.get(name)?;
    NaiveDateTime::parse_from_str(&s, DATETIME_FORMAT)
        .map_err(|_| conversion_error(0, AppError::InvalidDate(s.clone())))
}

fn parse_time_col(row: &Row, name: &str) -> Result<NaiveTime> {
    let s: String = row.get(name)?;
    NaiveTime::parse_from_str(&s, TIME_FORMAT)
        .map_err(|_| conversion_error(0, AppError::InvalidTime(s.clone())))
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

fn map_zone(row: &Row) -> Result<Zone> {
    let types_str: String = row.get("permitted_types")?;
    let mut permitted = BTreeSet::new();
    for t in types_str.split(',').filter(|t| !t.is_empty()) {
        let rt = RecordType::from_db_str(t)
            .ok_or_else(|| conversion_error(0, AppError::InvalidRecordType(t.to_string())))?;
        permitted.insert(rt);
    }

    let days_str: String = row.get("work_days")?;
    let mut days = BTreeSet::new();
    for d in days_str.split(',').filter(|d| !d.is_empty()) {
        let n = d
            .parse::<u8>()
            .map_err(|_| conversion_error(0, AppError::InvalidWeekday(d.to_string())))?;
        days.insert(n);
    }

    Ok(Zone {
        id: row.get("id")?,
        name: row.get("name")?,
        center: Coordinate::new(row.get("latitude")?, row.get("longitude")?),
        radius_meters: row.get("radius_meters")?,
        is_active: row.get::<_, i32>("is_active")? == 1,
        permitted_record_types: permitted,
        working_hours: WorkingHours::new(
            parse_time_col(row, "work_start")?,
            parse_time_col(row, "work_end")?,
            days,
        ),
    })
}

pub fn load_zones(conn: &Connection) -> AppResult<Vec<Zone>> {
    let mut stmt = conn.prepare("SELECT * FROM zones ORDER BY id ASC")?;
    let rows = stmt.query_map([], map_zone)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Insert or overwrite a zone row, keeping the registry's id.
pub fn save_zone(conn: &Connection, zone: &Zone) -> AppResult<()> {
    let days = zone
        .working_hours
        .days
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",");

    conn.execute(
        "INSERT OR REPLACE INTO zones
            (id, name, latitude, longitude, radius_meters, is_active,
             permitted_types, work_start, work_end, work_days)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            zone.id,
            zone.name,
            zone.center.latitude,
            zone.center.longitude,
            zone.radius_meters,
            zone.is_active as i32,
            RecordType::join_db(&zone.permitted_record_types),
            zone.working_hours.start.format(TIME_FORMAT).to_string(),
            zone.working_hours.end.format(TIME_FORMAT).to_string(),
            days,
        ],
    )?;
    conn.execute(
        "INSERT INTO meta (key, value) VALUES ('zone_id_high_water', ?1)
         ON CONFLICT(key) DO UPDATE SET value = MAX(value, excluded.value)",
        [zone.id],
    )?;
    Ok(())
}

/// Highest zone id ever stored, including ids of zones since deleted.
pub fn zone_id_high_water(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT IFNULL((SELECT value FROM meta WHERE key = 'zone_id_high_water'), 0)",
        [],
        |row| row.get(0),
    )?)
}

pub fn delete_zone(conn: &Connection, zone_id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM zones WHERE id = ?1", [zone_id])?)
}

// ---------------------------------------------------------------------------
// Attendance records
// ---------------------------------------------------------------------------

pub fn map_record(row: &Row) -> Result<AttendanceRecord> {
    let type_str: String = row.get("record_type")?;
    let record_type = RecordType::from_db_str(&type_str)
        .ok_or_else(|| conversion_error(0, AppError::InvalidRecordType(type_str.clone())))?;

    let status_str: String = row.get("review_status")?;
    let review_status = ReviewStatus::from_db_str(&status_str)
        .ok_or_else(|| conversion_error(0, AppError::InvalidReviewStatus(status_str.clone())))?;

    Ok(AttendanceRecord {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        record_type,
        occurred_at: parse_datetime_col(row, "occurred_at")?,
        zone_id: row.get("zone_id")?,
        coordinate: Coordinate::new(row.get("latitude")?, row.get("longitude")?),
        accuracy: row.get("accuracy")?,
        review_status,
        photo_ref: row.get("photo_ref")?,
        notes: row.get("notes")?,
        review_note: row.get("review_note")?,
    })
}

pub fn load_records(conn: &Connection) -> AppResult<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare("SELECT * FROM attendance_records ORDER BY id ASC")?;
    let rows = stmt.query_map([], map_record)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn insert_record(conn: &Connection, rec: &AttendanceRecord) -> AppResult<()> {
    conn.execute(
        "INSERT INTO attendance_records
            (id, user_id, record_type, occurred_at, zone_id, latitude, longitude,
             accuracy, review_status, photo_ref, notes, review_note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            rec.id,
            rec.user_id,
            rec.record_type.to_db_str(),
            format_datetime(&rec.occurred_at),
            rec.zone_id,
            rec.coordinate.latitude,
            rec.coordinate.longitude,
            rec.accuracy,
            rec.review_status.to_db_str(),
            rec.photo_ref,
            rec.notes,
            rec.review_note,
        ],
    )?;
    Ok(())
}

/// Only the review fields ever change after a record is written.
pub fn update_record(conn: &Connection, rec: &AttendanceRecord) -> AppResult<()> {
    let changed = conn.execute(
        "UPDATE attendance_records SET review_status = ?1, review_note = ?2 WHERE id = ?3",
        params![rec.review_status.to_db_str(), rec.review_note, rec.id],
    )?;
    if changed == 0 {
        return Err(AppError::RecordNotFound(rec.id));
    }
    Ok(())
}

pub fn delete_record(conn: &Connection, record_id: i64) -> AppResult<()> {
    let changed = conn.execute("DELETE FROM attendance_records WHERE id = ?1", [record_id])?;
    if changed == 0 {
        return Err(AppError::RecordNotFound(record_id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Presence events
// ---------------------------------------------------------------------------

fn map_presence(row: &Row) -> Result<PresenceEvent> {
    let kind_str: String = row.get("event_type")?;
    let event_type = PresenceEventType::from_db_str(&kind_str).ok_or_else(|| {
        conversion_error(0, AppError::Other(format!("Invalid presence event: {kind_str}")))
    })?;

    Ok(PresenceEvent {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        zone_id: row.get("zone_id")?,
        event_type,
        coordinate: Coordinate::new(row.get("latitude")?, row.get("longitude")?),
        accuracy: row.get("accuracy")?,
        occurred_at: parse_datetime_col(row, "occurred_at")?,
    })
}

pub fn insert_presence_event(conn: &Connection, ev: &PresenceEvent) -> AppResult<()> {
    conn.execute(
        "INSERT INTO presence_events
            (id, user_id, zone_id, event_type, latitude, longitude, accuracy, occurred_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            ev.id,
            ev.user_id,
            ev.zone_id,
            ev.event_type.to_db_str(),
            ev.coordinate.latitude,
            ev.coordinate.longitude,
            ev.accuracy,
            format_datetime(&ev.occurred_at),
        ],
    )?;
    Ok(())
}

pub fn load_presence_events(
    conn: &Connection,
    user_id: Option<&str>,
) -> AppResult<Vec<PresenceEvent>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM presence_events
         WHERE ?1 IS NULL OR user_id = ?1
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([user_id], map_presence)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn max_presence_event_id(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT IFNULL(MAX(id), 0) FROM presence_events", [], |r| {
        r.get(0)
    })?)
}

/// Membership per zone as left by the user's latest presence event there.
pub fn last_presence_states(
    conn: &Connection,
    user_id: &str,
) -> AppResult<Vec<(i64, ZoneMembershipState)>> {
    let mut stmt = conn.prepare(
        "SELECT p.* FROM presence_events p
         WHERE p.user_id = ?1
           AND p.id = (SELECT MAX(id) FROM presence_events q
                       WHERE q.user_id = p.user_id AND q.zone_id = p.zone_id)
         ORDER BY p.zone_id ASC",
    )?;
    let rows = stmt.query_map([user_id], map_presence)?;

    let mut out = Vec::new();
    for r in rows {
        let ev = r?;
        out.push((
            ev.zone_id,
            ZoneMembershipState {
                inside: ev.event_type.is_enter(),
                last_evaluated_at: ev.occurred_at,
            },
        ));
    }
    Ok(out)
}
