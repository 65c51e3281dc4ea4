use crate::db::pool::DbPool;
use crate::db::queries::{load_presence_events, load_records, load_zones};
use crate::errors::{AppError, AppResult};
use crate::export::csv::write_csv;
use crate::export::fs_utils::ensure_writable;
use crate::export::json::write_json;
use crate::export::model::{PresenceExport, RecordExport};
use crate::export::{ExportFormat, notify_export_success};
use crate::ui::messages::warning;
use crate::utils::date::parse_period;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// What to export and how to filter it.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// `None` or `"all"` for everything, otherwise a period as accepted by
    /// [`parse_period`].
    pub period: Option<String>,
    pub user: Option<String>,
    /// Export presence events instead of attendance records.
    pub presence: bool,
}

pub struct ExportLogic;

impl ExportLogic {
    /// Write the selected rows to `file` (absolute path). Returns the row count.
    pub fn export(
        pool: &DbPool,
        format: ExportFormat,
        file: &str,
        req: &ExportRequest,
        force: bool,
    ) -> AppResult<usize> {
        let path = Path::new(file);
        if !path.is_absolute() {
            return Err(AppError::Export(format!(
                "output file path must be absolute: {file}"
            )));
        }

        let bounds = match req.period.as_deref() {
            None => None,
            Some(p) if p.eq_ignore_ascii_case("all") => None,
            Some(p) => Some(parse_period(p)?),
        };
        let in_range =
            |at: &NaiveDateTime| bounds.is_none_or(|(start, end)| *at >= start && *at < end);
        let for_user = |user: &str| req.user.as_deref().is_none_or(|u| u == user);

        ensure_writable(path, force)?;

        if req.presence {
            let rows: Vec<PresenceExport> = load_presence_events(&pool.conn, req.user.as_deref())?
                .iter()
                .filter(|ev| in_range(&ev.occurred_at))
                .map(PresenceExport::from)
                .collect();
            write_rows(&rows, format, path, "Presence")
        } else {
            let names: HashMap<i64, String> = load_zones(&pool.conn)?
                .into_iter()
                .map(|z| (z.id, z.name))
                .collect();
            let rows: Vec<RecordExport> = load_records(&pool.conn)?
                .iter()
                .filter(|r| for_user(&r.user_id) && in_range(&r.occurred_at))
                .map(|r| {
                    let name = names.get(&r.zone_id).map(String::as_str).unwrap_or("");
                    RecordExport::from_record(r, name)
                })
                .collect();
            write_rows(&rows, format, path, "Attendance")
        }
    }
}

fn write_rows<T: Serialize>(
    rows: &[T],
    format: ExportFormat,
    path: &Path,
    label: &str,
) -> AppResult<usize> {
    if rows.is_empty() {
        warning("No rows found for the selected filters.");
        return Ok(0);
    }

    match format {
        ExportFormat::Csv => write_csv(rows, path)?,
        ExportFormat::Json => write_json(rows, path)?,
    }

    notify_export_success(label, rows.len(), path);
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::insert_record;
    use crate::models::coordinate::Coordinate;
    use crate::models::record::{AttendanceRecord, ReviewStatus};
    use crate::models::record_type::RecordType;
    use chrono::NaiveDate;

    fn record(id: i64, user: &str, day: u32) -> AttendanceRecord {
        AttendanceRecord {
            id,
            user_id: user.into(),
            record_type: RecordType::CheckIn,
            occurred_at: NaiveDate::from_ymd_opt(2025, 9, day)
                .unwrap()
                .and_hms_opt(8, 15, 0)
                .unwrap(),
            zone_id: 1,
            coordinate: Coordinate::new(13.75657, 100.5018),
            accuracy: 10.0,
            review_status: ReviewStatus::Pending,
            photo_ref: None,
            notes: Some("gate, north".into()),
            review_note: None,
        }
    }

    #[test]
    fn csv_export_filters_by_period_and_user() {
        let pool = DbPool::in_memory().unwrap();
        insert_record(&pool.conn, &record(1, "alice", 1)).unwrap();
        insert_record(&pool.conn, &record(2, "alice", 2)).unwrap();
        insert_record(&pool.conn, &record(3, "bob", 2)).unwrap();

        let out = std::env::temp_dir().join(format!("rgeoattend_logic_{}.csv", std::process::id()));
        let req = ExportRequest {
            period: Some("2025-09-02".into()),
            user: Some("alice".into()),
            presence: false,
        };
        let n = ExportLogic::export(&pool, ExportFormat::Csv, &out.to_string_lossy(), &req, true)
            .unwrap();
        assert_eq!(n, 1);

        let content = std::fs::read_to_string(&out).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("id,user_id,record_type,occurred_at"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("2,alice,check_in,2025-09-02T08:15:00"));
        assert!(row.contains("\"gate, north\""));
        assert!(lines.next().is_none());
        let _ = std::fs::remove_file(&out);
    }

    #[test]
    fn relative_output_path_is_rejected() {
        let pool = DbPool::in_memory().unwrap();
        let req = ExportRequest::default();
        let err =
            ExportLogic::export(&pool, ExportFormat::Json, "out.json", &req, true).unwrap_err();
        assert!(matches!(err, AppError::Export(_)));
    }
}
