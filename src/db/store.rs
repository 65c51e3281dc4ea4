//! SQLite-backed record sink for the attendance recorder.

use crate::core::recorder::RecordSink;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::{delete_record, insert_record, update_record};
use crate::errors::AppResult;
use crate::models::record::AttendanceRecord;

impl RecordSink for DbPool {
    fn persist(&mut self, record: &AttendanceRecord) -> AppResult<()> {
        insert_record(&self.conn, record)?;
        ttlog_quiet(
            &self.conn,
            "record_added",
            &record.id.to_string(),
            &format!(
                "{} {} for {} in zone {}",
                record.record_type, record.occurred_at, record.user_id, record.zone_id
            ),
        );
        Ok(())
    }

    fn update(&mut self, record: &AttendanceRecord) -> AppResult<()> {
        update_record(&self.conn, record)?;
        ttlog_quiet(
            &self.conn,
            "record_reviewed",
            &record.id.to_string(),
            &format!("status set to {}", record.review_status),
        );
        Ok(())
    }

    fn remove(&mut self, record_id: i64) -> AppResult<()> {
        delete_record(&self.conn, record_id)?;
        ttlog_quiet(&self.conn, "record_deleted", &record_id.to_string(), "record removed");
        Ok(())
    }
}
