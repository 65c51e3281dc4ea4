use crate::db::queries::format_datetime;
use crate::models::presence::PresenceEvent;
use crate::models::record::AttendanceRecord;
use serde::Serialize;

/// Flat row for attendance record exports.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RecordExport {
    pub id: i64,
    pub user_id: String,
    pub record_type: String,
    pub occurred_at: String,
    pub zone_id: i64,
    pub zone_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub review_status: String,
    pub photo_ref: Option<String>,
    pub notes: Option<String>,
    pub review_note: Option<String>,
}

impl RecordExport {
    pub fn from_record(rec: &AttendanceRecord, zone_name: &str) -> Self {
        Self {
            id: rec.id,
            user_id: rec.user_id.clone(),
            record_type: rec.record_type.to_db_str().to_string(),
            occurred_at: format_datetime(&rec.occurred_at),
            zone_id: rec.zone_id,
            zone_name: zone_name.to_string(),
            latitude: rec.coordinate.latitude,
            longitude: rec.coordinate.longitude,
            accuracy: rec.accuracy,
            review_status: rec.review_status.to_db_str().to_string(),
            photo_ref: rec.photo_ref.clone(),
            notes: rec.notes.clone(),
            review_note: rec.review_note.clone(),
        }
    }
}

/// Flat row for presence event exports.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PresenceExport {
    pub id: i64,
    pub user_id: String,
    pub zone_id: i64,
    pub event_type: String,
    pub occurred_at: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

impl From<&PresenceEvent> for PresenceExport {
    fn from(ev: &PresenceEvent) -> Self {
        Self {
            id: ev.id,
            user_id: ev.user_id.clone(),
            zone_id: ev.zone_id,
            event_type: ev.event_type.to_db_str().to_string(),
            occurred_at: format_datetime(&ev.occurred_at),
            latitude: ev.coordinate.latitude,
            longitude: ev.coordinate.longitude,
            accuracy: ev.accuracy,
        }
    }
}
