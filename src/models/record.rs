use super::{coordinate::Coordinate, record_type::RecordType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
    AutoApproved,
}

impl ReviewStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::AutoApproved => "auto_approved",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReviewStatus::Pending),
            "approved" => Some(ReviewStatus::Approved),
            "rejected" => Some(ReviewStatus::Rejected),
            "auto_approved" => Some(ReviewStatus::AutoApproved),
            _ => None,
        }
    }

    /// Helper: accept `approve`/`approved`, `reject`/`rejected`, ... from the CLI
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().replace('-', "_").as_str() {
            "pending" => Some(ReviewStatus::Pending),
            "approve" | "approved" => Some(ReviewStatus::Approved),
            "reject" | "rejected" => Some(ReviewStatus::Rejected),
            "auto" | "auto_approved" => Some(ReviewStatus::AutoApproved),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ReviewStatus::Pending)
    }

    /// Moves an external reviewer may make. AutoApproved is reserved for policy.
    pub fn can_review_to(&self, next: ReviewStatus) -> bool {
        self.is_pending() && matches!(next, ReviewStatus::Approved | ReviewStatus::Rejected)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

/// An attendance timestamp accepted against a zone's policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub user_id: String,
    pub record_type: RecordType,
    pub occurred_at: NaiveDateTime,
    pub zone_id: i64,
    pub coordinate: Coordinate,
    pub accuracy: f64,
    pub review_status: ReviewStatus,
    pub photo_ref: Option<String>,
    pub notes: Option<String>,
    pub review_note: Option<String>,
}

/// A user-initiated request to create an [`AttendanceRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRequest {
    pub user_id: String,
    pub record_type: RecordType,
    pub coordinate: Coordinate,
    pub accuracy: f64,
    pub zone_hint: Option<i64>,
    pub photo_ref: Option<String>,
    pub notes: Option<String>,
}

impl RecordRequest {
    pub fn new(
        user_id: impl Into<String>,
        record_type: RecordType,
        coordinate: Coordinate,
        accuracy: f64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            record_type,
            coordinate,
            accuracy,
            zone_hint: None,
            photo_ref: None,
            notes: None,
        }
    }

    /// Skip the nearest-zone lookup and validate against this zone.
    pub fn with_zone(mut self, zone_id: i64) -> Self {
        self.zone_hint = Some(zone_id);
        self
    }

    pub fn with_photo(mut self, photo_ref: impl Into<String>) -> Self {
        self.photo_ref = Some(photo_ref.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reviewer_moves_only_from_pending() {
        use ReviewStatus::*;
        assert!(Pending.can_review_to(Approved));
        assert!(Pending.can_review_to(Rejected));
        assert!(!Pending.can_review_to(AutoApproved));
        assert!(!Pending.can_review_to(Pending));
        assert!(!Approved.can_review_to(Rejected));
        assert!(!AutoApproved.can_review_to(Approved));
    }

    #[test]
    fn status_codes() {
        assert_eq!(ReviewStatus::from_code("approve"), Some(ReviewStatus::Approved));
        assert_eq!(
            ReviewStatus::from_code("Auto-Approved"),
            Some(ReviewStatus::AutoApproved)
        );
        assert_eq!(ReviewStatus::from_code("maybe"), None);
    }
}
