use super::coordinate::Coordinate;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceEventType {
    Enter,
    Exit,
}

impl PresenceEventType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PresenceEventType::Enter => "enter",
            PresenceEventType::Exit => "exit",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "enter" => Some(PresenceEventType::Enter),
            "exit" => Some(PresenceEventType::Exit),
            _ => None,
        }
    }

    pub fn is_enter(&self) -> bool {
        matches!(self, PresenceEventType::Enter)
    }
}

impl fmt::Display for PresenceEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

/// A detected zone transition for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceEvent {
    pub id: i64,
    pub user_id: String,
    pub zone_id: i64,
    pub event_type: PresenceEventType,
    pub coordinate: Coordinate,
    pub accuracy: f64,
    pub occurred_at: NaiveDateTime,
}

/// Last known membership of one user in one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneMembershipState {
    pub inside: bool,
    pub last_evaluated_at: NaiveDateTime,
}
