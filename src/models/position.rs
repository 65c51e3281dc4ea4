use super::coordinate::Coordinate;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One fix delivered by the external position source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Reported horizontal accuracy, in meters.
    pub accuracy: f64,
    pub captured_at: NaiveDateTime,
}

impl PositionSample {
    pub fn new(coordinate: Coordinate, accuracy: f64, captured_at: NaiveDateTime) -> Self {
        Self {
            coordinate,
            accuracy,
            captured_at,
        }
    }
}

/// Terminal conditions a position source may report instead of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionError {
    PermissionDenied,
    Unavailable,
    Timeout,
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PositionError::PermissionDenied => "permission denied",
            PositionError::Unavailable => "position unavailable",
            PositionError::Timeout => "timed out",
        };
        f.write_str(s)
    }
}

/// What a position source emits: a sample or a failure.
pub type PositionUpdate = Result<PositionSample, PositionError>;
