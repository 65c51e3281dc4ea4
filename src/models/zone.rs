use super::coordinate::Coordinate;
use super::record_type::RecordType;
use crate::core::geo;
use crate::errors::{AppError, AppResult};
use chrono::{Datelike, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const DAY_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];
const DAY_FULL_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Daily window in which records may be created.
///
/// `days` holds weekday numbers with 0 = Sunday. The window is inclusive on
/// both ends and never wraps past midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub days: BTreeSet<u8>,
}

impl WorkingHours {
    pub fn new(start: NaiveTime, end: NaiveTime, days: impl IntoIterator<Item = u8>) -> Self {
        Self {
            start,
            end,
            days: days.into_iter().collect(),
        }
    }

    /// Monday to Friday between `start` and `end`.
    pub fn weekdays(start: NaiveTime, end: NaiveTime) -> Self {
        Self::new(start, end, 1..=5)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.start > self.end {
            return Err(AppError::InvalidZone(format!(
                "working hours start {} is after end {} (overnight windows are not supported)",
                self.start.format("%H:%M"),
                self.end.format("%H:%M")
            )));
        }
        if let Some(bad) = self.days.iter().find(|d| **d > 6) {
            return Err(AppError::InvalidZone(format!(
                "day of week {bad} is out of range 0..=6"
            )));
        }
        Ok(())
    }

    /// True when `at` falls on a working day and inside the daily window.
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let day = at.weekday().num_days_from_sunday() as u8;
        let t = at.time();
        self.days.contains(&day) && self.start <= t && t <= self.end
    }

    /// Parse day lists such as `mon-fri`, `sat,sun`, `1,3,5`, `all`.
    pub fn parse_days(s: &str) -> AppResult<BTreeSet<u8>> {
        let s = s.trim().to_lowercase();
        if s == "all" {
            return Ok((0..=6).collect());
        }

        let mut out = BTreeSet::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if let Some((a, b)) = part.split_once('-') {
                let from = parse_day(a)?;
                let to = parse_day(b)?;
                // sat-sun style ranges wrap around the week
                let mut d = from;
                loop {
                    out.insert(d);
                    if d == to {
                        break;
                    }
                    d = (d + 1) % 7;
                }
            } else {
                out.insert(parse_day(part)?);
            }
        }

        if out.is_empty() {
            return Err(AppError::InvalidWeekday(s));
        }
        Ok(out)
    }

    pub fn describe_days(&self) -> String {
        self.days
            .iter()
            .filter_map(|d| DAY_NAMES.get(*d as usize).copied())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn describe(&self) -> String {
        format!(
            "{}-{} {}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            self.describe_days()
        )
    }
}

fn parse_day(s: &str) -> AppResult<u8> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u8>() {
        return if n <= 6 {
            Ok(n)
        } else {
            Err(AppError::InvalidWeekday(s.to_string()))
        };
    }

    DAY_NAMES
        .iter()
        .position(|d| *d == s)
        .or_else(|| DAY_FULL_NAMES.iter().position(|d| *d == s))
        .map(|p| p as u8)
        .ok_or_else(|| AppError::InvalidWeekday(s.to_string()))
}

/// A circular geofence with its attendance policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    pub center: Coordinate,
    pub radius_meters: f64,
    pub is_active: bool,
    pub permitted_record_types: BTreeSet<RecordType>,
    pub working_hours: WorkingHours,
}

impl Zone {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidZone("zone name must not be empty".into()));
        }
        if !(self.radius_meters.is_finite() && self.radius_meters > 0.0) {
            return Err(AppError::InvalidZone(format!(
                "radius must be greater than zero (got {})",
                self.radius_meters
            )));
        }
        self.working_hours.validate()
    }

    pub fn distance_to(&self, point: Coordinate) -> f64 {
        geo::distance_meters(self.center, point)
    }

    /// Membership test. The boundary itself counts as inside.
    pub fn contains(&self, point: Coordinate) -> bool {
        self.distance_to(point) <= self.radius_meters
    }

    pub fn permits(&self, record_type: RecordType) -> bool {
        self.permitted_record_types.contains(&record_type)
    }
}

/// Everything needed to create a zone; the registry assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDraft {
    pub name: String,
    pub center: Coordinate,
    pub radius_meters: f64,
    pub is_active: bool,
    pub permitted_record_types: BTreeSet<RecordType>,
    pub working_hours: WorkingHours,
}

impl ZoneDraft {
    pub fn into_zone(self, id: i64) -> Zone {
        Zone {
            id,
            name: self.name,
            center: self.center,
            radius_meters: self.radius_meters,
            is_active: self.is_active,
            permitted_record_types: self.permitted_record_types,
            working_hours: self.working_hours,
        }
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZonePatch {
    pub name: Option<String>,
    pub center: Option<Coordinate>,
    pub radius_meters: Option<f64>,
    pub is_active: Option<bool>,
    pub permitted_record_types: Option<BTreeSet<RecordType>>,
    pub working_hours: Option<WorkingHours>,
}

impl ZonePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce the patched copy of `zone`; the original is not touched.
    pub fn apply(&self, zone: &Zone) -> Zone {
        let mut out = zone.clone();
        if let Some(name) = &self.name {
            out.name = name.clone();
        }
        if let Some(center) = self.center {
            out.center = center;
        }
        if let Some(radius) = self.radius_meters {
            out.radius_meters = radius;
        }
        if let Some(active) = self.is_active {
            out.is_active = active;
        }
        if let Some(types) = &self.permitted_record_types {
            out.permitted_record_types = types.clone();
        }
        if let Some(hours) = &self.working_hours {
            out.working_hours = hours.clone();
        }
        out
    }
}
