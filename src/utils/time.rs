//! Time utilities: HH:MM times, working-hour windows and timestamps.

use crate::errors::{AppError, AppResult};
use chrono::{NaiveDateTime, NaiveTime};

pub fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t.trim(), "%H:%M").ok()
}

/// Parse a `HH:MM-HH:MM` working window.
pub fn parse_window(s: &str) -> AppResult<(NaiveTime, NaiveTime)> {
    let (a, b) = s
        .split_once('-')
        .ok_or_else(|| AppError::InvalidTime(format!("{s} (expected HH:MM-HH:MM)")))?;
    let start = parse_time(a).ok_or_else(|| AppError::InvalidTime(a.to_string()))?;
    let end = parse_time(b).ok_or_else(|| AppError::InvalidTime(b.to_string()))?;
    Ok((start, end))
}

/// Accepts `YYYY-MM-DD HH:MM`, `YYYY-MM-DD HH:MM:SS` or ISO `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_datetime(s: &str) -> AppResult<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    let s = s.trim();
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .ok_or_else(|| AppError::InvalidDate(s.to_string()))
}

pub fn parse_optional_datetime(input: Option<&String>) -> AppResult<Option<NaiveDateTime>> {
    input.map(|s| parse_datetime(s)).transpose()
}
