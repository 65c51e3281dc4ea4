//! Attendance rollups. Everything here is a pure function of the record list.

use crate::models::record::AttendanceRecord;
use crate::models::record_type::RecordType;
use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rendered in place of an average when there is nothing to average.
pub const NO_TIME: &str = "--:--";

/// Thresholds for the late / early counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsPolicy {
    /// Check-ins strictly after this time are late.
    pub late_after: NaiveTime,
    /// Check-outs strictly before this time are early.
    pub early_before: NaiveTime,
}

impl Default for StatsPolicy {
    fn default() -> Self {
        Self {
            late_after: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            early_before: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceStats {
    pub total: usize,
    pub today: usize,
    pub this_week: usize,
    pub this_month: usize,
    pub pending_review: usize,
    pub average_check_in: String,
    pub average_check_out: String,
    pub late_check_ins: usize,
    pub early_check_outs: usize,
    pub by_type: BTreeMap<RecordType, usize>,
}

impl AttendanceStats {
    pub fn empty() -> Self {
        Self {
            total: 0,
            today: 0,
            this_week: 0,
            this_month: 0,
            pending_review: 0,
            average_check_in: NO_TIME.to_string(),
            average_check_out: NO_TIME.to_string(),
            late_check_ins: 0,
            early_check_outs: 0,
            by_type: BTreeMap::new(),
        }
    }
}

/// Aggregate `records` as seen at `as_of`.
pub fn recompute(
    records: &[AttendanceRecord],
    as_of: NaiveDateTime,
    policy: &StatsPolicy,
) -> AttendanceStats {
    let day = as_of.date();
    let week = day.iso_week();

    let mut stats = AttendanceStats::empty();
    stats.total = records.len();

    let mut check_ins = Vec::new();
    let mut check_outs = Vec::new();

    for r in records {
        let d = r.occurred_at.date();
        if d == day {
            stats.today += 1;
        }
        if d.iso_week() == week {
            stats.this_week += 1;
        }
        if d.year() == day.year() && d.month() == day.month() {
            stats.this_month += 1;
        }
        if r.review_status.is_pending() {
            stats.pending_review += 1;
        }
        *stats.by_type.entry(r.record_type).or_insert(0) += 1;

        let t = r.occurred_at.time();
        match r.record_type {
            RecordType::CheckIn => {
                if t > policy.late_after {
                    stats.late_check_ins += 1;
                }
                check_ins.push(t);
            }
            RecordType::CheckOut => {
                if t < policy.early_before {
                    stats.early_check_outs += 1;
                }
                check_outs.push(t);
            }
            _ => {}
        }
    }

    stats.average_check_in = average_time_of_day(&check_ins);
    stats.average_check_out = average_time_of_day(&check_outs);
    stats
}

/// Mean of times-of-day as `HH:MM`, rounded to the nearest minute.
pub fn average_time_of_day(times: &[NaiveTime]) -> String {
    if times.is_empty() {
        return NO_TIME.to_string();
    }

    let n = times.len() as u64;
    let total: u64 = times
        .iter()
        .map(|t| u64::from(t.hour() * 60 + t.minute()))
        .sum();
    let mean = (total + n / 2) / n;

    format!("{:02}:{:02}", mean / 60, mean % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::coordinate::Coordinate;
    use crate::models::record::ReviewStatus;
    use chrono::NaiveDate;

    fn rec(id: i64, kind: RecordType, date: (i32, u32, u32), hm: (u32, u32)) -> AttendanceRecord {
        AttendanceRecord {
            id,
            user_id: "alice".into(),
            record_type: kind,
            occurred_at: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                .unwrap()
                .and_hms_opt(hm.0, hm.1, 0)
                .unwrap(),
            zone_id: 1,
            coordinate: Coordinate::new(13.7563, 100.5018),
            accuracy: 5.0,
            review_status: ReviewStatus::Pending,
            photo_ref: None,
            notes: None,
            review_note: None,
        }
    }

    fn as_of() -> NaiveDateTime {
        // Wednesday
        NaiveDate::from_ymd_opt(2025, 9, 3)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
    }

    #[test]
    fn empty_input_uses_sentinels() {
        let s = recompute(&[], as_of(), &StatsPolicy::default());
        assert_eq!(s, AttendanceStats::empty());
        assert_eq!(s.average_check_in, NO_TIME);
        assert_eq!(s.average_check_out, NO_TIME);
    }

    #[test]
    fn counts_and_averages() {
        let mut approved = rec(4, RecordType::CheckOut, (2025, 9, 2), (16, 30));
        approved.review_status = ReviewStatus::Approved;

        let records = vec![
            rec(1, RecordType::CheckIn, (2025, 9, 3), (8, 45)),
            rec(2, RecordType::CheckIn, (2025, 9, 2), (9, 15)),
            rec(3, RecordType::CheckOut, (2025, 9, 3), (17, 30)),
            approved,
            rec(5, RecordType::BreakStart, (2025, 8, 29), (12, 0)),
        ];
        let s = recompute(&records, as_of(), &StatsPolicy::default());

        assert_eq!(s.total, 5);
        assert_eq!(s.today, 2);
        // 2025-08-29 is the Friday of the previous ISO week
        assert_eq!(s.this_week, 4);
        assert_eq!(s.this_month, 4);
        assert_eq!(s.pending_review, 4);
        assert_eq!(s.average_check_in, "09:00");
        assert_eq!(s.average_check_out, "17:00");
        assert_eq!(s.late_check_ins, 1);
        assert_eq!(s.early_check_outs, 1);
        assert_eq!(s.by_type.get(&RecordType::BreakStart), Some(&1));
    }

    #[test]
    fn thresholds_are_strict() {
        let records = vec![
            rec(1, RecordType::CheckIn, (2025, 9, 3), (9, 0)),
            rec(2, RecordType::CheckOut, (2025, 9, 3), (17, 0)),
        ];
        let s = recompute(&records, as_of(), &StatsPolicy::default());
        assert_eq!(s.late_check_ins, 0);
        assert_eq!(s.early_check_outs, 0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let records = vec![
            rec(1, RecordType::CheckIn, (2025, 9, 1), (8, 1)),
            rec(2, RecordType::CheckOut, (2025, 9, 1), (16, 59)),
        ];
        let policy = StatsPolicy::default();
        assert_eq!(
            recompute(&records, as_of(), &policy),
            recompute(&records, as_of(), &policy)
        );
    }

    #[test]
    fn average_rounds_to_nearest_minute() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(average_time_of_day(&[t(8, 0), t(8, 1)]), "08:01");
        assert_eq!(average_time_of_day(&[t(8, 0), t(8, 0), t(8, 1)]), "08:00");
    }
}
