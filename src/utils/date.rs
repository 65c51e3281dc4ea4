use crate::errors::{AppError, AppResult};
use chrono::{Datelike, NaiveDate, NaiveDateTime};

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// First and last day covered by `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
fn period_days(p: &str) -> Option<(NaiveDate, NaiveDate)> {
    if let Some(d) = parse_date(p) {
        return Some((d, d));
    }

    if let Ok(first) = NaiveDate::parse_from_str(&format!("{p}-01"), "%Y-%m-%d") {
        let next = if first.month() == 12 {
            NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
        };
        return Some((first, next.pred_opt()?));
    }

    if p.len() == 4
        && let Ok(year) = p.parse::<i32>()
    {
        return Some((
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year, 12, 31)?,
        ));
    }

    None
}

/// Half-open `[start, end)` bounds for a period filter. A range is written
/// `FROM:TO` with each side in any of the single-period forms.
pub fn parse_period(p: &str) -> AppResult<(NaiveDateTime, NaiveDateTime)> {
    let invalid = || AppError::InvalidDate(format!("Invalid period: {p}"));

    let (first, last) = match p.split_once(':') {
        Some((a, b)) => {
            let (start, _) = period_days(a.trim()).ok_or_else(invalid)?;
            let (_, end) = period_days(b.trim()).ok_or_else(invalid)?;
            (start, end)
        }
        None => period_days(p.trim()).ok_or_else(invalid)?,
    };

    if first > last {
        return Err(invalid());
    }

    let end = last.succ_opt().ok_or_else(invalid)?;
    Ok((first.and_time(chrono::NaiveTime::MIN), end.and_time(chrono::NaiveTime::MIN)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn single_periods() {
        assert_eq!(parse_period("2025-09-02").unwrap(), (d(2025, 9, 2), d(2025, 9, 3)));
        assert_eq!(parse_period("2025-12").unwrap(), (d(2025, 12, 1), d(2026, 1, 1)));
        assert_eq!(parse_period("2024").unwrap(), (d(2024, 1, 1), d(2025, 1, 1)));
    }

    #[test]
    fn ranges_and_errors() {
        assert_eq!(
            parse_period("2025-09-01:2025-09").unwrap(),
            (d(2025, 9, 1), d(2025, 10, 1))
        );
        assert!(parse_period("2025-10:2025-09").is_err());
        assert!(parse_period("yesterday").is_err());
    }
}
