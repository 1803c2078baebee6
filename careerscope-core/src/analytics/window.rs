//! Window arithmetic for the dashboard ranges.
//!
//! Ranges are calendar based in the caller's time zone: "30 days ago" keeps
//! the wall-clock time across DST changes, "a year ago" is the same date of
//! the previous year.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, TimeZone, Utc};

use crate::types::TimeRange;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Query window for one range; rows are selected with `created_at >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// Window ending at `now` for the given range.
    pub fn for_range<Tz: TimeZone>(range: TimeRange, now: &DateTime<Tz>) -> Self {
        let start = match range {
            TimeRange::Last30Days => now
                .clone()
                .checked_sub_days(Days::new(30))
                .unwrap_or_else(|| now.clone() - Duration::days(30)),
            TimeRange::Last90Days => now
                .clone()
                .checked_sub_days(Days::new(90))
                .unwrap_or_else(|| now.clone() - Duration::days(90)),
            TimeRange::LastYear => now
                .clone()
                .checked_sub_months(Months::new(12))
                .unwrap_or_else(|| now.clone() - Duration::days(365)),
        };

        Self {
            start: start.with_timezone(&Utc),
            end: now.with_timezone(&Utc),
        }
    }

    /// Length in whole days, rounded up, never below one.
    pub fn days(&self) -> i64 {
        let millis = (self.end - self.start).num_milliseconds();
        let days = (millis + MILLIS_PER_DAY - 1).div_euclid(MILLIS_PER_DAY);
        days.max(1)
    }
}

/// Shift a (year, month) pair by `delta` months.
pub(crate) fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Local midnight on the first day of the month two months before `now`.
///
/// This anchors the 3-month progress chart independently of the selected range.
pub fn monthly_window_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let (year, month) = shift_month(now.year(), now.month(), -2);
    let first = NaiveDate::from_ymd_opt(year, month, 1).and_then(|d| d.and_hms_opt(0, 0, 0));

    match first {
        Some(naive) => match now.timezone().from_local_datetime(&naive).earliest() {
            Some(local) => local.with_timezone(&Utc),
            // Midnight skipped by a DST jump; the UTC reading is close enough
            None => naive.and_utc(),
        },
        None => (now.clone() - Duration::days(62)).with_timezone(&Utc),
    }
}
