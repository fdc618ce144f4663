//! Time-window arithmetic for range queries
//!
//! All windows are strict on both ends: an event whose start equals either
//! boundary instant is excluded. Day truncation uses UTC as the reference
//! time zone.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, Utc};

/// An open interval `(start, end)` of instants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The 24 hours following midnight (UTC) of `date`
    pub fn day(date: DateTime<Utc>) -> Self {
        let start = truncate_to_day(date);
        Self {
            start,
            end: add_or_saturate(start, TimeDelta::days(1)),
        }
    }

    /// Seven days following `start`
    pub fn week(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: add_or_saturate(start, TimeDelta::days(7)),
        }
    }

    /// One calendar month following `start`
    ///
    /// Advances the month field, so lengths vary between 28 and 31 days.
    /// Days past the end of a shorter target month roll into the month
    /// after it (Jan 31 ends on Mar 2 in a leap year).
    pub fn month(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: shift_months(start, 1).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Whether `instant` lies strictly inside the window
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start < instant && instant < self.end
    }
}

/// Discard the time of day, keeping midnight UTC
pub fn truncate_to_day(date: DateTime<Utc>) -> DateTime<Utc> {
    date.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Shift `date` by `months` calendar months, keeping the time of day
///
/// The day of month is kept as an offset from the first of the target
/// month, so overflow rolls forward: Feb 29 2024 minus 12 months is
/// Mar 1 2023. Returns `None` outside chrono's representable range.
pub fn shift_months(date: DateTime<Utc>, months: i32) -> Option<DateTime<Utc>> {
    let total = date
        .year()
        .checked_mul(12)?
        .checked_add(date.month0() as i32)?
        .checked_add(months)?;
    let (year, month) = (total.div_euclid(12), total.rem_euclid(12) as u32 + 1);
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let day = first.checked_add_days(Days::new(u64::from(date.day0())))?;
    Some(day.and_time(date.time()).and_utc())
}

fn add_or_saturate(start: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    start
        .checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
