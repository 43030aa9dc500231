//! Julian day and J2000 time conversions
//!
//! Record times in a Level-2 file are UTC seconds of the acquisition day.
//! They are turned into continuous J2000 seconds by adding the whole-day
//! offset of the acquisition date from the J2000 epoch.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Julian day of the J2000 epoch, 2000-01-01 12:00:00 UTC
pub const J2000_JULIAN_DAY: f64 = 2_451_545.0;

/// Seconds per day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian day of a calendar date and time of day
///
/// Gregorian calendar formula from the Wolfram ScienceWorld Julian date entry.
#[must_use]
pub fn julian_day(year: i32, month: u32, day: u32, hour: f64, minute: f64, second: f64) -> f64 {
    let y = f64::from(year);
    let m = f64::from(month);
    let d = f64::from(day);
    367.0 * y - (7.0 * (y + ((m + 9.0) / 12.0).floor()) / 4.0).floor()
        - (3.0 * (((y + (m - 9.0) / 7.0) / 100.0).floor() + 1.0) / 4.0).floor()
        + (275.0 * m / 9.0).floor()
        + d
        + 1_721_028.5
        + hour / 24.0
        + minute / 1440.0
        + second / SECONDS_PER_DAY
}

/// Julian day at 00:00 UTC of a date
#[must_use]
pub fn julian_day_of_date(date: NaiveDate) -> f64 {
    julian_day(date.year(), date.month(), date.day(), 0.0, 0.0, 0.0)
}

/// J2000 seconds of each record: day offset from the epoch plus seconds of day
#[must_use]
pub fn j2000_seconds(day_julian: f64, seconds_of_day: f64) -> f64 {
    (day_julian - J2000_JULIAN_DAY) * SECONDS_PER_DAY + seconds_of_day
}

fn j2000_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

/// Calendar date and time of a J2000 second count, truncated to whole seconds
///
/// Returns `None` for non-finite input or instants chrono cannot represent.
#[must_use]
pub fn j2000_to_datetime(seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    if whole.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }
    let delta = Duration::try_seconds(whole as i64)?;
    j2000_epoch().checked_add_signed(delta)
}
