//! UTC calendar keys for daily and weekly rollovers
//!
//! Days are counted from the Unix epoch. Weeks start on Monday and are
//! counted from the week holding 1970-01-01.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};

fn epoch() -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive()
}

/// Calendar date of a day number. Out-of-range days clamp to the epoch.
pub fn date_of(day: i64) -> NaiveDate {
    i32::try_from(day + i64::from(epoch().num_days_from_ce()))
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .unwrap_or_else(epoch)
}

fn day_of(date: NaiveDate) -> i64 {
    (date - epoch()).num_days()
}

/// Day number for a Unix timestamp in milliseconds
pub fn day_index(now_ms: i64) -> i64 {
    DateTime::<Utc>::from_timestamp_millis(now_ms).map_or(0, |t| day_of(t.date_naive()))
}

/// Monday-aligned week number for a day number
pub fn week_index(day: i64) -> i64 {
    let monday = date_of(day).week(Weekday::Mon).first_day();
    let first = epoch().week(Weekday::Mon).first_day();
    (monday - first).num_days() / 7
}

/// Month (1-12) of a day number
pub fn month_of(day: i64) -> u32 {
    date_of(day).month()
}

/// `YYYY-MM-DD` label used as a statistics key
pub fn date_label(day: i64) -> String {
    date_of(day).format("%Y-%m-%d").to_string()
}
