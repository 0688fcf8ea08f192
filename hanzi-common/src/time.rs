//! Timestamp utilities
//!
//! Persisted timestamps are Unix epoch milliseconds (`i64`).

use chrono::{DateTime, Local, NaiveTime, TimeZone, Timelike, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as Unix epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Local midnight at the start of the day containing `at`, in epoch millis
///
/// Used as the "today" boundary for daily statistics. Falls back to the
/// earliest valid local time when midnight does not exist (DST gaps).
pub fn local_midnight_millis(at: DateTime<Local>) -> i64 {
    let midnight = at.date_naive().and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| at.timestamp_millis() - i64::from(at.time().num_seconds_from_midnight()) * 1000)
}

/// Local midnight for the current day, in epoch millis
pub fn today_start_millis() -> i64 {
    local_midnight_millis(Local::now())
}
