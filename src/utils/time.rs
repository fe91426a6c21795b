use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// This is the standard way of converting a date to a string in commutelog.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Calendar day of `moment` as seen from `tz`.
pub fn local_date<Tz: TimeZone>(moment: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    moment.with_timezone(tz).date_naive()
}

/// Minutes between two moments. Negative when `to` is before `from`.
pub fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.
}
