use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone};

/// Parse the daily refresh time as either `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
}

/// Next moment, strictly after `now`, when the wall clock shows `at`.
///
/// Days where `at` does not exist because of a DST transition are skipped,
/// ambiguous times resolve to the earliest one.
#[must_use]
pub fn next_refresh_at<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    now.date_naive()
        .iter_days()
        .take(3)
        .filter_map(|date| date.and_time(at).and_local_timezone(now.timezone()).earliest())
        .find(|candidate| candidate > now)
        .unwrap_or_else(|| now.clone() + TimeDelta::days(1))
}
