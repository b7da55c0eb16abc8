//! Calendar helpers shared by the fetcher, the aggregator and the merge step.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer};
use std::cmp::Ordering;

/// Builds a date from components known to be valid.
pub(crate) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Parses the leading `YYYY-MM-DD` of a date or datetime string, dropping any
/// time-of-day suffix such as `T00:00:00`.
pub fn parse_date_prefix(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}

/// First day of the calendar month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Orders known dates chronologically, ahead of missing ones.
pub(crate) fn cmp_missing_last(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Serde helper: a missing, empty or unparseable date becomes `None`.
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date_prefix))
}

/// Serde helper: a required date, with any time-of-day discarded.
pub(crate) fn date_prefix<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date_prefix(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_prefix_drops_time() {
        assert_eq!(
            parse_date_prefix("2010-03-04T00:00:00"),
            Some(ymd(2010, 3, 4))
        );
        assert_eq!(parse_date_prefix("2010-03-04"), Some(ymd(2010, 3, 4)));
        assert_eq!(parse_date_prefix(""), None);
        assert_eq!(parse_date_prefix("not a date"), None);
    }

    #[test]
    fn test_wednesday_buckets_to_monday() {
        // 2024-01-10 is a Wednesday
        assert_eq!(week_start(ymd(2024, 1, 10)), ymd(2024, 1, 8));
    }

    #[test]
    fn test_monday_buckets_to_itself() {
        assert_eq!(week_start(ymd(2024, 1, 8)), ymd(2024, 1, 8));
    }

    #[test]
    fn test_sunday_buckets_to_previous_monday() {
        assert_eq!(week_start(ymd(2024, 1, 14)), ymd(2024, 1, 8));
    }

    #[test]
    fn test_week_start_crosses_year_boundary() {
        // 2025-01-01 is a Wednesday
        assert_eq!(week_start(ymd(2025, 1, 1)), ymd(2024, 12, 30));
    }

    #[test]
    fn test_missing_dates_sort_last() {
        let mut dates = vec![None, Some(ymd(2020, 1, 2)), Some(ymd(2020, 1, 1))];
        dates.sort_by(|a, b| cmp_missing_last(*a, *b));
        assert_eq!(dates, vec![Some(ymd(2020, 1, 1)), Some(ymd(2020, 1, 2)), None]);
    }

    #[test]
    fn test_month_start() {
        assert_eq!(month_start(ymd(2024, 2, 29)), ymd(2024, 2, 1));
        assert_eq!(month_start(ymd(2024, 2, 1)), ymd(2024, 2, 1));
    }
}
