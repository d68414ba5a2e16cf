//! Date and time display.
//!
//! Dates print as `Jan 5th`, with the year appended (`Jan 5th 2023`) when it
//! is not the current one. Times are stored as `HH:mm` and print as
//! `h:mm AM`. Text that does not parse is shown unchanged.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S"];

/// Reads the date part of a stored date or date-time.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
}

/// English ordinal suffix for a day of the month.
pub fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// `Jan 5th`, or `Jan 5th 2023` outside the year of `today`.
pub fn format_date(date: NaiveDate, today: NaiveDate) -> String {
    let day = date.day();
    let short = format!("{} {}{}", date.format("%b"), day, ordinal_suffix(day));
    if date.year() == today.year() {
        short
    } else {
        format!("{short} {}", date.year())
    }
}

pub fn format_date_text(value: &str, today: NaiveDate) -> String {
    match parse_date(value) {
        Some(date) => format_date(date, today),
        None => value.to_string(),
    }
}

/// `h:mm AM` for a parsed time.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

pub fn format_time_text(value: &str) -> String {
    if value.trim().is_empty() {
        return String::new();
    }
    match parse_time(value) {
        Some(time) => format_time(time),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn year_shown_only_outside_current_year() {
        let today = day(2024, 6, 1);
        assert_eq!(format_date(day(2024, 1, 5), today), "Jan 5th");
        assert_eq!(format_date(day(2023, 3, 22), today), "Mar 22nd 2023");
        assert_eq!(format_date_text("2024-02-11T09:30:00Z", today), "Feb 11th");
        assert_eq!(format_date_text("soon", today), "soon");
    }

    #[test]
    fn ordinals() {
        let suffixes: Vec<_> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 23, 31]
            .into_iter()
            .map(ordinal_suffix)
            .collect();
        assert_eq!(
            suffixes,
            ["st", "nd", "rd", "th", "th", "th", "th", "st", "nd", "rd", "st"]
        );
    }

    #[test]
    fn times_print_in_twelve_hour_clock() {
        assert_eq!(format_time_text("14:05"), "2:05 PM");
        assert_eq!(format_time_text("00:30"), "12:30 AM");
        assert_eq!(format_time_text("later"), "later");
        assert_eq!(format_time_text(" "), "");
    }
}
