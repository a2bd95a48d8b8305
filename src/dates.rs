//! Calendar date recognition and canonicalization.
//!
//! Recognition is shape-only (used by type inference); parsing resolves the
//! components into a real [`NaiveDate`]. Slash, dash and dot separators are
//! accepted. Year-last values are read month-first and fall back to day-first
//! when the month-first reading is not a valid date.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn year_last_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]{1,2}[/\-.][0-9]{1,2}[/\-.][0-9]{2,4}$").expect("valid year-last date pattern")
    })
}

fn year_first_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]{4}[/\-.][0-9]{1,2}[/\-.][0-9]{1,2}$").expect("valid year-first date pattern")
    })
}

/// True when `value` has the textual shape of a date (`D/M/Y`, `Y/M/D`,
/// `YYYY-MM-DD`). Says nothing about whether the date exists.
pub fn looks_like_date(value: &str) -> bool {
    year_last_pattern().is_match(value) || year_first_pattern().is_match(value)
}

pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_date_components(trimmed).or_else(|| {
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            .map(|dt| dt.date())
    })
}

/// Rewrites a parseable date into `YYYY-MM-DD`.
pub fn canonicalize_date(value: &str) -> Option<String> {
    parse_calendar_date(value).map(|d| d.format(CANONICAL_DATE_FORMAT).to_string())
}

fn parse_date_components(value: &str) -> Option<NaiveDate> {
    let separator = value.chars().find(|c| matches!(c, '/' | '-' | '.'))?;
    let parts = value.split(separator).collect::<Vec<_>>();
    if parts.len() != 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    let numbers = parts
        .iter()
        .map(|p| p.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;

    if parts[0].len() == 4 {
        return NaiveDate::from_ymd_opt(numbers[0] as i32, numbers[1], numbers[2]);
    }
    let year = match parts[2].len() {
        4 => numbers[2] as i32,
        2 => expand_two_digit_year(numbers[2]),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, numbers[0], numbers[1])
        .or_else(|| NaiveDate::from_ymd_opt(year, numbers[1], numbers[0]))
}

fn expand_two_digit_year(year: u32) -> i32 {
    if year < 50 {
        2000 + year as i32
    } else {
        1900 + year as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_supported_shapes() {
        assert!(looks_like_date("2023-01-05"));
        assert!(looks_like_date("2023/1/5"));
        assert!(looks_like_date("05.01.2023"));
        assert!(looks_like_date("5/1/23"));
        assert!(!looks_like_date("2023-01-05T10:00:00"));
        assert!(!looks_like_date("January 5"));
        assert!(!looks_like_date("12345"));
        assert!(!looks_like_date("\u{0662}\u{0660}\u{0662}\u{0664}-01-05"));
    }

    #[test]
    fn parses_month_first_then_day_first() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        assert_eq!(parse_calendar_date("01/05/2023"), Some(expected));
        let day_first = NaiveDate::from_ymd_opt(2023, 1, 25).unwrap();
        assert_eq!(parse_calendar_date("25/01/2023"), Some(day_first));
    }

    #[test]
    fn canonical_form_is_a_fixed_point() {
        assert_eq!(canonicalize_date("2023-1-5").as_deref(), Some("2023-01-05"));
        assert_eq!(
            canonicalize_date("2023-01-05").as_deref(),
            Some("2023-01-05")
        );
    }

    #[test]
    fn two_digit_years_pivot_at_fifty() {
        assert_eq!(canonicalize_date("1/2/24").as_deref(), Some("2024-01-02"));
        assert_eq!(canonicalize_date("1/2/87").as_deref(), Some("1987-01-02"));
    }

    #[test]
    fn datetimes_collapse_to_their_date() {
        assert_eq!(
            canonicalize_date("2024-05-06T14:30:00").as_deref(),
            Some("2024-05-06")
        );
    }

    #[test]
    fn rejects_impossible_dates() {
        assert_eq!(parse_calendar_date("2023-02-30"), None);
        assert_eq!(parse_calendar_date("13/13/2023"), None);
        assert_eq!(parse_calendar_date("n/a"), None);
        assert_eq!(parse_calendar_date(""), None);
    }
}
