//! Permissive date coercion to the canonical `MM/DD/YYYY` form.
//!
//! Parsing never fails loudly: a value that matches none of the accepted
//! layouts becomes [`ParsedDate::Unparseable`], which renders as an empty
//! string. Month-first layouts are tried before day-first ones, so `1/2/2024`
//! is January 2nd while `13/01/2024` still resolves to January 13th.
//! A bare year (`2024`) or a year and month (`2024-01`, `Jan 2024`) resolves
//! to the first day of that period.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Output layout for every normalized date cell.
pub const CANONICAL_FORMAT: &str = "%m/%d/%Y";

/// Result of coercing one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    Date(NaiveDate),
    Unparseable,
}

impl ParsedDate {
    /// Canonical text, or `""` for unparseable input.
    pub fn render(&self) -> String {
        match self {
            ParsedDate::Date(d) => d.format(CANONICAL_FORMAT).to_string(),
            ParsedDate::Unparseable => String::new(),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ParsedDate::Date(d) => Some(*d),
            ParsedDate::Unparseable => None,
        }
    }
}

const DATETIME_FORMATS: [&str; 12] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

// Four-digit-year layouts; two-digit years are handled separately below.
const DATE_FORMATS: [&str; 17] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%m.%d.%Y",
    "%d.%m.%Y",
    "%Y%m%d",
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

const SHORT_YEAR_FORMATS: [&str; 5] = ["%m/%d/%y", "%d/%m/%y", "%m-%d-%y", "%d-%b-%y", "%y-%m-%d"];

/// Coerce a single cell.
pub fn parse_date(value: &str) -> ParsedDate {
    let value = value.trim();
    if value.is_empty() {
        return ParsedDate::Unparseable;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return ParsedDate::Date(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            if plausible_year(dt.date()) {
                return ParsedDate::Date(dt.date());
            }
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            if plausible_year(d) {
                return ParsedDate::Date(d);
            }
        }
    }

    for fmt in SHORT_YEAR_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return ParsedDate::Date(d);
        }
    }

    match parse_partial(value) {
        Some(d) => ParsedDate::Date(d),
        None => ParsedDate::Unparseable,
    }
}

// Year-month layouts, completed with day 1 before parsing.
const YEAR_MONTH_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%d %B %Y"];

/// A bare year or a year and month resolves to the first day of the period.
fn parse_partial(value: &str) -> Option<NaiveDate> {
    if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
        let year = value.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1).filter(|d| plausible_year(*d));
    }

    YEAR_MONTH_FORMATS.iter().find_map(|fmt| {
        let completed = if fmt.starts_with("%d") {
            format!("1 {}", value)
        } else {
            let sep = if fmt.contains('/') { '/' } else { '-' };
            format!("{}{}01", value, sep)
        };
        NaiveDate::parse_from_str(&completed, fmt)
            .ok()
            .filter(|d| plausible_year(*d))
    })
}

// chrono's %Y accepts "24" as year 24; leave those to the %y layouts.
fn plausible_year(date: NaiveDate) -> bool {
    use chrono::Datelike;
    date.year() >= 1000
}

/// Coerce a cell and render it canonically.
pub fn normalize_date(value: &str) -> String {
    parse_date(value).render()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> ParsedDate {
        ParsedDate::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_us_slash_dates_are_month_first() {
        assert_eq!(parse_date("1/2/2024"), ymd(2024, 1, 2));
        assert_eq!(normalize_date("2/1/2024"), "02/01/2024");
    }

    #[test]
    fn test_day_first_fallback_when_month_out_of_range() {
        assert_eq!(parse_date("13/01/2024"), ymd(2024, 1, 13));
    }

    #[test]
    fn test_iso_and_timestamps() {
        assert_eq!(normalize_date("2024-03-05"), "03/05/2024");
        assert_eq!(normalize_date("2024-03-05 14:22:01"), "03/05/2024");
        assert_eq!(normalize_date("2024-03-05T14:22:01Z"), "03/05/2024");
        assert_eq!(normalize_date("2024/03/05"), "03/05/2024");
    }

    #[test]
    fn test_named_months() {
        assert_eq!(normalize_date("5-Mar-2024"), "03/05/2024");
        assert_eq!(normalize_date("March 5, 2024"), "03/05/2024");
        assert_eq!(normalize_date("5 Mar 2024"), "03/05/2024");
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(normalize_date("1/2/24"), "01/02/2024");
    }

    #[test]
    fn test_partial_dates_use_first_day() {
        assert_eq!(normalize_date("2024"), "01/01/2024");
        assert_eq!(normalize_date("2024-01"), "01/01/2024");
        assert_eq!(normalize_date("2024/07"), "07/01/2024");
        assert_eq!(normalize_date("Jan 2024"), "01/01/2024");
        assert_eq!(normalize_date("March 2023"), "03/01/2023");
        assert_eq!(normalize_date("2024-13"), "");
        assert_eq!(normalize_date("0999"), "");
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert_eq!(normalize_date("  1/2/2024 "), "01/02/2024");
    }

    #[test]
    fn test_unparseable_becomes_empty() {
        assert_eq!(parse_date("not a date"), ParsedDate::Unparseable);
        assert_eq!(normalize_date("not a date"), "");
        assert_eq!(normalize_date("02/30/2024"), "");
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("   "), "");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["1/2/2024", "2024-12-31", "garbage", "", "July 4, 2023"] {
            let once = normalize_date(raw);
            assert_eq!(normalize_date(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn test_as_date() {
        assert!(parse_date("x").as_date().is_none());
        assert_eq!(
            parse_date("01/02/2024").as_date(),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
    }
}
