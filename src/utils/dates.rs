use chrono::{Datelike, NaiveDate};

use crate::errors::ParseError;

// Two-digit year formats must be tried before their four-digit twins,
// otherwise "20-May-87" parses as the year 87. ISO goes last: chrono's %Y
// also takes two digits, so "15-06-20" would read as the year 15.
const DAY_FIRST_FORMATS: &[&str] = &[
    "%d-%b-%y",
    "%d-%b-%Y",
    "%d %b %y",
    "%d %b %Y",
    "%b %d, %Y",
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
];

/// Date cleaning rules applied to every source table.
#[derive(Debug, Clone, PartialEq)]
pub struct DateParsingConfig {
    /// Years parsed above this value are shifted back one century.
    pub century_cutoff: Option<i32>,
}

impl Default for DateParsingConfig {
    fn default() -> Self {
        Self {
            century_cutoff: Some(2022),
        }
    }
}

impl DateParsingConfig {
    pub fn from_env() -> Result<Self, String> {
        match std::env::var("CENTURY_CUTOFF_YEAR") {
            Err(_) => Ok(Self::default()),
            Ok(raw) if raw.trim().eq_ignore_ascii_case("none") => Ok(Self {
                century_cutoff: None,
            }),
            Ok(raw) => raw
                .trim()
                .parse::<i32>()
                .map(|year| Self {
                    century_cutoff: Some(year),
                })
                .map_err(|_| format!("CENTURY_CUTOFF_YEAR must be a year or 'none', got '{}'", raw)),
        }
    }
}

/// Parse a textual date using the day-first convention, then apply the
/// century correction.
pub fn parse_day_first(raw: &str, config: &DateParsingConfig) -> Result<NaiveDate, ParseError> {
    let trimmed = raw.trim();
    let parsed = DAY_FIRST_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ParseError::Date(raw.to_string()))?;

    Ok(apply_century_cutoff(parsed, config.century_cutoff))
}

fn apply_century_cutoff(date: NaiveDate, cutoff: Option<i32>) -> NaiveDate {
    match cutoff {
        Some(cutoff) if date.year() > cutoff => {
            // Feb 29 does not exist in every shifted year
            date.with_year(date.year() - 100)
                .or_else(|| NaiveDate::from_ymd_opt(date.year() - 100, date.month(), 28))
                .unwrap_or(date)
        }
        _ => date,
    }
}

/// ISO `YYYY-MM-DD`, the only format accepted from API callers.
pub fn parse_iso(raw: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ParseError::Date(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parses_dataset_formats() {
        let config = DateParsingConfig::default();
        assert_eq!(parse_day_first("20-May-87", &config).unwrap(), ymd(1987, 5, 20));
        assert_eq!(parse_day_first("20-May-1987", &config).unwrap(), ymd(1987, 5, 20));
        assert_eq!(parse_day_first("Apr 22, 2020", &config).unwrap(), ymd(2020, 4, 22));
        assert_eq!(parse_day_first("1987-05-20", &config).unwrap(), ymd(1987, 5, 20));
    }

    #[test]
    fn test_numeric_dates_are_day_first() {
        let config = DateParsingConfig::default();
        assert_eq!(parse_day_first("03/04/2010", &config).unwrap(), ymd(2010, 4, 3));
        assert_eq!(parse_day_first("03/04/10", &config).unwrap(), ymd(2010, 4, 3));
    }

    #[test]
    fn test_dashed_two_digit_years_are_not_read_as_iso() {
        let config = DateParsingConfig::default();
        assert_eq!(parse_day_first("15-06-20", &config).unwrap(), ymd(2020, 6, 15));
        assert_eq!(parse_day_first("03-04-10", &config).unwrap(), ymd(2010, 4, 3));
        assert_eq!(parse_day_first("15-06-2020", &config).unwrap(), ymd(2020, 6, 15));
        // real ISO strings still land on the ISO format
        assert_eq!(parse_day_first("2020-06-15", &config).unwrap(), ymd(2020, 6, 15));
        assert_eq!(parse_day_first("1987-05-20", &config).unwrap(), ymd(1987, 5, 20));
    }

    #[test]
    fn test_century_cutoff_shifts_future_years() {
        let config = DateParsingConfig::default();
        // chrono maps '45' to 2045, which the cutoff pulls back to 1945
        assert_eq!(parse_day_first("01-Jan-45", &config).unwrap(), ymd(1945, 1, 1));
        assert_eq!(parse_day_first("01-Jan-20", &config).unwrap(), ymd(2020, 1, 1));

        assert_eq!(apply_century_cutoff(ymd(2087, 5, 20), Some(2022)), ymd(1987, 5, 20));
        assert_eq!(apply_century_cutoff(ymd(2087, 5, 20), None), ymd(2087, 5, 20));
    }

    #[test]
    fn test_century_cutoff_handles_leap_day() {
        assert_eq!(apply_century_cutoff(ymd(2096, 2, 29), Some(2022)), ymd(1996, 2, 29));
        assert_eq!(apply_century_cutoff(ymd(2024, 2, 29), Some(2022)), ymd(1924, 2, 29));
        assert_eq!(apply_century_cutoff(ymd(2000, 2, 29), Some(1999)), ymd(1900, 2, 28));
    }

    #[test]
    fn test_rejects_garbage() {
        let config = DateParsingConfig::default();
        assert_eq!(
            parse_day_first("not a date", &config),
            Err(ParseError::Date("not a date".to_string()))
        );
        assert!(parse_iso("2020/01/01").is_err());
        assert_eq!(parse_iso("2020-01-03").unwrap(), ymd(2020, 1, 3));
    }
}
