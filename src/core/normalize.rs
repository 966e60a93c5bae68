// src/core/normalize.rs
// Number and date normalizers shared by the claim mapper.

use std::{fmt, str::FromStr};

use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate};

/// Parse a decimal and drop trailing zeroes: `"12.340"` → `12.34`, `"12.000"` → `12`.
/// Integral values keep their full digits (`"1200"` stays `1200`, not `1.2E+3`).
/// Render with `to_plain_string`; `Display` switches to exponent form for tiny values.
pub fn format_decimal(raw: &str) -> Option<BigDecimal> {
    let raw = raw.trim();
    if raw.is_empty() { return None; }
    let dec = BigDecimal::from_str(raw).ok()?;
    if dec.is_integer() {
        Some(dec.with_scale(0))
    } else {
        Some(dec.normalized())
    }
}

/// Year and month of a ranking list; the day is unspecified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parse a ranking list date in `mm/yyyy` form.
pub fn parse_list_date(raw: &str) -> Option<YearMonth> {
    let raw = raw.trim();
    let (month, year) = raw.split_once('/')?;
    if month.is_empty() || month.len() > 2 || year.len() != 4 { return None; }
    // chrono validates the month range; the day is pinned to the 1st.
    let date = NaiveDate::parse_from_str(&format!("01/{month}/{year}"), "%d/%m/%Y").ok()?;
    Some(YearMonth { year: date.year(), month: date.month() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimals_lose_trailing_zeroes() {
        assert_eq!(format_decimal("12.340").unwrap().to_string(), "12.34");
        assert_eq!(format_decimal("12.000").unwrap().to_string(), "12");
        assert_eq!(format_decimal("1200").unwrap().to_string(), "1200");
        assert_eq!(format_decimal("0.50").unwrap().to_string(), "0.5");
        assert_eq!(format_decimal("0.0000001").unwrap().to_plain_string(), "0.0000001");
    }

    #[test]
    fn decimals_reject_garbage() {
        assert!(format_decimal("abc").is_none());
        assert!(format_decimal("").is_none());
        assert!(format_decimal("  ").is_none());
        assert!(format_decimal("12.3.4").is_none());
    }

    #[test]
    fn list_dates() {
        assert_eq!(parse_list_date("03/2021"), Some(YearMonth { year: 2021, month: 3 }));
        assert_eq!(parse_list_date("6/1993"), Some(YearMonth { year: 1993, month: 6 }));
        assert_eq!(parse_list_date("2021/03"), None);
        assert_eq!(parse_list_date("13/2021"), None);
        assert_eq!(parse_list_date("11-2020"), None);
        assert_eq!(parse_list_date(""), None);
    }

    #[test]
    fn year_month_display() {
        assert_eq!(YearMonth { year: 2020, month: 11 }.to_string(), "2020-11");
    }
}
