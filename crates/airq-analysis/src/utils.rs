//! Shared utilities for the analysis pipeline.
//!
//! This module contains helpers used across the schema resolver, the
//! statistics modules and the chart renderer.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType carries a calendar date (`Date` or `Datetime`).
///
/// `Time` is excluded: a time-of-day column has no date.
#[inline]
pub fn is_temporal_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Date | DataType::Datetime(_, _))
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Common missing-value markers in air-quality exports.
pub const MISSING_MARKERS: [&str; 9] = [
    "na", "n/a", "nan", "null", "none", "missing", "#n/a", "-", "",
];

/// Check if a string is a missing-value marker.
pub fn is_missing_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    MISSING_MARKERS.iter().any(|&marker| lower == marker)
}

/// Strip surrounding whitespace and a UTF-8 byte-order mark from a header.
///
/// Spreadsheet exports often prefix the first header with a BOM, which would
/// otherwise prevent `date` from matching.
pub fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

/// Parse a reading. Missing markers and non-finite values yield `None`.
pub fn parse_reading(s: &str) -> Option<f64> {
    if is_missing_marker(s) {
        return None;
    }
    let v = s.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Date-only formats tried in order.
pub const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%Y%m%d"];

/// Date-time formats tried in order; the time of day is discarded.
pub const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a date string with the accepted formats.
///
/// Returns `None` instead of guessing when nothing matches.
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

// =============================================================================
// Numeric Utilities
// =============================================================================

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation, `None` for an empty slice.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Quantile of an ascending-sorted slice using linear interpolation between
/// closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Sort a vector of finite floats ascending.
pub fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_is_temporal_dtype() {
        assert!(is_temporal_dtype(&DataType::Date));
        assert!(is_temporal_dtype(&DataType::Datetime(TimeUnit::Milliseconds, None)));
        assert!(!is_temporal_dtype(&DataType::Time));
        assert!(!is_temporal_dtype(&DataType::String));
    }

    #[test]
    fn test_normalize_header_strips_bom() {
        assert_eq!(normalize_header_name("\u{feff}date"), "date");
        assert_eq!(normalize_header_name("  Date "), "Date");
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date_str("2001-03-04"), Some(date(2001, 3, 4)));
        assert_eq!(parse_date_str("2001/03/04"), Some(date(2001, 3, 4)));
        assert_eq!(parse_date_str("03/04/2001"), Some(date(2001, 3, 4)));
        assert_eq!(parse_date_str("04-03-2001"), Some(date(2001, 3, 4)));
        assert_eq!(parse_date_str("20010304"), Some(date(2001, 3, 4)));
        assert_eq!(parse_date_str("2001-03-04 13:45:00"), Some(date(2001, 3, 4)));
        assert_eq!(parse_date_str("2001-03-04T23:59:59"), Some(date(2001, 3, 4)));
        assert_eq!(parse_date_str("2001-03-04T10:00:00+02:00"), Some(date(2001, 3, 4)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("2001-02-30"), None);
    }

    #[test]
    fn test_parse_reading() {
        assert_eq!(parse_reading(" 12.5 "), Some(12.5));
        assert_eq!(parse_reading("NA"), None);
        assert_eq!(parse_reading("NaN"), None);
        assert_eq!(parse_reading("inf"), None);
        assert_eq!(parse_reading("abc"), None);
    }

    #[test]
    fn test_mean_and_std() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_sorted() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&values, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&values, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&values, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&values, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }
}
