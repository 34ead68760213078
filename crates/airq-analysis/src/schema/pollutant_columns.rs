//! Pollutant column detection and value extraction.

use polars::prelude::*;

use crate::types::Pollutant;
use crate::utils::{is_numeric_dtype, normalize_header_name, parse_reading};

/// Candidate source names per pollutant, most specific first.
pub const POLLUTANT_CANDIDATES: [(Pollutant, &[&str]); 4] = [
    (Pollutant::Pm25, &["pm25tmean2", "pm25", "PM2.5", "pm25_mean"]),
    (Pollutant::Pm10, &["pm10tmean2", "pm10", "PM10"]),
    (Pollutant::O3, &["o3tmean2", "o3", "O3"]),
    (Pollutant::No2, &["no2tmean2", "no2", "NO2"]),
];

/// Candidate list for one pollutant.
pub fn candidates_for(pollutant: Pollutant) -> &'static [&'static str] {
    POLLUTANT_CANDIDATES
        .iter()
        .find(|(p, _)| *p == pollutant)
        .map(|(_, c)| *c)
        .unwrap_or(&[])
}

/// Pick the source column for a pollutant.
///
/// First pass: exact, case-sensitive match, trying candidates in order.
/// Second pass: case-insensitive match, trying candidates in order; the first
/// column in table order wins when several differ only by case.
pub(crate) fn find_pollutant_column<'a>(
    columns: &'a [String],
    candidates: &[&str],
) -> Option<&'a str> {
    let normalized: Vec<String> = columns.iter().map(|c| normalize_header_name(c)).collect();

    for candidate in candidates {
        if let Some(idx) = normalized.iter().position(|n| n == candidate) {
            return Some(columns[idx].as_str());
        }
    }

    let lowered: Vec<String> = normalized.iter().map(|n| n.to_lowercase()).collect();
    for candidate in candidates {
        let candidate = candidate.to_lowercase();
        if let Some(idx) = lowered.iter().position(|n| *n == candidate) {
            return Some(columns[idx].as_str());
        }
    }

    None
}

/// Read a pollutant column as optional readings, one per row.
///
/// Numeric columns are cast to `Float64`; text columns are parsed cell by
/// cell. Missing markers, unparseable text and non-finite numbers are `None`.
pub(crate) fn extract_readings(column: &Column) -> PolarsResult<Vec<Option<f64>>> {
    let series = column.as_materialized_series();
    let dtype = series.dtype().clone();

    if matches!(dtype, DataType::String) {
        return Ok(series
            .str()?
            .into_iter()
            .map(|s| s.and_then(parse_reading))
            .collect());
    }

    let floats = if is_numeric_dtype(&dtype) {
        series.cast(&DataType::Float64)?
    } else {
        series
            .cast(&DataType::String)?
            .cast(&DataType::Float64)?
    };

    Ok(floats
        .f64()?
        .into_iter()
        .map(|v| v.filter(|v| v.is_finite()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_candidate_order_wins_over_table_order() {
        let columns = cols(&["date", "pm25", "pm25tmean2"]);
        let found = find_pollutant_column(&columns, candidates_for(Pollutant::Pm25));
        assert_eq!(found, Some("pm25tmean2"));
    }

    #[test]
    fn test_case_sensitive_pass_first() {
        let columns = cols(&["date", "o3", "O3"]);
        let found = find_pollutant_column(&columns, candidates_for(Pollutant::O3));
        assert_eq!(found, Some("o3"));
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let columns = cols(&["Date", "PM25TMEAN2", "No2TMean2"]);
        assert_eq!(
            find_pollutant_column(&columns, candidates_for(Pollutant::Pm25)),
            Some("PM25TMEAN2")
        );
        assert_eq!(
            find_pollutant_column(&columns, candidates_for(Pollutant::No2)),
            Some("No2TMean2")
        );
    }

    #[test]
    fn test_dotted_label_matches() {
        let columns = cols(&["date", "pm2.5"]);
        assert_eq!(
            find_pollutant_column(&columns, candidates_for(Pollutant::Pm25)),
            Some("pm2.5")
        );
    }

    #[test]
    fn test_no_match() {
        let columns = cols(&["date", "temperature", "pm10_max"]);
        assert_eq!(
            find_pollutant_column(&columns, candidates_for(Pollutant::Pm10)),
            None
        );
    }

    #[test]
    fn test_extract_numeric_readings() {
        let column = Column::new("pm25".into(), [Some(1.5f64), None, Some(f64::NAN)]);
        let values = extract_readings(&column).unwrap();
        assert_eq!(values, vec![Some(1.5), None, None]);
    }

    #[test]
    fn test_extract_integer_readings() {
        let column = Column::new("no2".into(), [Some(20i64), None]);
        let values = extract_readings(&column).unwrap();
        assert_eq!(values, vec![Some(20.0), None]);
    }

    #[test]
    fn test_extract_text_readings() {
        let column = Column::new("pm10".into(), ["12.5", "NA", " 7 ", "n/a", "bad"]);
        let values = extract_readings(&column).unwrap();
        assert_eq!(values, vec![Some(12.5), None, Some(7.0), None, None]);
    }
}
