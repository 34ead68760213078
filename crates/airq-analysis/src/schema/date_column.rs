//! Date column detection and conversion.

use chrono::NaiveDate;
use polars::prelude::*;

use crate::types::DateSource;
use crate::utils::{is_temporal_dtype, normalize_header_name, parse_date_str};

/// Lower-cased header names accepted as the date column.
pub(crate) const DATE_COLUMN_NAMES: [&str; 4] = ["date", "datetime", "time", "day"];

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Find the date column.
///
/// The first column (in table order) whose name matches [`DATE_COLUMN_NAMES`]
/// wins. Otherwise the first column with a `Date`/`Datetime` dtype is used.
pub(crate) fn detect_date_column(df: &DataFrame) -> Option<(String, DateSource)> {
    let by_name = df.get_columns().iter().find(|c| {
        let name = normalize_header_name(c.name()).to_lowercase();
        DATE_COLUMN_NAMES.contains(&name.as_str())
    });
    if let Some(col) = by_name {
        return Some((col.name().to_string(), DateSource::Name));
    }

    df.get_columns()
        .iter()
        .find(|c| is_temporal_dtype(c.dtype()))
        .map(|c| (c.name().to_string(), DateSource::Dtype))
}

fn date_from_epoch_days(days: i64) -> Option<NaiveDate> {
    let ce_days = i32::try_from(days).ok()?.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?;
    NaiveDate::from_num_days_from_ce_opt(ce_days)
}

fn units_per_day(unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => 86_400_000_000_000,
        TimeUnit::Microseconds => 86_400_000_000,
        TimeUnit::Milliseconds => 86_400_000,
    }
}

/// Convert a column to calendar dates, one entry per row.
///
/// Temporal dtypes convert exactly (time of day is truncated). Anything else
/// is read as text and parsed with the accepted formats; failures are `None`.
pub(crate) fn extract_dates(column: &Column) -> PolarsResult<Vec<Option<NaiveDate>>> {
    let series = column.as_materialized_series();
    match series.dtype() {
        DataType::Date => {
            let days = series.cast(&DataType::Int32)?;
            Ok(days
                .i32()?
                .into_iter()
                .map(|d| d.and_then(|d| date_from_epoch_days(d as i64)))
                .collect())
        }
        DataType::Datetime(unit, _) => {
            let per_day = units_per_day(*unit);
            let ticks = series.cast(&DataType::Int64)?;
            Ok(ticks
                .i64()?
                .into_iter()
                .map(|t| t.and_then(|t| date_from_epoch_days(t.div_euclid(per_day))))
                .collect())
        }
        _ => {
            let text = series.cast(&DataType::String)?;
            Ok(text
                .str()?
                .into_iter()
                .map(|s| s.and_then(parse_date_str))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_detect_by_name_first_in_table_order() {
        let df = df![
            "station" => ["a", "b"],
            "Day" => ["2000-01-01", "2000-01-02"],
            "date" => ["2000-01-01", "2000-01-02"],
        ]
        .unwrap();
        let (name, source) = detect_date_column(&df).unwrap();
        assert_eq!(name, "Day");
        assert_eq!(source, DateSource::Name);
    }

    #[test]
    fn test_detect_by_name_is_case_insensitive() {
        let df = df!["DATETIME" => ["2000-01-01"], "pm25" => [1.0]].unwrap();
        assert_eq!(detect_date_column(&df).unwrap().0, "DATETIME");
    }

    #[test]
    fn test_detect_by_dtype_fallback() {
        let observed = Series::new("observed".into(), [10_957i32, 10_958])
            .cast(&DataType::Date)
            .unwrap();
        let df = DataFrame::new(vec![
            Column::new("station".into(), ["a", "b"]),
            observed.into(),
        ])
        .unwrap();
        let (name, source) = detect_date_column(&df).unwrap();
        assert_eq!(name, "observed");
        assert_eq!(source, DateSource::Dtype);
    }

    #[test]
    fn test_no_date_column() {
        let df = df!["station" => ["a"], "pm25" => [1.0]].unwrap();
        assert!(detect_date_column(&df).is_none());
    }

    #[test]
    fn test_extract_dates_from_date_dtype() {
        // 10957 days after the epoch is 2000-01-01
        let series = Series::new("date".into(), [Some(10_957i32), None])
            .cast(&DataType::Date)
            .unwrap();
        let dates = extract_dates(&series.into()).unwrap();
        assert_eq!(dates, vec![Some(date(2000, 1, 1)), None]);
    }

    #[test]
    fn test_extract_dates_from_datetime_truncates_time() {
        // 2000-01-01T18:00:00 in milliseconds
        let ms = 946_684_800_000i64 + 18 * 3_600_000;
        let series = Series::new("date".into(), [ms])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let dates = extract_dates(&series.into()).unwrap();
        assert_eq!(dates, vec![Some(date(2000, 1, 1))]);
    }

    #[test]
    fn test_extract_dates_from_strings_drops_garbage() {
        let column = Column::new("date".into(), ["2001-06-15", "garbage", "06/16/2001"]);
        let dates = extract_dates(&column).unwrap();
        assert_eq!(
            dates,
            vec![Some(date(2001, 6, 15)), None, Some(date(2001, 6, 16))]
        );
    }

    #[test]
    fn test_extract_dates_from_integers() {
        let column = Column::new("day".into(), [20010304i64]);
        let dates = extract_dates(&column).unwrap();
        assert_eq!(dates, vec![Some(date(2001, 3, 4))]);
    }
}
