//! Schema resolution.
//!
//! Maps an arbitrary input table onto the canonical
//! `{date, pm25, pm10, o3, no2}` schema using column-name heuristics:
//! - the date column by name (`date`, `datetime`, `time`, `day`) or dtype
//! - each pollutant from an ordered candidate list, case-sensitive first
//!
//! Rows whose date cannot be parsed are dropped. Rows are otherwise kept in
//! input order, duplicates included.

mod date_column;
mod pollutant_columns;

pub use pollutant_columns::{POLLUTANT_CANDIDATES, candidates_for};

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, Result, ResultExt};
use crate::types::{CanonicalRecord, CanonicalSeries, ColumnMapping, Pollutant};

/// Output of [`SchemaResolver::resolve`].
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub mapping: ColumnMapping,
    pub series: CanonicalSeries,
    /// Rows in the input table.
    pub rows_read: usize,
    /// Rows dropped because the date could not be parsed.
    pub rows_without_date: usize,
}

/// Resolves input tables onto the canonical schema.
pub struct SchemaResolver;

impl SchemaResolver {
    /// Detect the column mapping without converting any values.
    pub fn detect_mapping(df: &DataFrame) -> Result<ColumnMapping> {
        let (date_column, date_source) =
            date_column::detect_date_column(df).ok_or_else(|| AnalysisError::NoDateColumn {
                columns: df
                    .get_column_names()
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
            })?;

        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .filter(|c| *c != date_column)
            .collect();

        let find = |pollutant: Pollutant| {
            pollutant_columns::find_pollutant_column(&columns, candidates_for(pollutant))
                .map(str::to_string)
        };

        Ok(ColumnMapping {
            date_column,
            date_source,
            pm25: find(Pollutant::Pm25),
            pm10: find(Pollutant::Pm10),
            o3: find(Pollutant::O3),
            no2: find(Pollutant::No2),
        })
    }

    /// Resolve a table into canonical records.
    ///
    /// Fails only with [`AnalysisError::NoDateColumn`] (or a polars error
    /// while converting a column). Missing pollutant columns are not errors.
    pub fn resolve(df: &DataFrame) -> Result<ResolvedSchema> {
        let mapping = Self::detect_mapping(df)?;
        info!("Detected columns: {}", mapping);
        for pollutant in Pollutant::ALL {
            if mapping.column(pollutant).is_none() {
                warn!(
                    "No column found for {} (tried: {})",
                    pollutant.label(),
                    candidates_for(pollutant).join(", ")
                );
            }
        }

        let dates = date_column::extract_dates(df.column(&mapping.date_column)?)
            .context(format!("Parsing date column '{}'", mapping.date_column))?;

        let mut readings: Vec<(Pollutant, Vec<Option<f64>>)> = Vec::new();
        for pollutant in Pollutant::ALL {
            if let Some(name) = mapping.column(pollutant) {
                let values = pollutant_columns::extract_readings(df.column(name)?)
                    .context(format!("Reading {} column '{}'", pollutant.label(), name))?;
                readings.push((pollutant, values));
            }
        }

        let mut records = Vec::with_capacity(dates.len());
        for (row, date) in dates.iter().enumerate() {
            let Some(date) = date else {
                continue;
            };
            let mut record = CanonicalRecord::new(*date);
            for (pollutant, values) in &readings {
                record.values.set(*pollutant, values.get(row).copied().flatten());
            }
            records.push(record);
        }

        let rows_read = df.height();
        let rows_without_date = rows_read - records.len();
        if rows_without_date > 0 {
            warn!(
                "Dropped {} rows with unparseable dates in '{}'",
                rows_without_date, mapping.date_column
            );
        }
        debug!("Resolved {} canonical records", records.len());

        Ok(ResolvedSchema {
            mapping,
            series: CanonicalSeries::new(records),
            rows_read,
            rows_without_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DateSource;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_chicago_style_table() {
        let df = df![
            "city" => ["chic", "chic", "chic"],
            "tmpd" => [31.5, 33.0, 29.0],
            "date" => ["2000-01-01", "bad-date", "2000-01-03"],
            "pm25tmean2" => [Some(12.0), Some(9.0), None],
            "pm10tmean2" => [Some(30.0), None, Some(25.0)],
            "o3tmean2" => [Some(0.02), Some(0.03), Some(0.01)],
            "no2tmean2" => [Some(22.0), Some(19.0), Some(27.0)],
        ]
        .unwrap();

        let resolved = SchemaResolver::resolve(&df).unwrap();
        assert_eq!(resolved.mapping.date_column, "date");
        assert_eq!(resolved.mapping.date_source, DateSource::Name);
        assert_eq!(resolved.mapping.pm25.as_deref(), Some("pm25tmean2"));
        assert_eq!(resolved.rows_read, 3);
        assert_eq!(resolved.rows_without_date, 1);
        assert_eq!(resolved.series.len(), 2);

        let first = resolved.series.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(first.value(Pollutant::Pm25), Some(12.0));
        let second = resolved.series.records[1];
        assert_eq!(second.value(Pollutant::Pm25), None);
        assert_eq!(second.value(Pollutant::Pm10), Some(25.0));
    }

    #[test]
    fn test_missing_pollutants_are_undefined() {
        let df = df![
            "date" => ["2000-01-01", "2000-01-02"],
            "pm25" => [10.0, 11.0],
        ]
        .unwrap();

        let resolved = SchemaResolver::resolve(&df).unwrap();
        assert_eq!(resolved.mapping.pm10, None);
        assert_eq!(resolved.mapping.o3, None);
        assert_eq!(resolved.mapping.no2, None);
        for record in &resolved.series.records {
            assert!(record.value(Pollutant::Pm25).is_some());
            assert_eq!(record.value(Pollutant::Pm10), None);
            assert_eq!(record.value(Pollutant::O3), None);
            assert_eq!(record.value(Pollutant::No2), None);
        }
    }

    #[test]
    fn test_no_date_column_is_fatal() {
        let df = df!["station" => ["a"], "pm25" => [1.0]].unwrap();
        let err = SchemaResolver::resolve(&df).unwrap_err();
        assert!(err.is_fatal_input());
        match err {
            AnalysisError::NoDateColumn { columns } => {
                assert_eq!(columns, vec!["station".to_string(), "pm25".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_dates_pass_through() {
        let df = df![
            "date" => ["2000-01-01", "2000-01-01"],
            "pm25" => [10.0, 20.0],
        ]
        .unwrap();
        let resolved = SchemaResolver::resolve(&df).unwrap();
        assert_eq!(resolved.series.len(), 2);
    }
}
