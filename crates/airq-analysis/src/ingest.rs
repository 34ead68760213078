//! CSV loading.
//!
//! The whole file is read into a polars [`DataFrame`]. Date inference is
//! attempted first; if polars rejects the file with it enabled, the file is
//! re-read with dates left as strings and, as a last resort, with every
//! column as a string. The schema resolver handles all three shapes.

use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, Result, ResultExt};

/// Cell values read as null in every column.
const NULL_MARKERS: [&str; 5] = ["NA", "N/A", "NaN", "nan", "null"];

fn parse_options(try_parse_dates: bool) -> CsvParseOptions {
    let nulls = NULL_MARKERS.iter().map(|m| PlSmallStr::from(*m)).collect();
    CsvParseOptions::default()
        .with_quote_char(Some(b'"'))
        .with_try_parse_dates(try_parse_dates)
        .with_null_values(Some(NullValues::AllColumns(nulls)))
}

fn read_with(
    path: &Path,
    infer_schema_length: Option<usize>,
    try_parse_dates: bool,
) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .with_parse_options(parse_options(try_parse_dates))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
}

/// Load the input CSV with fallback strategies.
///
/// Returns [`AnalysisError::InputNotFound`] when the path does not exist.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(AnalysisError::InputNotFound(path.to_path_buf()));
    }

    info!("Loading dataset from: {}", path.display());

    // Strategy 1: full-file schema inference with date parsing
    match read_with(path, None, true) {
        Ok(df) => {
            info!("Dataset loaded: {} rows x {} columns", df.height(), df.width());
            return Ok(df);
        }
        Err(e) => debug!("Loading with date inference failed: {}", e),
    }

    // Strategy 2: dates stay as strings
    match read_with(path, None, false) {
        Ok(df) => {
            info!(
                "Dataset loaded without date inference: {} rows x {} columns",
                df.height(),
                df.width()
            );
            return Ok(df);
        }
        Err(e) => debug!("Loading without date inference failed: {}", e),
    }

    // Strategy 3: every column as a string
    warn!("Falling back to reading every column as text");
    read_with(path, Some(0), false)
        .context(format!("Failed to read CSV '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_input_not_found() {
        let result = load_csv(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(AnalysisError::InputNotFound(_))));
    }

    #[test]
    fn test_loads_iso_dates_as_temporal() {
        let file = write_csv("date,pm25tmean2\n2000-01-01,10.5\n2000-01-02,12.0\n");
        let df = load_csv(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        let dtype = df.column("date").unwrap().dtype().clone();
        assert!(crate::utils::is_temporal_dtype(&dtype) || dtype == DataType::String);
    }

    #[test]
    fn test_na_markers_become_null() {
        let file = write_csv("date,pm25\n2000-01-01,NA\n2000-01-02,3.5\n");
        let df = load_csv(file.path()).unwrap();
        let pm25 = df.column("pm25").unwrap();
        assert_eq!(pm25.null_count(), 1);
        assert!(crate::utils::is_numeric_dtype(pm25.dtype()));
    }
}
