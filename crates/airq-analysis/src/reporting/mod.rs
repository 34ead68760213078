//! Report generation module.
//!
//! Writes the markdown report plus two optional machine-readable exports:
//! - `analysis_summary.json`, the serialized [`crate::types::AnalysisSummary`]
//! - `canonical_series.csv`, the normalized table
//!
//! # Example
//!
//! ```rust,ignore
//! use airq_analysis::reporting::ReportGenerator;
//!
//! let generator = ReportGenerator::new(&config);
//! println!("{}", generator.render_markdown(&result));
//! generator.write_markdown(&result)?;
//! ```

mod generator;

pub use generator::{
    CANONICAL_CSV_FILE, REPORT_FILE, ReportGenerator, SUMMARY_FILE, canonical_dataframe,
};
