//! Error types for the air-quality analysis pipeline.
//!
//! Only two input problems are fatal: a missing input file and a table
//! without any usable date column. Everything else that can go wrong with the
//! data (absent pollutants, empty seasons, short series) is carried as an
//! explicit value in [`crate::types`] rather than as an error.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The input file does not exist.
    #[error("Input CSV not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// No column could be identified as the date column.
    #[error(
        "No date column found in the input CSV (columns: {}). Please include a date column named 'date' or similar.",
        columns.join(", ")
    )]
    NoDateColumn { columns: Vec<String> },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A chart could not be drawn or written.
    #[error("Failed to render chart '{chart}': {reason}")]
    ChartRenderingFailed { chart: String, reason: String },

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code, used in the JSON summary and exit handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InputNotFound(_) => "INPUT_NOT_FOUND",
            Self::NoDateColumn { .. } => "NO_DATE_COLUMN",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ChartRenderingFailed { .. } => "CHART_RENDERING_FAILED",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// True for the unrecoverable input problems (missing file, no date column).
    pub fn is_fatal_input(&self) -> bool {
        match self {
            Self::InputNotFound(_) | Self::NoDateColumn { .. } => true,
            Self::WithContext { source, .. } => source.is_fatal_input(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for AnalysisError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        AnalysisError::InvalidConfig(err.to_string())
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Io(e).with_context(context))
    }
}
