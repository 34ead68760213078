//! Air-Quality Analysis Library
//!
//! Normalizes daily air-pollution tables and runs a fixed descriptive and
//! trend analysis over them, built with Rust and Polars.
//!
//! # Overview
//!
//! - **Schema Resolution**: finds the date column and the PM2.5, PM10, O3 and
//!   NO2 columns under varying names
//! - **Temporal Filtering**: restricts records to an inclusive year range
//! - **Descriptive Statistics**: coverage, top-N peaks and seasonal means
//! - **Gap Filling**: daily resampling with linear interpolation across
//!   short gaps only
//! - **Trend Analysis**: Kendall's tau against time and an additive annual
//!   decomposition
//! - **Outputs**: SVG charts, a markdown report, a JSON summary and the
//!   normalized table as CSV
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use airq_analysis::{AnalysisConfig, Pipeline};
//!
//! let config = AnalysisConfig::builder()
//!     .input_path("chicago_air_pollution.csv")
//!     .output_dir("out")
//!     .year_range(2000, 2002)
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! match result.headline_trend() {
//!     TrendTest::Computed { tau: Some(tau), p_value: Some(p), .. } => {
//!         println!("PM2.5 tau = {:.3} (p = {:.3})", tau, p)
//!     }
//!     other => println!("PM2.5 trend unavailable: {:?}", other),
//! }
//! ```
//!
//! # Using the stages directly
//!
//! Every stage is a plain function over the canonical series, so the
//! pipeline can be skipped:
//!
//! ```rust,ignore
//! use airq_analysis::{SchemaResolver, YearRange, GapFillingResampler, trend};
//!
//! let resolved = SchemaResolver::resolve(&df)?;
//! let series = YearRange::new(2000, 2002).apply(&resolved.series);
//! let daily = GapFillingResampler::gap_filled(&series.observations(Pollutant::Pm25), 7);
//! let test = trend::trend_test(&daily.defined_values());
//! ```

pub mod charts;
pub mod config;
pub mod error;
pub mod filter;
pub mod imputers;
pub mod ingest;
pub mod pipeline;
pub mod reporting;
pub mod schema;
pub mod stats;
pub mod trend;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use charts::{ChartInputs, ChartRenderer};
pub use config::{
    AnalysisConfig, AnalysisConfigBuilder, ChartTheme, ConfigValidationError, ReportStyle,
};
pub use error::{AnalysisError, Result as AirqResult, ResultExt};
pub use filter::YearRange;
pub use imputers::GapFillingResampler;
pub use ingest::load_csv;
pub use pipeline::{
    AnalysisStage, ClosureProgressReporter, Pipeline, PipelineBuilder, ProgressReporter,
    ProgressUpdate,
};
pub use reporting::ReportGenerator;
pub use schema::{ResolvedSchema, SchemaResolver};
pub use stats::{AvailabilityReporter, PeakExtractor, SeasonalAggregator};
pub use trend::{KendallTau, SeasonalDecomposer, kendall_tau, trend_test};
pub use types::{
    AnalysisResult, AnalysisSummary, AvailabilityReport, CanonicalRecord, CanonicalSeries,
    ColumnMapping, DailySeries, Decomposition, DecompositionOutcome, PeakObservation, Pollutant,
    PollutantPeaks, PollutantTrend, Season, SeasonalAverages, TrendTest,
};
