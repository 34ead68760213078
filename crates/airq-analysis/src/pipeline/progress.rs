//! Progress reporting for the analysis pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use airq_analysis::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// Reading the input CSV
    Loading,
    /// Detecting the date and pollutant columns
    SchemaResolution,
    /// Restricting records to the year range
    Filtering,
    /// Coverage, peaks and seasonal means
    DescriptiveStatistics,
    /// Rendering SVG charts
    ChartRendering,
    /// Gap filling, trend tests and decomposition
    TrendAnalysis,
    /// Writing the report and exports
    ReportGeneration,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl AnalysisStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::SchemaResolution => "Resolving Schema",
            Self::Filtering => "Filtering Years",
            Self::DescriptiveStatistics => "Computing Statistics",
            Self::ChartRendering => "Rendering Charts",
            Self::TrendAnalysis => "Analyzing Trends",
            Self::ReportGeneration => "Writing Report",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of total run time this stage usually takes (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.15,
            Self::SchemaResolution => 0.10,
            Self::Filtering => 0.05,
            Self::DescriptiveStatistics => 0.10,
            Self::ChartRendering => 0.30,
            Self::TrendAnalysis => 0.20,
            Self::ReportGeneration => 0.10,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::SchemaResolution => 0.15,
            Self::Filtering => 0.25,
            Self::DescriptiveStatistics => 0.30,
            Self::ChartRendering => 0.40,
            Self::TrendAnalysis => 0.70,
            Self::ReportGeneration => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: AnalysisStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: AnalysisStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: AnalysisStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: AnalysisStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receives progress updates during a run.
///
/// Implementations must be `Send + Sync` so a pipeline can be moved to a
/// worker thread.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}
