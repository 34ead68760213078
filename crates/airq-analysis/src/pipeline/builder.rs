//! Main analysis pipeline.
//!
//! Wires the stages together: load, resolve, filter, describe, chart,
//! trend-test and report.

use crate::charts::{ChartInputs, ChartRenderer};
use crate::config::{AnalysisConfig, ConfigValidationError};
use crate::error::Result;
use crate::filter::YearRange;
use crate::ingest;
use crate::pipeline::progress::{
    AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::reporting::{CANONICAL_CSV_FILE, REPORT_FILE, ReportGenerator, SUMMARY_FILE};
use crate::schema::SchemaResolver;
use crate::stats::{AvailabilityReporter, PeakExtractor, SeasonalAggregator};
use crate::trend::{SeasonalDecomposer, pollutant_trend};
use crate::types::{AnalysisResult, DailySeries, Pollutant, PollutantTrend};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// The air-quality analysis pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use airq_analysis::{AnalysisConfig, Pipeline};
///
/// let config = AnalysisConfig::builder()
///     .input_path("chicago_air_pollution.csv")
///     .year_range(2000, 2002)
///     .build()?;
///
/// let result = Pipeline::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
///
/// println!("PM2.5 tau: {:?}", result.headline_trend().tau());
/// ```
pub struct Pipeline {
    config: AnalysisConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    reporter: ReportGenerator,
    charts: ChartRenderer,
}

// Pipelines are handed to worker threads by embedding applications
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load the configured input file and analyze it.
    pub fn run(&self) -> Result<AnalysisResult> {
        self.finish(self.run_internal())
    }

    /// Analyze a table that is already in memory.
    ///
    /// Outputs are written exactly as in [`Pipeline::run`].
    pub fn process(&self, df: DataFrame) -> Result<AnalysisResult> {
        self.finish(self.process_internal(df, Instant::now()))
    }

    fn finish(&self, outcome: Result<AnalysisResult>) -> Result<AnalysisResult> {
        match outcome {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Analysis completed in {} ms",
                    result.duration_ms
                )));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self) -> Result<AnalysisResult> {
        let start_time = Instant::now();

        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Loading,
            0.0,
            format!("Loading {}...", self.config.input_path.display()),
        ));
        info!("Step 1: Loading {}", self.config.input_path.display());
        let df = ingest::load_csv(&self.config.input_path)?;
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Loading,
            1.0,
            format!("Loaded {} rows x {} columns", df.height(), df.width()),
        ));

        self.process_internal(df, start_time)
    }

    fn process_internal(&self, df: DataFrame, start_time: Instant) -> Result<AnalysisResult> {
        // Step 2: map columns onto the canonical schema
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::SchemaResolution,
            0.0,
            "Detecting date and pollutant columns...",
        ));
        info!("Step 2: Resolving schema...");
        let resolved = SchemaResolver::resolve(&df)?;
        drop(df);
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::SchemaResolution,
            1.0,
            format!("Mapped {}", resolved.mapping),
        ));

        // Step 3: year range
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Filtering,
            0.0,
            format!("Filtering to {}...", self.config.period_label()),
        ));
        info!("Step 3: Filtering to {}", self.config.period_label());
        let range = YearRange::new(self.config.start_year, self.config.end_year);
        let series = range.apply(&resolved.series);

        // Step 4: descriptive statistics
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::DescriptiveStatistics,
            0.0,
            "Computing coverage, peaks and seasonal means...",
        ));
        info!("Step 4: Computing descriptive statistics...");
        let availability = AvailabilityReporter::compute(&series);
        let peaks = PeakExtractor::extract(&series, self.config.top_n_peaks);
        let seasonal = SeasonalAggregator::seasonal_means(&series);
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::DescriptiveStatistics,
            1.0,
            format!("Described {} records", series.len()),
        ));

        // Step 5: charts
        let mut generated_files = Vec::new();
        if self.config.render_charts {
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::ChartRendering,
                0.0,
                "Rendering charts...",
            ));
            info!("Step 5: Rendering charts...");
            let inputs = ChartInputs {
                series: &series,
                peaks: &peaks,
                seasonal: &seasonal,
            };
            generated_files.extend(self.charts.render_all(&inputs)?);
        } else {
            info!("Step 5: Skipping charts (disabled)");
        }

        // Step 6: gap filling, trend tests, decomposition
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::TrendAnalysis,
            0.0,
            "Gap-filling and testing for trends...",
        ));
        info!("Step 6: Analyzing trends...");
        let mut trends = Vec::with_capacity(Pollutant::ALL.len());
        let mut daily_pm25 = DailySeries::empty();
        for (i, pollutant) in Pollutant::ALL.into_iter().enumerate() {
            let (daily, test) = pollutant_trend(&series, pollutant, self.config.max_gap_days);
            trends.push(PollutantTrend { pollutant, test });
            if pollutant == Pollutant::Pm25 {
                daily_pm25 = daily;
            }
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::TrendAnalysis,
                (i + 1) as f32 / (Pollutant::ALL.len() + 1) as f32,
                format!("Tested {}", pollutant.label()),
            ));
        }
        let decomposition =
            SeasonalDecomposer::decompose_daily(&daily_pm25, self.config.decomposition_period);

        // Step 7: exports and report
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::ReportGeneration,
            0.0,
            "Writing report...",
        ));
        info!("Step 7: Writing outputs to {}", self.config.output_dir.display());
        if self.config.write_canonical_csv {
            self.reporter.write_canonical_csv(&series)?;
            generated_files.push(CANONICAL_CSV_FILE.to_string());
        }
        if self.config.write_summary_json {
            generated_files.push(SUMMARY_FILE.to_string());
        }
        generated_files.push(REPORT_FILE.to_string());

        let mut result = AnalysisResult {
            mapping: resolved.mapping,
            rows_read: resolved.rows_read,
            rows_without_date: resolved.rows_without_date,
            series,
            availability,
            peaks,
            seasonal,
            daily_pm25,
            trends,
            decomposition,
            generated_files,
            duration_ms: 0,
        };

        result.duration_ms = start_time.elapsed().as_millis() as u64;
        self.reporter.write_markdown(&result)?;
        if self.config.write_summary_json {
            self.reporter.write_summary_json(&result.summary())?;
        }

        info!(
            "Analysis complete: {} records, {} files in {} ms",
            result.series.len(),
            result.generated_files.len(),
            result.duration_ms
        );
        Ok(result)
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<AnalysisConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the analysis configuration.
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during a run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For anything beyond a simple callback use
    /// [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            reporter: ReportGenerator::new(&config),
            charts: ChartRenderer::new(&config),
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
