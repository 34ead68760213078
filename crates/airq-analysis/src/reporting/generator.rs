use chrono::Local;
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use crate::config::{AnalysisConfig, ReportStyle};
use crate::error::{AnalysisError, Result, ResultExt};
use crate::trend::MIN_OBSERVATIONS;
use crate::types::{
    AnalysisResult, AnalysisSummary, CanonicalSeries, DecompositionOutcome, Pollutant, Season,
    TrendTest,
};

/// Markdown report file name.
pub const REPORT_FILE: &str = "air_quality_report.md";
/// JSON run summary file name.
pub const SUMMARY_FILE: &str = "analysis_summary.json";
/// Normalized table export file name.
pub const CANONICAL_CSV_FILE: &str = "canonical_series.csv";

/// Writes the markdown report and the machine-readable exports.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
    style: ReportStyle,
    site_name: String,
    period_label: String,
    start_year: i32,
    end_year: i32,
    max_gap_days: usize,
    decomposition_period: usize,
    top_n_peaks: usize,
    significance_level: f64,
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "n/a".to_string(),
    }
}

impl ReportGenerator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            style: config.report_style,
            site_name: config.site_name.clone(),
            period_label: config.period_label(),
            start_year: config.start_year,
            end_year: config.end_year,
            max_gap_days: config.max_gap_days,
            decomposition_period: config.decomposition_period,
            top_n_peaks: config.top_n_peaks,
            significance_level: config.significance_level,
        }
    }

    /// Render the markdown report.
    pub fn render_markdown(&self, result: &AnalysisResult) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "# {} Air Quality Analysis Report ({})\n\n",
            self.site_name, self.period_label
        ));
        md.push_str("## Summary\n");
        md.push_str(&format!(
            "This analysis examines PM2.5, PM10, O3, and NO2 in {} ({}). \
             Charts are saved as SVG files next to this report.\n\n",
            self.site_name, self.period_label
        ));

        self.push_overview(&mut md, result);
        self.push_availability(&mut md, result);
        if self.style == ReportStyle::Detailed {
            self.push_column_mapping(&mut md, result);
        }
        self.push_peaks(&mut md, result);
        if self.style == ReportStyle::Detailed {
            self.push_seasonal(&mut md, result);
        }
        self.push_headline_trend(&mut md, result.headline_trend());
        if self.style == ReportStyle::Detailed {
            self.push_all_trends(&mut md, result);
            self.push_decomposition(&mut md, &result.decomposition);
        }
        self.push_methods(&mut md, &result.decomposition);

        md.push_str("## Files generated\n");
        for file in &result.generated_files {
            md.push_str(&format!("- {}\n", file));
        }
        md.push('\n');

        md.push_str("---\n");
        md.push_str(&format!(
            "*Report generated on {} with airq-analysis*\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        md
    }

    fn push_overview(&self, md: &mut String, result: &AnalysisResult) {
        md.push_str("## Data Overview\n");
        match result.series.date_range() {
            Some((start, end)) => md.push_str(&format!("- Period: {} to {}\n", start, end)),
            None => md.push_str(&format!(
                "- Period: no records between {} and {}\n",
                self.start_year, self.end_year
            )),
        }
        md.push_str(&format!("- Days analyzed: {}\n", result.series.len()));
        if self.style == ReportStyle::Detailed {
            md.push_str(&format!("- Rows read: {}\n", result.rows_read));
            if result.rows_without_date > 0 {
                md.push_str(&format!(
                    "- Rows dropped for unparseable dates: {}\n",
                    result.rows_without_date
                ));
            }
        }
        md.push('\n');
    }

    fn push_availability(&self, md: &mut String, result: &AnalysisResult) {
        md.push_str("## Data availability\n");
        for stat in &result.availability.stats {
            md.push_str(&format!(
                "- {}: {} days ({:.1}% coverage)\n",
                stat.pollutant.key().to_uppercase(),
                stat.count,
                stat.coverage_pct
            ));
        }
        md.push('\n');
    }

    fn push_column_mapping(&self, md: &mut String, result: &AnalysisResult) {
        let mapping = &result.mapping;
        md.push_str("## Column mapping\n");
        md.push_str("| Field | Source column |\n|---|---|\n");
        let how = match mapping.date_source {
            crate::types::DateSource::Name => "by name",
            crate::types::DateSource::Dtype => "by type",
        };
        md.push_str(&format!("| date | `{}` ({}) |\n", mapping.date_column, how));
        for pollutant in Pollutant::ALL {
            match mapping.column(pollutant) {
                Some(col) => md.push_str(&format!("| {} | `{}` |\n", pollutant.key(), col)),
                None => md.push_str(&format!("| {} | not found |\n", pollutant.key())),
            }
        }
        md.push('\n');
    }

    fn push_peaks(&self, md: &mut String, result: &AnalysisResult) {
        md.push_str(&format!(
            "## Peak concentrations (Top {} days by pollutant)\n",
            self.top_n_peaks
        ));
        if result.peaks.is_empty() {
            md.push_str("- No pollutant readings in the analyzed period.\n\n");
            return;
        }
        for entry in &result.peaks {
            md.push_str(&format!("### {}\n", entry.pollutant.key().to_uppercase()));
            for peak in &entry.peaks {
                md.push_str(&format!("- {}: {:.2}\n", peak.date, peak.value));
            }
            md.push('\n');
        }
    }

    fn push_seasonal(&self, md: &mut String, result: &AnalysisResult) {
        md.push_str("## Seasonal averages\n");
        md.push_str("| Season | PM2.5 | PM10 | O3 | NO2 |\n|---|---|---|---|---|\n");
        for season in Season::ALL {
            md.push_str(&format!("| {} |", season));
            for pollutant in Pollutant::ALL {
                let decimals = if pollutant == Pollutant::O3 { 4 } else { 2 };
                md.push_str(&format!(
                    " {} |",
                    fmt_opt(result.seasonal.get(season, pollutant), decimals)
                ));
            }
            md.push('\n');
        }
        md.push('\n');
    }

    fn push_headline_trend(&self, md: &mut String, test: TrendTest) {
        md.push_str("## Trend test (Kendall tau) for PM2.5\n");
        md.push_str(&format!("- Observations: {}\n", test.n()));
        match test {
            TrendTest::InsufficientData { n } => {
                md.push_str(&format!(
                    "- Insufficient data for trend testing: {} observations (at least {} required). No tau is reported.\n\n",
                    n, MIN_OBSERVATIONS
                ));
            }
            TrendTest::Computed {
                tau: Some(tau),
                p_value: Some(p),
                ..
            } => {
                md.push_str(&format!("- Kendall tau: {:.3}\n", tau));
                md.push_str(&format!("- p-value: {:.3}\n", p));
                if p < self.significance_level {
                    md.push_str(&format!(
                        "- Interpretation: statistically significant monotonic trend detected (p < {})\n\n",
                        self.significance_level
                    ));
                } else {
                    md.push_str(&format!(
                        "- Interpretation: no statistically significant monotonic trend detected (p >= {})\n\n",
                        self.significance_level
                    ));
                }
            }
            TrendTest::Computed { .. } => {
                md.push_str("- Kendall tau: undefined (series is constant)\n");
                md.push_str("- p-value: undefined\n");
                md.push_str(
                    "- Interpretation: a constant series has no monotonic trend to test\n\n",
                );
            }
        }
    }

    fn push_all_trends(&self, md: &mut String, result: &AnalysisResult) {
        md.push_str("## Trend tests by pollutant\n");
        md.push_str("| Pollutant | n | tau | p-value | Significant |\n|---|---|---|---|---|\n");
        for trend in &result.trends {
            let test = trend.test;
            let significant = match test {
                TrendTest::InsufficientData { .. } => "insufficient data",
                TrendTest::Computed { tau: None, .. } => "undefined",
                _ if test.is_significant(self.significance_level) => "yes",
                _ => "no",
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                trend.pollutant.label(),
                test.n(),
                fmt_opt(test.tau(), 3),
                fmt_opt(test.p_value(), 3),
                significant
            ));
        }
        md.push('\n');
    }

    fn push_decomposition(&self, md: &mut String, outcome: &DecompositionOutcome) {
        md.push_str("## Seasonal decomposition (PM2.5)\n");
        match outcome {
            DecompositionOutcome::Computed(d) => {
                md.push_str(&format!("- Period: {} days\n", d.period));
                md.push_str(&format!("- Length: {} days\n", d.observed.len()));
                md.push_str(&format!(
                    "- Seasonal amplitude (max - min): {:.2}\n",
                    d.seasonal_amplitude()
                ));
                md.push_str(&format!(
                    "- Trend level: {} at start, {} at end\n",
                    fmt_opt(d.trend_start(), 2),
                    fmt_opt(d.trend_end(), 2)
                ));
                md.push_str(&format!("- Residual std. dev.: {:.2}\n\n", d.residual_std()));
            }
            DecompositionOutcome::Unavailable { reason } => {
                md.push_str(&format!("- Unavailable: {}\n\n", reason));
            }
        }
    }

    fn push_methods(&self, md: &mut String, outcome: &DecompositionOutcome) {
        md.push_str("## Notes & Methods\n");
        md.push_str(&format!(
            "- Missing daily values were interpolated for decomposition and trend testing only \
             (limit={} days); longer gaps were left undefined. \
             Coverage and peaks use the raw readings.\n",
            self.max_gap_days
        ));
        let status = match outcome {
            DecompositionOutcome::Computed(_) => "completed".to_string(),
            DecompositionOutcome::Unavailable { reason } => format!("unavailable: {}", reason),
        };
        md.push_str(&format!(
            "- Seasonal decomposition (additive, period {} days) was attempted for PM2.5 \
             to separate trend, seasonality and residuals ({}).\n\n",
            self.decomposition_period, status
        ));
    }

    fn create_output_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).context(format!(
            "Creating output directory '{}'",
            self.output_dir.display()
        ))
    }

    /// Write the markdown report.
    pub fn write_markdown(&self, result: &AnalysisResult) -> Result<PathBuf> {
        self.create_output_dir()?;
        let path = self.output_dir.join(REPORT_FILE);
        let mut file = File::create(&path).context(format!("Creating {}", path.display()))?;
        file.write_all(self.render_markdown(result).as_bytes())
            .map_err(|e| AnalysisError::ReportGenerationFailed(e.to_string()))?;
        info!("Saved: {}", path.display());
        Ok(path)
    }

    /// Write the JSON run summary.
    pub fn write_summary_json(&self, summary: &AnalysisSummary) -> Result<PathBuf> {
        self.create_output_dir()?;
        let path = self.output_dir.join(SUMMARY_FILE);
        let mut file = File::create(&path).context(format!("Creating {}", path.display()))?;
        file.write_all(serde_json::to_string_pretty(summary)?.as_bytes())?;
        info!("Saved: {}", path.display());
        Ok(path)
    }

    /// Write the canonical table as CSV (`date,pm25,pm10,o3,no2`).
    pub fn write_canonical_csv(&self, series: &CanonicalSeries) -> Result<PathBuf> {
        self.create_output_dir()?;
        let mut df = canonical_dataframe(series)?;
        let path = self.output_dir.join(CANONICAL_CSV_FILE);
        let mut file = File::create(&path).context(format!("Creating {}", path.display()))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut df)
            .context("Writing canonical CSV")?;
        info!("Saved: {}", path.display());
        Ok(path)
    }
}

/// Build a polars DataFrame from the canonical series.
pub fn canonical_dataframe(series: &CanonicalSeries) -> Result<DataFrame> {
    let dates: Vec<String> = series
        .records
        .iter()
        .map(|r| r.date.format("%Y-%m-%d").to_string())
        .collect();
    let mut columns = vec![Column::new("date".into(), dates)];
    for pollutant in Pollutant::ALL {
        let values: Vec<Option<f64>> = series.records.iter().map(|r| r.value(pollutant)).collect();
        columns.push(Column::new(pollutant.key().into(), values));
    }
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AvailabilityReport, AvailabilityStat, CanonicalRecord, ColumnMapping, DailySeries,
        DateSource, PeakObservation, PollutantPeaks, PollutantTrend, SeasonalAverages,
    };
    use crate::stats::SeasonalAggregator;
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2001, m, d).unwrap()
    }

    fn sample_result(trend: TrendTest) -> AnalysisResult {
        let series = CanonicalSeries::new(vec![
            CanonicalRecord::new(date(1, 1)).with(Pollutant::Pm25, 12.5),
            CanonicalRecord::new(date(1, 2)).with(Pollutant::Pm25, 30.0),
        ]);
        let seasonal: SeasonalAverages = SeasonalAggregator::seasonal_means(&series);
        AnalysisResult {
            mapping: ColumnMapping {
                date_column: "date".to_string(),
                date_source: DateSource::Name,
                pm25: Some("pm25tmean2".to_string()),
                pm10: None,
                o3: None,
                no2: None,
            },
            rows_read: 2,
            rows_without_date: 0,
            availability: AvailabilityReport {
                total_records: 2,
                stats: Pollutant::ALL
                    .iter()
                    .map(|&p| AvailabilityStat {
                        pollutant: p,
                        count: if p == Pollutant::Pm25 { 2 } else { 0 },
                        coverage_pct: if p == Pollutant::Pm25 { 100.0 } else { 0.0 },
                    })
                    .collect(),
            },
            peaks: vec![PollutantPeaks {
                pollutant: Pollutant::Pm25,
                peaks: vec![
                    PeakObservation { date: date(1, 2), value: 30.0, row: 1 },
                    PeakObservation { date: date(1, 1), value: 12.5, row: 0 },
                ],
            }],
            seasonal,
            series,
            daily_pm25: DailySeries::empty(),
            trends: vec![PollutantTrend { pollutant: Pollutant::Pm25, test: trend }],
            decomposition: DecompositionOutcome::Unavailable {
                reason: "needs at least 730 observations (two full periods), got 2".to_string(),
            },
            generated_files: vec![REPORT_FILE.to_string()],
            duration_ms: 5,
        }
    }

    fn generator(style: ReportStyle) -> ReportGenerator {
        let config = AnalysisConfig::builder()
            .output_dir("unused")
            .report_style(style)
            .build()
            .unwrap();
        ReportGenerator::new(&config)
    }

    #[test]
    fn test_basic_report_sections() {
        let md = generator(ReportStyle::Basic)
            .render_markdown(&sample_result(TrendTest::InsufficientData { n: 2 }));

        assert!(md.starts_with("# Chicago Air Quality Analysis Report (2000–2002)"));
        assert!(md.contains("- Period: 2001-01-01 to 2001-01-02\n"));
        assert!(md.contains("- Days analyzed: 2\n"));
        assert!(md.contains("- PM25: 2 days (100.0% coverage)\n"));
        assert!(md.contains("- PM10: 0 days (0.0% coverage)\n"));
        assert!(md.contains("### PM25\n- 2001-01-02: 30.00\n- 2001-01-01: 12.50\n"));
        assert!(md.contains("Insufficient data for trend testing: 2 observations"));
        assert!(!md.contains("Kendall tau:"));
        assert!(md.contains("limit=7 days"));
        assert!(md.contains("- air_quality_report.md\n"));
        assert!(!md.contains("## Column mapping"));
    }

    #[test]
    fn test_significant_trend_interpretation() {
        let md = generator(ReportStyle::Basic).render_markdown(&sample_result(TrendTest::Computed {
            tau: Some(0.21),
            p_value: Some(0.001),
            n: 900,
        }));
        assert!(md.contains("- Kendall tau: 0.210\n"));
        assert!(md.contains("- p-value: 0.001\n"));
        assert!(md.contains("statistically significant monotonic trend detected (p < 0.05)"));
    }

    #[test]
    fn test_non_significant_trend_interpretation() {
        let md = generator(ReportStyle::Basic).render_markdown(&sample_result(TrendTest::Computed {
            tau: Some(-0.02),
            p_value: Some(0.4),
            n: 900,
        }));
        assert!(md.contains("no statistically significant monotonic trend detected (p >= 0.05)"));
    }

    #[test]
    fn test_detailed_report_adds_sections() {
        let md = generator(ReportStyle::Detailed)
            .render_markdown(&sample_result(TrendTest::InsufficientData { n: 2 }));
        assert!(md.contains("## Column mapping"));
        assert!(md.contains("| pm25 | `pm25tmean2` |"));
        assert!(md.contains("| pm10 | not found |"));
        assert!(md.contains("## Seasonal averages"));
        assert!(md.contains("| Winter | 21.25 | n/a | n/a | n/a |"));
        assert!(md.contains("## Trend tests by pollutant"));
        assert!(md.contains("| PM2.5 | 2 | n/a | n/a | insufficient data |"));
        assert!(md.contains("- Unavailable: needs at least 730 observations"));
    }

    #[test]
    fn test_canonical_dataframe_shape() {
        let result = sample_result(TrendTest::InsufficientData { n: 2 });
        let df = canonical_dataframe(&result.series).unwrap();
        assert_eq!(df.shape(), (2, 5));
        assert_eq!(df.column("pm10").unwrap().null_count(), 2);
    }

    #[test]
    fn test_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::builder().output_dir(dir.path()).build().unwrap();
        let generator = ReportGenerator::new(&config);
        let result = sample_result(TrendTest::InsufficientData { n: 2 });

        let md = generator.write_markdown(&result).unwrap();
        let json = generator.write_summary_json(&result.summary()).unwrap();
        let csv = generator.write_canonical_csv(&result.series).unwrap();

        assert!(md.exists());
        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(summary["days_analyzed"], 2);
        assert_eq!(summary["decomposition"]["status"], "unavailable");
        let csv_text = fs::read_to_string(csv).unwrap();
        assert!(csv_text.starts_with("date,pm25,pm10,o3,no2\n"));
        assert!(csv_text.contains("2001-01-02,30"));
    }
}
