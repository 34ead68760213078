//! Configuration types for the analysis pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! The defaults reproduce the fixed behaviour of the command-line tool: read
//! `chicago_air_pollution.csv`, keep 2000–2002, write everything to the
//! current directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::Pollutant;

/// Default input file name.
pub const DEFAULT_INPUT: &str = "chicago_air_pollution.csv";

/// How much the markdown report contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReportStyle {
    /// Period, coverage, peaks, PM2.5 trend test and methodology notes.
    Basic,
    /// Everything in `Basic` plus the column mapping, seasonal averages,
    /// per-pollutant trend tests and the decomposition summary.
    #[default]
    Detailed,
}

/// Colours and canvas size handed to the chart renderer.
///
/// Colours are `#RRGGBB` strings so the theme can be loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTheme {
    pub background: String,
    pub text: String,
    pub pm25: String,
    pub pm10: String,
    pub o3: String,
    pub no2: String,
    pub dark_pm25: String,
    pub dark_pm10: String,
    pub dark_o3: String,
    pub dark_no2: String,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            background: "#F8F9FA".to_string(),
            text: "#343A40".to_string(),
            pm25: "#E63946".to_string(),
            pm10: "#457B9D".to_string(),
            o3: "#FCA311".to_string(),
            no2: "#588157".to_string(),
            dark_pm25: "#A62633".to_string(),
            dark_pm10: "#315B79".to_string(),
            dark_o3: "#C5820E".to_string(),
            dark_no2: "#406545".to_string(),
            width: 1600,
            height: 1200,
        }
    }
}

impl ChartTheme {
    /// Main line colour for a pollutant.
    pub fn color(&self, pollutant: Pollutant) -> &str {
        match pollutant {
            Pollutant::Pm25 => &self.pm25,
            Pollutant::Pm10 => &self.pm10,
            Pollutant::O3 => &self.o3,
            Pollutant::No2 => &self.no2,
        }
    }

    /// Darker shade used for the rolling-mean overlay.
    pub fn dark_color(&self, pollutant: Pollutant) -> &str {
        match pollutant {
            Pollutant::Pm25 => &self.dark_pm25,
            Pollutant::Pm10 => &self.dark_pm10,
            Pollutant::O3 => &self.dark_o3,
            Pollutant::No2 => &self.dark_no2,
        }
    }

    fn named_colors(&self) -> [(&'static str, &str); 10] {
        [
            ("background", &self.background),
            ("text", &self.text),
            ("pm25", &self.pm25),
            ("pm10", &self.pm10),
            ("o3", &self.o3),
            ("no2", &self.no2),
            ("dark_pm25", &self.dark_pm25),
            ("dark_pm10", &self.dark_pm10),
            ("dark_o3", &self.dark_o3),
            ("dark_no2", &self.dark_no2),
        ]
    }
}

/// Parse a `#RRGGBB` colour string.
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Configuration for the analysis pipeline.
///
/// Use [`AnalysisConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use airq_analysis::config::{AnalysisConfig, ReportStyle};
///
/// let config = AnalysisConfig::builder()
///     .input_path("data/chicago.csv")
///     .year_range(1998, 2000)
///     .report_style(ReportStyle::Basic)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Path to the input CSV.
    /// Default: "chicago_air_pollution.csv"
    pub input_path: PathBuf,

    /// Directory for charts, report and exports.
    /// Default: "."
    pub output_dir: PathBuf,

    /// Site name used in report and chart titles.
    /// Default: "Chicago"
    pub site_name: String,

    /// First calendar year kept (inclusive).
    /// Default: 2000
    pub start_year: i32,

    /// Last calendar year kept (inclusive).
    /// Default: 2002
    pub end_year: i32,

    /// Longest run of missing days that is linearly interpolated.
    /// Default: 7
    pub max_gap_days: usize,

    /// Number of peak days reported per pollutant.
    /// Default: 5
    pub top_n_peaks: usize,

    /// Period (in days) of the seasonal decomposition.
    /// Default: 365
    pub decomposition_period: usize,

    /// p-value threshold used for the trend interpretation.
    /// Default: 0.05
    pub significance_level: f64,

    /// Rolling-mean window drawn over each time series.
    /// Default: 30
    pub rolling_window_days: usize,

    /// Minimum observations inside a rolling window for a value to be drawn.
    /// Default: 10
    pub rolling_min_periods: usize,

    /// Report verbosity.
    /// Default: Detailed
    pub report_style: ReportStyle,

    /// Whether to render the SVG charts.
    /// Default: true
    pub render_charts: bool,

    /// Whether to write `analysis_summary.json`.
    /// Default: true
    pub write_summary_json: bool,

    /// Whether to write the normalized table as `canonical_series.csv`.
    /// Default: true
    pub write_canonical_csv: bool,

    /// Chart colours and size.
    pub chart_theme: ChartTheme,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from("."),
            site_name: "Chicago".to_string(),
            start_year: 2000,
            end_year: 2002,
            max_gap_days: 7,
            top_n_peaks: 5,
            decomposition_period: 365,
            significance_level: 0.05,
            rolling_window_days: 30,
            rolling_min_periods: 10,
            report_style: ReportStyle::default(),
            render_charts: true,
            write_summary_json: true,
            write_canonical_csv: true,
            chart_theme: ChartTheme::default(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.start_year > self.end_year {
            return Err(ConfigValidationError::InvalidYearRange {
                start: self.start_year,
                end: self.end_year,
            });
        }

        if self.top_n_peaks == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.top_n_peaks));
        }

        if self.decomposition_period < 2 {
            return Err(ConfigValidationError::InvalidPeriod(
                self.decomposition_period,
            ));
        }

        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ConfigValidationError::InvalidSignificance(
                self.significance_level,
            ));
        }

        if self.rolling_window_days == 0 || self.rolling_min_periods > self.rolling_window_days {
            return Err(ConfigValidationError::InvalidRollingWindow {
                window: self.rolling_window_days,
                min_periods: self.rolling_min_periods,
            });
        }

        for (field, value) in self.chart_theme.named_colors() {
            if parse_hex_color(value).is_none() {
                return Err(ConfigValidationError::InvalidColor {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }

        if self.chart_theme.width < 200 || self.chart_theme.height < 200 {
            return Err(ConfigValidationError::InvalidChartSize {
                width: self.chart_theme.width,
                height: self.chart_theme.height,
            });
        }

        Ok(())
    }

    /// Human-readable year span used in titles, e.g. `2000–2002`.
    pub fn period_label(&self) -> String {
        if self.start_year == self.end_year {
            self.start_year.to_string()
        } else {
            format!("{}–{}", self.start_year, self.end_year)
        }
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid year range: {start} > {end}")]
    InvalidYearRange { start: i32, end: i32 },

    #[error("Invalid number of peak days: {0} (must be at least 1)")]
    InvalidTopN(usize),

    #[error("Invalid decomposition period: {0} (must be at least 2)")]
    InvalidPeriod(usize),

    #[error("Invalid significance level: {0} (must be strictly between 0 and 1)")]
    InvalidSignificance(f64),

    #[error("Invalid rolling window: window={window}, min_periods={min_periods}")]
    InvalidRollingWindow { window: usize, min_periods: usize },

    #[error("Invalid colour for '{field}': '{value}' (expected #RRGGBB)")]
    InvalidColor { field: String, value: String },

    #[error("Invalid chart size: {width}x{height} (minimum 200x200)")]
    InvalidChartSize { width: u32, height: u32 },
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    input_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    site_name: Option<String>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    max_gap_days: Option<usize>,
    top_n_peaks: Option<usize>,
    decomposition_period: Option<usize>,
    significance_level: Option<f64>,
    rolling_window_days: Option<usize>,
    rolling_min_periods: Option<usize>,
    report_style: Option<ReportStyle>,
    render_charts: Option<bool>,
    write_summary_json: Option<bool>,
    write_canonical_csv: Option<bool>,
    chart_theme: Option<ChartTheme>,
}

impl AnalysisConfigBuilder {
    /// Start from an existing configuration (e.g. one loaded from JSON).
    pub fn from_config(config: AnalysisConfig) -> Self {
        Self {
            input_path: Some(config.input_path),
            output_dir: Some(config.output_dir),
            site_name: Some(config.site_name),
            start_year: Some(config.start_year),
            end_year: Some(config.end_year),
            max_gap_days: Some(config.max_gap_days),
            top_n_peaks: Some(config.top_n_peaks),
            decomposition_period: Some(config.decomposition_period),
            significance_level: Some(config.significance_level),
            rolling_window_days: Some(config.rolling_window_days),
            rolling_min_periods: Some(config.rolling_min_periods),
            report_style: Some(config.report_style),
            render_charts: Some(config.render_charts),
            write_summary_json: Some(config.write_summary_json),
            write_canonical_csv: Some(config.write_canonical_csv),
            chart_theme: Some(config.chart_theme),
        }
    }

    /// Set the input CSV path.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the output directory for charts, report and exports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the site name shown in titles.
    pub fn site_name(mut self, name: impl Into<String>) -> Self {
        self.site_name = Some(name.into());
        self
    }

    /// Set the inclusive calendar-year range.
    pub fn year_range(mut self, start: i32, end: i32) -> Self {
        self.start_year = Some(start);
        self.end_year = Some(end);
        self
    }

    /// Set the first year kept.
    pub fn start_year(mut self, year: i32) -> Self {
        self.start_year = Some(year);
        self
    }

    /// Set the last year kept.
    pub fn end_year(mut self, year: i32) -> Self {
        self.end_year = Some(year);
        self
    }

    /// Set the longest gap (in days) that will be interpolated.
    pub fn max_gap_days(mut self, days: usize) -> Self {
        self.max_gap_days = Some(days);
        self
    }

    /// Set how many peak days are reported per pollutant.
    pub fn top_n_peaks(mut self, n: usize) -> Self {
        self.top_n_peaks = Some(n);
        self
    }

    /// Set the decomposition period in days.
    pub fn decomposition_period(mut self, period: usize) -> Self {
        self.decomposition_period = Some(period);
        self
    }

    /// Set the significance level for the trend interpretation.
    pub fn significance_level(mut self, alpha: f64) -> Self {
        self.significance_level = Some(alpha);
        self
    }

    /// Set the rolling-mean window and its minimum number of observations.
    pub fn rolling_window(mut self, window: usize, min_periods: usize) -> Self {
        self.rolling_window_days = Some(window);
        self.rolling_min_periods = Some(min_periods);
        self
    }

    /// Set the report verbosity.
    pub fn report_style(mut self, style: ReportStyle) -> Self {
        self.report_style = Some(style);
        self
    }

    /// Enable or disable chart rendering.
    pub fn render_charts(mut self, render: bool) -> Self {
        self.render_charts = Some(render);
        self
    }

    /// Enable or disable the JSON summary.
    pub fn write_summary_json(mut self, write: bool) -> Self {
        self.write_summary_json = Some(write);
        self
    }

    /// Enable or disable the normalized CSV export.
    pub fn write_canonical_csv(mut self, write: bool) -> Self {
        self.write_canonical_csv = Some(write);
        self
    }

    /// Set the chart theme.
    pub fn chart_theme(mut self, theme: ChartTheme) -> Self {
        self.chart_theme = Some(theme);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            input_path: self.input_path.unwrap_or(defaults.input_path),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            site_name: self.site_name.unwrap_or(defaults.site_name),
            start_year: self.start_year.unwrap_or(defaults.start_year),
            end_year: self.end_year.unwrap_or(defaults.end_year),
            max_gap_days: self.max_gap_days.unwrap_or(defaults.max_gap_days),
            top_n_peaks: self.top_n_peaks.unwrap_or(defaults.top_n_peaks),
            decomposition_period: self
                .decomposition_period
                .unwrap_or(defaults.decomposition_period),
            significance_level: self
                .significance_level
                .unwrap_or(defaults.significance_level),
            rolling_window_days: self
                .rolling_window_days
                .unwrap_or(defaults.rolling_window_days),
            rolling_min_periods: self
                .rolling_min_periods
                .unwrap_or(defaults.rolling_min_periods),
            report_style: self.report_style.unwrap_or_default(),
            render_charts: self.render_charts.unwrap_or(true),
            write_summary_json: self.write_summary_json.unwrap_or(true),
            write_canonical_csv: self.write_canonical_csv.unwrap_or(true),
            chart_theme: self.chart_theme.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.input_path, PathBuf::from("chicago_air_pollution.csv"));
        assert_eq!(config.start_year, 2000);
        assert_eq!(config.end_year, 2002);
        assert_eq!(config.max_gap_days, 7);
        assert_eq!(config.top_n_peaks, 5);
        assert_eq!(config.decomposition_period, 365);
        assert_eq!(config.report_style, ReportStyle::Detailed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AnalysisConfig::builder()
            .input_path("in.csv")
            .output_dir("out")
            .year_range(1995, 1997)
            .max_gap_days(3)
            .report_style(ReportStyle::Basic)
            .render_charts(false)
            .build()
            .unwrap();

        assert_eq!(config.input_path, PathBuf::from("in.csv"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.start_year, 1995);
        assert_eq!(config.end_year, 1997);
        assert_eq!(config.max_gap_days, 3);
        assert_eq!(config.report_style, ReportStyle::Basic);
        assert!(!config.render_charts);
    }

    #[test]
    fn test_validation_inverted_years() {
        let result = AnalysisConfig::builder().year_range(2003, 2001).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidYearRange { start: 2003, end: 2001 }
        ));
    }

    #[test]
    fn test_validation_bad_color() {
        let theme = ChartTheme {
            pm25: "red".to_string(),
            ..ChartTheme::default()
        };
        let result = AnalysisConfig::builder().chart_theme(theme).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidColor { .. }
        ));
    }

    #[test]
    fn test_validation_rolling_window() {
        let result = AnalysisConfig::builder().rolling_window(5, 10).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidRollingWindow { .. }
        ));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#E63946"), Some((0xE6, 0x39, 0x46)));
        assert_eq!(parse_hex_color("E63946"), None);
        assert_eq!(parse_hex_color("#E6394"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
    }

    #[test]
    fn test_period_label() {
        let config = AnalysisConfig::default();
        assert_eq!(config.period_label(), "2000–2002");
        let single = AnalysisConfig::builder().year_range(2001, 2001).build().unwrap();
        assert_eq!(single.period_label(), "2001");
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "start_year": 1990,
            "end_year": 1992,
            "report_style": "Basic",
            "write_canonical_csv": false
        }"#;

        let config: AnalysisConfig = serde_json::from_str(json).expect("partial JSON should load");
        assert_eq!(config.start_year, 1990);
        assert_eq!(config.end_year, 1992);
        assert_eq!(config.report_style, ReportStyle::Basic);
        assert!(!config.write_canonical_csv);
        assert_eq!(config.max_gap_days, 7);
        assert_eq!(config.chart_theme, ChartTheme::default());
    }
}
