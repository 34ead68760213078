//! SVG chart rendering.
//!
//! Charts only format results that were already computed; they make no
//! decisions of their own. Each chart is drawn with plotters' SVG backend,
//! so no native font or image libraries are needed.
//!
//! - `pollutants_timeseries.svg`: 2x2 panels with rolling mean and peaks
//! - `monthly_pm25_distribution.svg`: ridge plot of monthly PM2.5 densities
//! - `monthly_boxplot_pm25.svg`: monthly PM2.5 box plot
//! - `seasonal_analysis.svg`: grouped seasonal averages

mod monthly;
mod seasonal;
mod timeseries;

use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{AnalysisConfig, ChartTheme, parse_hex_color};
use crate::error::{AnalysisError, Result};
use crate::types::{CanonicalSeries, Pollutant, PollutantPeaks, SeasonalAverages};

pub use timeseries::rolling_mean;

pub const TIMESERIES_FILE: &str = "pollutants_timeseries.svg";
pub const MONTHLY_DISTRIBUTION_FILE: &str = "monthly_pm25_distribution.svg";
pub const MONTHLY_BOXPLOT_FILE: &str = "monthly_boxplot_pm25.svg";
pub const SEASONAL_FILE: &str = "seasonal_analysis.svg";

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const FONT: &str = "sans-serif";

/// Resolved colours for one render pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Palette {
    pub background: RGBColor,
    pub text: RGBColor,
    series: [RGBColor; 4],
    dark: [RGBColor; 4],
}

impl Palette {
    fn from_theme(theme: &ChartTheme) -> Self {
        let rgb = |hex: &str| {
            let (r, g, b) = parse_hex_color(hex).unwrap_or((0, 0, 0));
            RGBColor(r, g, b)
        };
        Self {
            background: rgb(&theme.background),
            text: rgb(&theme.text),
            series: Pollutant::ALL.map(|p| rgb(theme.color(p))),
            dark: Pollutant::ALL.map(|p| rgb(theme.dark_color(p))),
        }
    }

    pub fn color(&self, pollutant: Pollutant) -> RGBColor {
        self.series[pollutant.index()]
    }

    pub fn dark(&self, pollutant: Pollutant) -> RGBColor {
        self.dark[pollutant.index()]
    }
}

/// Inputs shared by every chart.
pub struct ChartInputs<'a> {
    pub series: &'a CanonicalSeries,
    pub peaks: &'a [PollutantPeaks],
    pub seasonal: &'a SeasonalAverages,
}

/// Renders the fixed chart set into the output directory.
pub struct ChartRenderer {
    output_dir: PathBuf,
    palette: Palette,
    size: (u32, u32),
    site_name: String,
    period_label: String,
    rolling_window: usize,
    rolling_min_periods: usize,
}

impl ChartRenderer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            palette: Palette::from_theme(&config.chart_theme),
            size: (config.chart_theme.width, config.chart_theme.height),
            site_name: config.site_name.clone(),
            period_label: config.period_label(),
            rolling_window: config.rolling_window_days,
            rolling_min_periods: config.rolling_min_periods,
        }
    }

    fn wrap(chart: &str, result: DrawResult<()>, path: PathBuf) -> Result<PathBuf> {
        match result {
            Ok(()) => {
                info!("Saved: {}", path.display());
                Ok(path)
            }
            Err(e) => Err(AnalysisError::ChartRenderingFailed {
                chart: chart.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }

    /// Multi-panel time series with rolling mean and annotated peaks.
    pub fn render_timeseries(&self, inputs: &ChartInputs<'_>) -> Result<PathBuf> {
        let path = self.path(TIMESERIES_FILE);
        let title = format!("{} Air Quality ({})", self.site_name, self.period_label);
        let drawn = timeseries::draw(
            &path,
            self.size,
            &self.palette,
            &title,
            inputs.series,
            inputs.peaks,
            (self.rolling_window, self.rolling_min_periods),
        );
        Self::wrap("timeseries", drawn, path)
    }

    /// Ridge plot of monthly PM2.5 distributions.
    pub fn render_monthly_distribution(&self, inputs: &ChartInputs<'_>) -> Result<PathBuf> {
        let path = self.path(MONTHLY_DISTRIBUTION_FILE);
        let title = format!("Monthly Distribution of PM2.5 ({})", self.period_label);
        let drawn = monthly::draw_ridge(&path, self.size, &self.palette, &title, inputs.series);
        Self::wrap("monthly distribution", drawn, path)
    }

    /// Box plot of PM2.5 by month.
    pub fn render_monthly_boxplot(&self, inputs: &ChartInputs<'_>) -> Result<PathBuf> {
        let path = self.path(MONTHLY_BOXPLOT_FILE);
        let title = format!("Monthly PM2.5 Boxplot ({})", self.period_label);
        let size = (self.size.0, self.size.1 / 2);
        let drawn = monthly::draw_boxplot(&path, size, &self.palette, &title, inputs.series);
        Self::wrap("monthly boxplot", drawn, path)
    }

    /// Grouped bars of seasonal averages.
    pub fn render_seasonal(&self, inputs: &ChartInputs<'_>) -> Result<PathBuf> {
        let path = self.path(SEASONAL_FILE);
        let title = format!("Seasonal Averages by Pollutant ({})", self.period_label);
        let drawn = seasonal::draw(&path, self.size, &self.palette, &title, inputs.seasonal);
        Self::wrap("seasonal", drawn, path)
    }

    /// Render every chart. A chart that fails is logged and skipped.
    ///
    /// Returns the file names that were written.
    pub fn render_all(&self, inputs: &ChartInputs<'_>) -> Result<Vec<String>> {
        std::fs::create_dir_all(&self.output_dir)?;

        let attempts = [
            self.render_timeseries(inputs),
            self.render_monthly_distribution(inputs),
            self.render_monthly_boxplot(inputs),
            self.render_seasonal(inputs),
        ];

        let mut written = Vec::new();
        for attempt in attempts {
            match attempt {
                Ok(path) => written.push(file_name(&path)),
                Err(e) => warn!("{}", e),
            }
        }
        Ok(written)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Value range padded by `pad` of its span; a degenerate range is widened to 1.
pub(crate) fn padded_range(values: impl Iterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = max - min;
    if span <= 0.0 {
        return (min - 0.5, max + 0.5);
    }
    (min - span * pad, max + span * pad)
}
