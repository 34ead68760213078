use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Pollutants and canonical records
// ============================================================================

/// The four pollutants of the canonical schema, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pollutant {
    Pm25,
    Pm10,
    O3,
    No2,
}

impl Pollutant {
    /// All pollutants in canonical order.
    pub const ALL: [Pollutant; 4] = [Self::Pm25, Self::Pm10, Self::O3, Self::No2];

    /// Canonical column name (`pm25`, `pm10`, `o3`, `no2`).
    pub fn key(&self) -> &'static str {
        match self {
            Self::Pm25 => "pm25",
            Self::Pm10 => "pm10",
            Self::O3 => "o3",
            Self::No2 => "no2",
        }
    }

    /// Short display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pm25 => "PM2.5",
            Self::Pm10 => "PM10",
            Self::O3 => "O3",
            Self::No2 => "NO2",
        }
    }

    /// Long name used in chart panel titles.
    pub fn long_name(&self) -> &'static str {
        match self {
            Self::Pm25 => "PM2.5",
            Self::Pm10 => "PM10",
            Self::O3 => "Ozone",
            Self::No2 => "Nitrogen Dioxide",
        }
    }

    /// Measurement unit.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Pm25 | Self::Pm10 => "µg/m³",
            Self::O3 => "ppm",
            Self::No2 => "ppb",
        }
    }

    /// Position in [`Pollutant::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::Pm25 => 0,
            Self::Pm10 => 1,
            Self::O3 => 2,
            Self::No2 => 3,
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One optional value per pollutant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PollutantValues {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub o3: Option<f64>,
    pub no2: Option<f64>,
}

impl PollutantValues {
    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
            Pollutant::O3 => self.o3,
            Pollutant::No2 => self.no2,
        }
    }

    pub fn set(&mut self, pollutant: Pollutant, value: Option<f64>) {
        let slot = match pollutant {
            Pollutant::Pm25 => &mut self.pm25,
            Pollutant::Pm10 => &mut self.pm10,
            Pollutant::O3 => &mut self.o3,
            Pollutant::No2 => &mut self.no2,
        };
        *slot = value;
    }
}

/// A normalized row: a calendar date and up to four readings.
///
/// A missing reading means "not measured that day", never zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: PollutantValues,
}

impl CanonicalRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: PollutantValues::default(),
        }
    }

    /// Builder-style setter, handy in tests.
    pub fn with(mut self, pollutant: Pollutant, value: f64) -> Self {
        self.values.set(pollutant, Some(value));
        self
    }

    pub fn value(&self, pollutant: Pollutant) -> Option<f64> {
        self.values.get(pollutant)
    }
}

/// Canonical records in input row order. Duplicate dates are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSeries {
    pub records: Vec<CanonicalRecord>,
}

impl CanonicalSeries {
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest date, or `None` for an empty series.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    /// Observed `(date, value)` pairs for one pollutant, in row order.
    pub fn observations(&self, pollutant: Pollutant) -> Vec<(NaiveDate, f64)> {
        self.records
            .iter()
            .filter_map(|r| r.value(pollutant).map(|v| (r.date, v)))
            .collect()
    }

    /// True when at least one record carries a value for `pollutant`.
    pub fn has_values(&self, pollutant: Pollutant) -> bool {
        self.records.iter().any(|r| r.value(pollutant).is_some())
    }
}

// ============================================================================
// Schema resolution
// ============================================================================

/// How the date column was identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// Column name matched one of the date-like names.
    Name,
    /// Column had a temporal dtype.
    Dtype,
}

/// Source columns mapped onto the canonical schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date_column: String,
    pub date_source: DateSource,
    pub pm25: Option<String>,
    pub pm10: Option<String>,
    pub o3: Option<String>,
    pub no2: Option<String>,
}

impl ColumnMapping {
    pub fn column(&self, pollutant: Pollutant) -> Option<&str> {
        match pollutant {
            Pollutant::Pm25 => self.pm25.as_deref(),
            Pollutant::Pm10 => self.pm10.as_deref(),
            Pollutant::O3 => self.o3.as_deref(),
            Pollutant::No2 => self.no2.as_deref(),
        }
    }
}

impl fmt::Display for ColumnMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "date <- '{}'", self.date_column)?;
        for pollutant in Pollutant::ALL {
            match self.column(pollutant) {
                Some(col) => write!(f, ", {} <- '{}'", pollutant.key(), col)?,
                None => write!(f, ", {} <- none", pollutant.key())?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// Descriptive statistics
// ============================================================================

/// Non-missing count and coverage for one pollutant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityStat {
    pub pollutant: Pollutant,
    pub count: usize,
    /// Percentage of records with a value, in [0, 100].
    pub coverage_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub total_records: usize,
    /// One entry per pollutant in canonical order.
    pub stats: Vec<AvailabilityStat>,
}

impl AvailabilityReport {
    pub fn get(&self, pollutant: Pollutant) -> Option<&AvailabilityStat> {
        self.stats.iter().find(|s| s.pollutant == pollutant)
    }
}

/// One of the top-N readings of a pollutant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakObservation {
    pub date: NaiveDate,
    pub value: f64,
    /// Row position in the canonical series.
    pub row: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantPeaks {
    pub pollutant: Pollutant,
    pub peaks: Vec<PeakObservation>,
}

/// Meteorological season, assigned by month only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Report order.
    pub const ALL: [Season; 4] = [Self::Winter, Self::Spring, Self::Summer, Self::Fall];

    /// Season of a calendar month (1-12).
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            _ => Self::Fall,
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::from_month(date.month())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Winter => "Winter",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Fall => "Fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalMean {
    pub season: Season,
    pub means: PollutantValues,
}

/// Always exactly four entries: Winter, Spring, Summer, Fall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalAverages {
    pub seasons: Vec<SeasonalMean>,
}

impl SeasonalAverages {
    pub fn get(&self, season: Season, pollutant: Pollutant) -> Option<f64> {
        self.seasons
            .iter()
            .find(|s| s.season == season)
            .and_then(|s| s.means.get(pollutant))
    }
}

/// Five-number summary plus outliers for one box of a box plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest value within 1.5 IQR of Q1.
    pub lower_whisker: f64,
    /// Highest value within 1.5 IQR of Q3.
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
    pub count: usize,
}

// ============================================================================
// Gap-filled series, trend and decomposition
// ============================================================================

/// Dense daily series from the first to the last observed day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    /// First day, `None` when the series is empty.
    pub start: Option<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

impl DailySeries {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        let start = self.start?;
        if index >= self.values.len() {
            return None;
        }
        start.checked_add_signed(Duration::days(index as i64))
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.values.len().checked_sub(1).and_then(|i| self.date_at(i))
    }

    /// Defined values with undefined days dropped, re-indexed contiguously.
    pub fn defined_values(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Outcome of the Kendall rank-correlation trend test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrendTest {
    /// Fewer than the minimum number of observations.
    InsufficientData { n: usize },
    /// `tau` and `p_value` are `None` when either variable is constant.
    Computed {
        tau: Option<f64>,
        p_value: Option<f64>,
        n: usize,
    },
}

impl TrendTest {
    pub fn n(&self) -> usize {
        match self {
            Self::InsufficientData { n } | Self::Computed { n, .. } => *n,
        }
    }

    pub fn tau(&self) -> Option<f64> {
        match self {
            Self::Computed { tau, .. } => *tau,
            Self::InsufficientData { .. } => None,
        }
    }

    pub fn p_value(&self) -> Option<f64> {
        match self {
            Self::Computed { p_value, .. } => *p_value,
            Self::InsufficientData { .. } => None,
        }
    }

    /// True only for a defined p-value strictly below `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value().is_some_and(|p| p < alpha)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollutantTrend {
    pub pollutant: Pollutant,
    pub test: TrendTest,
}

/// Additive split `observed = trend + seasonal + residual`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub period: usize,
    pub observed: Vec<f64>,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
}

impl Decomposition {
    /// Peak-to-trough range of the seasonal component.
    pub fn seasonal_amplitude(&self) -> f64 {
        let max = self.seasonal.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = self.seasonal.iter().copied().fold(f64::INFINITY, f64::min);
        if max.is_finite() && min.is_finite() {
            max - min
        } else {
            0.0
        }
    }

    pub fn trend_start(&self) -> Option<f64> {
        self.trend.first().copied()
    }

    pub fn trend_end(&self) -> Option<f64> {
        self.trend.last().copied()
    }

    /// Population standard deviation of the residual.
    pub fn residual_std(&self) -> f64 {
        crate::utils::std_dev(&self.residual).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecompositionOutcome {
    Computed(Decomposition),
    Unavailable { reason: String },
}

impl DecompositionOutcome {
    pub fn as_computed(&self) -> Option<&Decomposition> {
        match self {
            Self::Computed(d) => Some(d),
            Self::Unavailable { .. } => None,
        }
    }
}

// ============================================================================
// Run results
// ============================================================================

/// Everything computed during one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub mapping: ColumnMapping,
    /// Rows read from the input file.
    pub rows_read: usize,
    /// Rows dropped because their date could not be parsed.
    pub rows_without_date: usize,
    /// Canonical records inside the configured year range.
    pub series: CanonicalSeries,
    pub availability: AvailabilityReport,
    pub peaks: Vec<PollutantPeaks>,
    pub seasonal: SeasonalAverages,
    /// Gap-filled daily PM2.5.
    pub daily_pm25: DailySeries,
    /// Trend test for every pollutant; PM2.5 is the headline.
    pub trends: Vec<PollutantTrend>,
    pub decomposition: DecompositionOutcome,
    /// File names written to the output directory.
    pub generated_files: Vec<String>,
    pub duration_ms: u64,
}

impl AnalysisResult {
    /// The PM2.5 trend test.
    pub fn headline_trend(&self) -> TrendTest {
        self.trend(Pollutant::Pm25)
            .unwrap_or(TrendTest::InsufficientData { n: 0 })
    }

    pub fn trend(&self, pollutant: Pollutant) -> Option<TrendTest> {
        self.trends
            .iter()
            .find(|t| t.pollutant == pollutant)
            .map(|t| t.test)
    }

    pub fn peaks_for(&self, pollutant: Pollutant) -> Option<&PollutantPeaks> {
        self.peaks.iter().find(|p| p.pollutant == pollutant)
    }

    /// Compact summary for the JSON export (no per-day vectors).
    pub fn summary(&self) -> AnalysisSummary {
        let (period_start, period_end) = match self.series.date_range() {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };
        let decomposition = match &self.decomposition {
            DecompositionOutcome::Computed(d) => DecompositionSummary::Computed {
                period: d.period,
                length: d.observed.len(),
                seasonal_amplitude: d.seasonal_amplitude(),
                trend_start: d.trend_start(),
                trend_end: d.trend_end(),
                residual_std: d.residual_std(),
            },
            DecompositionOutcome::Unavailable { reason } => DecompositionSummary::Unavailable {
                reason: reason.clone(),
            },
        };

        AnalysisSummary {
            mapping: self.mapping.clone(),
            rows_read: self.rows_read,
            rows_without_date: self.rows_without_date,
            days_analyzed: self.series.len(),
            period_start,
            period_end,
            availability: self.availability.clone(),
            peaks: self.peaks.clone(),
            seasonal: self.seasonal.clone(),
            trends: self.trends.clone(),
            decomposition,
            generated_files: self.generated_files.clone(),
            duration_ms: self.duration_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecompositionSummary {
    Computed {
        period: usize,
        length: usize,
        seasonal_amplitude: f64,
        trend_start: Option<f64>,
        trend_end: Option<f64>,
        residual_std: f64,
    },
    Unavailable {
        reason: String,
    },
}

/// Serializable run summary written as `analysis_summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub mapping: ColumnMapping,
    pub rows_read: usize,
    pub rows_without_date: usize,
    pub days_analyzed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,
    pub availability: AvailabilityReport,
    pub peaks: Vec<PollutantPeaks>,
    pub seasonal: SeasonalAverages,
    pub trends: Vec<PollutantTrend>,
    pub decomposition: DecompositionSummary,
    pub generated_files: Vec<String>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_season_from_month() {
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(6), Season::Summer);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(9), Season::Fall);
        assert_eq!(Season::from_month(11), Season::Fall);
    }

    #[test]
    fn test_pollutant_values_get_set() {
        let mut values = PollutantValues::default();
        values.set(Pollutant::O3, Some(0.04));
        assert_eq!(values.get(Pollutant::O3), Some(0.04));
        assert_eq!(values.get(Pollutant::Pm25), None);
    }

    #[test]
    fn test_series_date_range() {
        let series = CanonicalSeries::new(vec![
            CanonicalRecord::new(date(2001, 5, 1)),
            CanonicalRecord::new(date(2000, 1, 3)),
            CanonicalRecord::new(date(2002, 2, 7)),
        ]);
        assert_eq!(series.date_range(), Some((date(2000, 1, 3), date(2002, 2, 7))));
        assert_eq!(CanonicalSeries::default().date_range(), None);
    }

    #[test]
    fn test_daily_series_dates() {
        let daily = DailySeries {
            start: Some(date(2000, 2, 28)),
            values: vec![Some(1.0), None, Some(3.0)],
        };
        assert_eq!(daily.date_at(1), Some(date(2000, 2, 29)));
        assert_eq!(daily.end(), Some(date(2000, 3, 1)));
        assert_eq!(daily.date_at(3), None);
        assert_eq!(daily.defined_values(), vec![1.0, 3.0]);
        assert_eq!(daily.missing_count(), 1);
    }

    #[test]
    fn test_trend_test_accessors() {
        let insufficient = TrendTest::InsufficientData { n: 5 };
        assert_eq!(insufficient.n(), 5);
        assert_eq!(insufficient.tau(), None);
        assert!(!insufficient.is_significant(0.05));

        let computed = TrendTest::Computed {
            tau: Some(0.4),
            p_value: Some(0.01),
            n: 30,
        };
        assert!(computed.is_significant(0.05));
        assert!(!computed.is_significant(0.01));
    }

    #[test]
    fn test_mapping_display() {
        let mapping = ColumnMapping {
            date_column: "date".to_string(),
            date_source: DateSource::Name,
            pm25: Some("pm25tmean2".to_string()),
            pm10: None,
            o3: None,
            no2: Some("NO2".to_string()),
        };
        let text = mapping.to_string();
        assert!(text.contains("pm25 <- 'pm25tmean2'"));
        assert!(text.contains("pm10 <- none"));
        assert!(text.contains("no2 <- 'NO2'"));
    }
}
