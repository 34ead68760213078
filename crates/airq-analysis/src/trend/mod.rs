//! Trend analysis on gap-filled daily series.
//!
//! - Kendall's tau between day index and value (monotonic trend test)
//! - Additive seasonal decomposition with an annual period

mod decomposition;
mod kendall;

pub use decomposition::SeasonalDecomposer;
pub use kendall::{KendallTau, MIN_OBSERVATIONS, kendall_tau, trend_test};

use tracing::info;

use crate::imputers::GapFillingResampler;
use crate::types::{CanonicalSeries, DailySeries, Pollutant, TrendTest};

/// Gap-fill one pollutant and run the trend test on it.
pub fn pollutant_trend(
    series: &CanonicalSeries,
    pollutant: Pollutant,
    max_gap_days: usize,
) -> (DailySeries, TrendTest) {
    let daily = GapFillingResampler::gap_filled(&series.observations(pollutant), max_gap_days);
    let test = trend_test(&daily.defined_values());
    match test {
        TrendTest::Computed {
            tau: Some(tau),
            p_value: Some(p),
            n,
        } => info!("{} trend: tau={:.3}, p={:.3}, n={}", pollutant.label(), tau, p, n),
        TrendTest::Computed { n, .. } => {
            info!("{} trend: undefined (constant series, n={})", pollutant.label(), n)
        }
        TrendTest::InsufficientData { n } => {
            info!("{} trend: insufficient data (n={})", pollutant.label(), n)
        }
    }
    (daily, test)
}
