//! Seasonal and monthly aggregation.

use chrono::Datelike;

use crate::types::{
    BoxStats, CanonicalSeries, Pollutant, PollutantValues, Season, SeasonalAverages, SeasonalMean,
};
use crate::utils::{mean, quantile_sorted, sorted};

/// Three-letter month names, January first.
pub const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub struct SeasonalAggregator;

impl SeasonalAggregator {
    /// Mean reading per season and pollutant.
    ///
    /// Always returns Winter, Spring, Summer, Fall in that order. A season
    /// without readings for a pollutant gets `None`, not zero.
    pub fn seasonal_means(series: &CanonicalSeries) -> SeasonalAverages {
        let seasons = Season::ALL
            .iter()
            .map(|&season| {
                let mut means = PollutantValues::default();
                for pollutant in Pollutant::ALL {
                    let values: Vec<f64> = series
                        .records
                        .iter()
                        .filter(|r| Season::of(r.date) == season)
                        .filter_map(|r| r.value(pollutant))
                        .collect();
                    means.set(pollutant, mean(&values));
                }
                SeasonalMean { season, means }
            })
            .collect();

        SeasonalAverages { seasons }
    }

    /// Readings of one pollutant grouped by calendar month (index 0 = January).
    pub fn values_by_month(series: &CanonicalSeries, pollutant: Pollutant) -> [Vec<f64>; 12] {
        let mut months: [Vec<f64>; 12] = Default::default();
        for record in &series.records {
            if let Some(v) = record.value(pollutant) {
                months[record.date.month0() as usize].push(v);
            }
        }
        months
    }

    /// Box-plot statistics with whiskers at 1.5 IQR. `None` for no values.
    pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
        let sorted = sorted(values.to_vec());
        let q1 = quantile_sorted(&sorted, 0.25)?;
        let median = quantile_sorted(&sorted, 0.5)?;
        let q3 = quantile_sorted(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;

        let inside: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|v| *v >= lo_fence && *v <= hi_fence)
            .collect();
        let lower_whisker = inside.first().copied().unwrap_or(q1);
        let upper_whisker = inside.last().copied().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();

        Some(BoxStats {
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
            count: sorted.len(),
        })
    }
}
