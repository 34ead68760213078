//! Per-pollutant data availability.

use crate::types::{AvailabilityReport, AvailabilityStat, CanonicalSeries, Pollutant};

/// Counts non-missing readings and coverage percentages.
pub struct AvailabilityReporter;

impl AvailabilityReporter {
    /// Compute availability for every pollutant in canonical order.
    ///
    /// `coverage_pct = 100 * count / max(1, total_records)`, so an empty
    /// series reports 0% rather than dividing by zero.
    pub fn compute(series: &CanonicalSeries) -> AvailabilityReport {
        let total = series.len();
        let stats = Pollutant::ALL
            .iter()
            .map(|&pollutant| {
                let count = series
                    .records
                    .iter()
                    .filter(|r| r.value(pollutant).is_some())
                    .count();
                AvailabilityStat {
                    pollutant,
                    count,
                    coverage_pct: 100.0 * count as f64 / total.max(1) as f64,
                }
            })
            .collect();

        AvailabilityReport {
            total_records: total,
            stats,
        }
    }
}
