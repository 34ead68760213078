//! Descriptive statistics over the canonical series.
//!
//! - Availability: non-missing counts and coverage
//! - Peaks: top-N readings per pollutant
//! - Seasonal: per-season means, monthly grouping and box-plot summaries

mod availability;
mod peaks;
mod seasonal;

pub use availability::AvailabilityReporter;
pub use peaks::PeakExtractor;
pub use seasonal::{MONTH_ABBR, SeasonalAggregator};
