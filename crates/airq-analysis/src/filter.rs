//! Temporal filtering by calendar year.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::CanonicalSeries;

/// Inclusive calendar-year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date.year())
    }

    /// Keep records whose year lies in the range, preserving order.
    ///
    /// An empty result is not an error. Applying the filter twice yields the
    /// same series.
    pub fn apply(&self, series: &CanonicalSeries) -> CanonicalSeries {
        let records: Vec<_> = series
            .records
            .iter()
            .filter(|r| self.contains(r.date))
            .copied()
            .collect();

        if records.is_empty() {
            warn!("No records between {} and {}", self.start, self.end);
        } else {
            info!(
                "Kept {} of {} records between {} and {}",
                records.len(),
                series.len(),
                self.start,
                self.end
            );
        }

        CanonicalSeries::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanonicalRecord, Pollutant};

    fn record(y: i32, m: u32, d: u32) -> CanonicalRecord {
        CanonicalRecord::new(NaiveDate::from_ymd_opt(y, m, d).unwrap()).with(Pollutant::Pm25, 1.0)
    }

    #[test]
    fn test_filter_keeps_inclusive_bounds() {
        let series = CanonicalSeries::new(vec![
            record(1999, 12, 31),
            record(2000, 1, 1),
            record(2002, 12, 31),
            record(2003, 1, 1),
        ]);
        let filtered = YearRange::new(2000, 2002).apply(&series);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.records[0].date, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(filtered.records[1].date, NaiveDate::from_ymd_opt(2002, 12, 31).unwrap());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let series = CanonicalSeries::new(vec![
            record(2001, 5, 1),
            record(1998, 5, 1),
            record(2002, 1, 1),
            record(2001, 5, 1),
        ]);
        let range = YearRange::new(2000, 2002);
        let once = range.apply(&series);
        let twice = range.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_empty_result() {
        let series = CanonicalSeries::new(vec![record(1990, 1, 1)]);
        let filtered = YearRange::new(2000, 2002).apply(&series);
        assert!(filtered.is_empty());
    }
}
