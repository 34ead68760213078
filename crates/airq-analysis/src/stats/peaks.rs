//! Top-N readings per pollutant.

use crate::types::{CanonicalSeries, PeakObservation, Pollutant, PollutantPeaks};

pub struct PeakExtractor;

impl PeakExtractor {
    /// The `top_n` largest readings of one pollutant, descending.
    ///
    /// Equal values keep their original row order.
    pub fn top_n(
        series: &CanonicalSeries,
        pollutant: Pollutant,
        top_n: usize,
    ) -> Vec<PeakObservation> {
        let mut observations: Vec<PeakObservation> = series
            .records
            .iter()
            .enumerate()
            .filter_map(|(row, r)| {
                r.value(pollutant).map(|value| PeakObservation {
                    date: r.date,
                    value,
                    row,
                })
            })
            .collect();

        // sort_by is stable
        observations.sort_by(|a, b| b.value.total_cmp(&a.value));
        observations.truncate(top_n);
        observations
    }

    /// Peaks for every pollutant that has at least one reading.
    pub fn extract(series: &CanonicalSeries, top_n: usize) -> Vec<PollutantPeaks> {
        Pollutant::ALL
            .into_iter()
            .filter(|&pollutant| series.has_values(pollutant))
            .map(|pollutant| PollutantPeaks {
                pollutant,
                peaks: Self::top_n(series, pollutant, top_n),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CanonicalRecord;
    use chrono::NaiveDate;

    fn series(values: &[Option<f64>]) -> CanonicalSeries {
        CanonicalSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let mut r = CanonicalRecord::new(
                        NaiveDate::from_ymd_opt(2000, 1, 1 + i as u32).unwrap(),
                    );
                    r.values.set(Pollutant::Pm25, *v);
                    r
                })
                .collect(),
        )
    }

    #[test]
    fn test_top_n_descending() {
        let s = series(&[Some(3.0), Some(9.0), None, Some(1.0), Some(7.0), Some(5.0), Some(8.0)]);
        let peaks = PeakExtractor::top_n(&s, Pollutant::Pm25, 5);
        let values: Vec<f64> = peaks.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![9.0, 8.0, 7.0, 5.0, 3.0]);
        assert_eq!(peaks[0].row, 1);
    }

    #[test]
    fn test_ties_keep_row_order() {
        let s = series(&[Some(4.0), Some(6.0), Some(6.0), Some(2.0), Some(6.0)]);
        let peaks = PeakExtractor::top_n(&s, Pollutant::Pm25, 3);
        let rows: Vec<usize> = peaks.iter().map(|p| p.row).collect();
        assert_eq!(rows, vec![1, 2, 4]);
    }

    #[test]
    fn test_fewer_values_than_n() {
        let s = series(&[Some(1.0), None, Some(2.0)]);
        assert_eq!(PeakExtractor::top_n(&s, Pollutant::Pm25, 5).len(), 2);
    }

    #[test]
    fn test_pollutants_without_values_are_omitted() {
        let s = series(&[Some(1.0), Some(2.0)]);
        let peaks = PeakExtractor::extract(&s, 5);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].pollutant, Pollutant::Pm25);
        assert!(s.has_values(Pollutant::Pm25));
        assert!(!s.has_values(Pollutant::O3));
    }
}
