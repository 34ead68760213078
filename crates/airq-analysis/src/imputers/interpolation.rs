//! Daily resampling with bounded linear interpolation.
//!
//! Only used to prepare series for the trend test and the decomposition;
//! coverage statistics always see the raw readings.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::DailySeries;

pub struct GapFillingResampler;

impl GapFillingResampler {
    /// One value per calendar day from the first to the last observed date.
    ///
    /// Days observed more than once take the mean of their readings. Days
    /// without readings are `None`.
    pub fn resample_daily(observations: &[(NaiveDate, f64)]) -> DailySeries {
        let mut by_day: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for &(date, value) in observations {
            let entry = by_day.entry(date).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }

        let (Some((&start, _)), Some((&end, _))) =
            (by_day.first_key_value(), by_day.last_key_value())
        else {
            return DailySeries::empty();
        };

        let len = (end - start).num_days() as usize + 1;
        let mut values = vec![None; len];
        for (date, (sum, count)) in by_day {
            let idx = (date - start).num_days() as usize;
            values[idx] = Some(sum / count as f64);
        }

        DailySeries {
            start: Some(start),
            values,
        }
    }

    /// Linearly interpolate interior gaps of at most `max_gap` missing days.
    ///
    /// Longer gaps stay entirely undefined.
    pub fn fill_gaps(daily: &DailySeries, max_gap: usize) -> DailySeries {
        let mut values = daily.values.clone();
        let mut filled = 0usize;
        let mut skipped = 0usize;
        let mut prev: Option<usize> = None;

        for i in 0..values.len() {
            let Some(right) = daily.values[i] else {
                continue;
            };
            if let Some(p) = prev
                && let Some(left) = daily.values[p]
            {
                let gap = i - p - 1;
                if gap > 0 && gap <= max_gap {
                    let span = (i - p) as f64;
                    for (k, slot) in values.iter_mut().enumerate().take(i).skip(p + 1) {
                        let t = (k - p) as f64 / span;
                        *slot = Some(left + (right - left) * t);
                    }
                    filled += gap;
                } else if gap > max_gap {
                    skipped += gap;
                }
            }
            prev = Some(i);
        }

        debug!(
            "Interpolated {} missing days, left {} days in long gaps",
            filled, skipped
        );

        DailySeries {
            start: daily.start,
            values,
        }
    }

    /// Resample and interpolate in one step.
    pub fn gap_filled(observations: &[(NaiveDate, f64)], max_gap: usize) -> DailySeries {
        Self::fill_gaps(&Self::resample_daily(observations), max_gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(offset)
    }

    #[test]
    fn test_empty_input() {
        let series = GapFillingResampler::gap_filled(&[], 7);
        assert!(series.is_empty());
        assert_eq!(series.start, None);
    }

    #[test]
    fn test_length_spans_min_to_max() {
        let obs = [(day(10), 1.0), (day(0), 2.0), (day(4), 3.0)];
        let series = GapFillingResampler::resample_daily(&obs);
        assert_eq!(series.len(), 11);
        assert_eq!(series.start, Some(day(0)));
        assert_eq!(series.values[4], Some(3.0));
        assert_eq!(series.values[5], None);
    }

    #[test]
    fn test_duplicate_days_are_averaged() {
        let obs = [(day(0), 2.0), (day(0), 4.0), (day(1), 5.0)];
        let series = GapFillingResampler::resample_daily(&obs);
        assert_eq!(series.values, vec![Some(3.0), Some(5.0)]);
    }

    #[test]
    fn test_short_gap_is_interpolated() {
        // three missing days between 0.0 and 4.0
        let obs = [(day(0), 0.0), (day(4), 4.0)];
        let series = GapFillingResampler::gap_filled(&obs, 7);
        assert_eq!(
            series.values,
            vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0), Some(4.0)]
        );
    }

    #[test]
    fn test_gap_of_exactly_max_is_filled() {
        let obs = [(day(0), 0.0), (day(8), 8.0)];
        let series = GapFillingResampler::gap_filled(&obs, 7);
        assert_eq!(series.missing_count(), 0);
        assert_eq!(series.values[7], Some(7.0));
    }

    #[test]
    fn test_ten_day_gap_stays_undefined() {
        let obs = [(day(0), 1.0), (day(11), 2.0), (day(12), 3.0)];
        let series = GapFillingResampler::gap_filled(&obs, 7);
        assert_eq!(series.len(), 13);
        for i in 1..=10 {
            assert_eq!(series.values[i], None, "day {i} should stay undefined");
        }
        assert_eq!(series.values[11], Some(2.0));
    }

    #[test]
    fn test_zero_max_gap_fills_nothing() {
        let obs = [(day(0), 0.0), (day(2), 2.0)];
        let series = GapFillingResampler::gap_filled(&obs, 0);
        assert_eq!(series.values, vec![Some(0.0), None, Some(2.0)]);
    }
}
