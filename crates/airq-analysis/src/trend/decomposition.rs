//! Additive seasonal decomposition by moving averages.
//!
//! `observed = trend + seasonal + residual`, where the trend is a centred
//! moving average over one period, its undefined edges are extrapolated with
//! least-squares lines, and the seasonal component is the per-phase mean of
//! the detrended series shifted to zero mean.

use tracing::debug;

use crate::types::{DailySeries, Decomposition, DecompositionOutcome};

pub struct SeasonalDecomposer;

impl SeasonalDecomposer {
    /// Decompose a gap-filled daily series.
    ///
    /// Never fails: an unsuitable series yields
    /// [`DecompositionOutcome::Unavailable`] with the reason.
    pub fn decompose_daily(series: &DailySeries, period: usize) -> DecompositionOutcome {
        let missing = series.missing_count();
        if missing > 0 {
            return Self::unavailable(format!(
                "{missing} days remain undefined after interpolation"
            ));
        }
        Self::additive(&series.defined_values(), period)
    }

    /// Additive decomposition of a complete series.
    pub fn additive(values: &[f64], period: usize) -> DecompositionOutcome {
        let n = values.len();
        if period < 2 {
            return Self::unavailable(format!("period must be at least 2, got {period}"));
        }
        if n < 2 * period {
            return Self::unavailable(format!(
                "needs at least {} observations (two full periods), got {n}",
                2 * period
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Self::unavailable("series contains non-finite values".to_string());
        }

        let moving_average = Self::centered_moving_average(values, period);
        let trend = Self::extrapolate_edges(&moving_average, period);
        let detrended: Vec<f64> = values.iter().zip(&trend).map(|(v, t)| v - t).collect();

        let mut phase_means: Vec<f64> = (0..period)
            .map(|phase| {
                let members: Vec<f64> =
                    detrended.iter().skip(phase).step_by(period).copied().collect();
                members.iter().sum::<f64>() / members.len() as f64
            })
            .collect();
        let offset = phase_means.iter().sum::<f64>() / period as f64;
        for m in &mut phase_means {
            *m -= offset;
        }

        let seasonal: Vec<f64> = (0..n).map(|i| phase_means[i % period]).collect();
        let residual: Vec<f64> = detrended.iter().zip(&seasonal).map(|(d, s)| d - s).collect();

        debug!("Decomposed {} observations with period {}", n, period);

        DecompositionOutcome::Computed(Decomposition {
            period,
            observed: values.to_vec(),
            trend,
            seasonal,
            residual,
        })
    }

    fn unavailable(reason: String) -> DecompositionOutcome {
        debug!("Decomposition unavailable: {}", reason);
        DecompositionOutcome::Unavailable { reason }
    }

    /// Centred moving average over one period.
    ///
    /// Odd periods use equal weights; even periods use `period + 1` weights
    /// with half weight on both ends. Positions without a full window are `None`.
    fn centered_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
        let weights: Vec<f64> = if period % 2 == 0 {
            let mut w = vec![1.0 / period as f64; period + 1];
            w[0] *= 0.5;
            w[period] *= 0.5;
            w
        } else {
            vec![1.0 / period as f64; period]
        };
        let half = weights.len() / 2;
        let n = values.len();

        (0..n)
            .map(|i| {
                if i < half || i + half >= n {
                    return None;
                }
                let window = &values[i - half..=i + half];
                Some(window.iter().zip(&weights).map(|(v, w)| v * w).sum())
            })
            .collect()
    }

    /// Fill undefined trend edges with least-squares lines.
    ///
    /// The front line is fitted over `[front, front + period - 1)` and the
    /// back line over `[back - period, back)`, where `front` and `back` are
    /// the first and last defined positions.
    fn extrapolate_edges(trend: &[Option<f64>], period: usize) -> Vec<f64> {
        let defined: Vec<usize> = trend
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|_| i))
            .collect();
        let (Some(&front), Some(&back)) = (defined.first(), defined.last()) else {
            return vec![0.0; trend.len()];
        };

        let fit = |from: usize, to: usize| -> (f64, f64) {
            let points: Vec<(f64, f64)> = (from..to)
                .filter_map(|i| trend[i].map(|t| (i as f64, t)))
                .collect();
            least_squares_line(&points)
        };

        let (front_slope, front_icept) = fit(front, (front + period - 1).min(back));
        let (back_slope, back_icept) = fit(back.saturating_sub(period).max(front), back);

        trend
            .iter()
            .enumerate()
            .map(|(i, t)| match t {
                Some(v) => *v,
                None if i < front => front_slope * i as f64 + front_icept,
                None => back_slope * i as f64 + back_icept,
            })
            .collect()
    }
}

/// Ordinary least-squares line `y = slope * x + intercept`.
fn least_squares_line(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    (slope, mean_y - slope * mean_x)
}
