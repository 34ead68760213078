//! Kendall rank correlation (tau-b) with a two-sided p-value.
//!
//! The p-value comes from the exact permutation distribution when neither
//! variable has ties and the sample is small (n <= 33) or the discordant
//! count is within one of an extreme. Otherwise the tie-corrected normal
//! approximation is used.

use statrs::function::erf::erfc;
use statrs::function::factorial::factorial;
use tracing::debug;

use crate::types::TrendTest;

/// Minimum number of observations for a trend test.
pub const MIN_OBSERVATIONS: usize = 8;

/// Largest n for which the exact distribution is always used.
const EXACT_MAX_N: usize = 33;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KendallTau {
    /// Rank correlation in [-1, 1]; `None` when either variable is constant.
    pub tau: Option<f64>,
    /// Two-sided p-value; `None` when `tau` is undefined.
    pub p_value: Option<f64>,
}

#[derive(Debug, Default)]
struct PairCounts {
    concordant: u64,
    discordant: u64,
    /// Pairs tied in x (including those also tied in y).
    x_ties: u64,
    /// Pairs tied in y (including those also tied in x).
    y_ties: u64,
}

/// Sign of `a - b`; `-0.0` and `0.0` compare equal.
fn sign(a: f64, b: f64) -> i8 {
    a.partial_cmp(&b).map_or(0, |o| o as i8)
}

fn count_pairs(x: &[f64], y: &[f64]) -> PairCounts {
    let mut counts = PairCounts::default();
    let n = x.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = sign(x[j], x[i]);
            let dy = sign(y[j], y[i]);
            if dx == 0 {
                counts.x_ties += 1;
            }
            if dy == 0 {
                counts.y_ties += 1;
            }
            if dx != 0 && dy != 0 {
                if dx == dy {
                    counts.concordant += 1;
                } else {
                    counts.discordant += 1;
                }
            }
        }
    }
    counts
}

/// Sizes of groups of equal values.
fn tie_groups(values: &[f64]) -> Vec<u64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mut groups = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        groups.push((j - i) as u64);
        i = j;
    }
    groups
}

/// Number of permutations of `n` items with at most `c` inversions.
fn mahonian_cdf(n: usize, c: usize) -> f64 {
    let mut counts = vec![0.0f64; c + 1];
    counts[0] = 1.0;
    let mut prefix = vec![0.0f64; c + 2];
    for j in 2..=n {
        for k in 0..=c {
            prefix[k + 1] = prefix[k] + counts[k];
        }
        for k in 0..=c {
            let lo = k.saturating_sub(j - 1);
            counts[k] = prefix[k + 1] - prefix[lo];
        }
    }
    counts.iter().sum()
}

/// Exact two-sided p-value for `discordant` out of `total` pairs, no ties.
fn exact_p_value(n: usize, discordant: u64, total: u64) -> f64 {
    let c = discordant.min(total - discordant);
    if 2 * c == total {
        return 1.0;
    }
    let n_fact = factorial(n as u64);
    if !n_fact.is_finite() {
        return 0.0;
    }
    (2.0 * mahonian_cdf(n, c as usize) / n_fact).min(1.0)
}

/// Kendall's tau-b between two equally long samples.
///
/// # Example
///
/// ```rust,ignore
/// let r = kendall_tau(&[12.0, 2.0, 1.0, 12.0, 2.0], &[1.0, 4.0, 7.0, 1.0, 0.0]);
/// assert!((r.tau.unwrap() + 0.4714).abs() < 1e-4);
/// ```
pub fn kendall_tau(x: &[f64], y: &[f64]) -> KendallTau {
    let undefined = KendallTau {
        tau: None,
        p_value: None,
    };
    let n = x.len().min(y.len());
    if n < 2 {
        return undefined;
    }
    let (x, y) = (&x[..n], &y[..n]);

    let counts = count_pairs(x, y);
    let total = (n * (n - 1) / 2) as u64;
    if counts.x_ties == total || counts.y_ties == total {
        return undefined;
    }

    let con_minus_dis = counts.concordant as f64 - counts.discordant as f64;
    let tau = (con_minus_dis
        / ((total - counts.x_ties) as f64).sqrt()
        / ((total - counts.y_ties) as f64).sqrt())
    .clamp(-1.0, 1.0);

    let no_ties = counts.x_ties == 0 && counts.y_ties == 0;
    let near_extreme = counts.discordant.min(total - counts.discordant) <= 1;
    let p_value = if no_ties && (n <= EXACT_MAX_N || near_extreme) {
        exact_p_value(n, counts.discordant, total)
    } else {
        let (gx, gy) = (tie_groups(x), tie_groups(y));
        let sum = |groups: &[u64], f: fn(f64) -> f64| -> f64 {
            groups.iter().map(|&t| f(t as f64)).sum()
        };
        let x0 = sum(&gx, |t| t * (t - 1.0) * (t - 2.0));
        let y0 = sum(&gy, |t| t * (t - 1.0) * (t - 2.0));
        let x1 = sum(&gx, |t| t * (t - 1.0) * (2.0 * t + 5.0));
        let y1 = sum(&gy, |t| t * (t - 1.0) * (2.0 * t + 5.0));

        let nf = n as f64;
        let m = nf * (nf - 1.0);
        let mut var = (m * (2.0 * nf + 5.0) - x1 - y1) / 18.0
            + 2.0 * counts.x_ties as f64 * counts.y_ties as f64 / m;
        if n > 2 {
            var += x0 * y0 / (9.0 * m * (nf - 2.0));
        }
        let z = con_minus_dis / var.sqrt();
        erfc(z.abs() / std::f64::consts::SQRT_2)
    };

    KendallTau {
        tau: Some(tau),
        p_value: Some(p_value),
    }
}

/// Monotonic-trend test of `values` against their index `0..n`.
///
/// `values` must already have undefined entries removed.
pub fn trend_test(values: &[f64]) -> TrendTest {
    let n = values.len();
    if n < MIN_OBSERVATIONS {
        debug!("Trend test skipped: {} observations (< {})", n, MIN_OBSERVATIONS);
        return TrendTest::InsufficientData { n };
    }
    let index: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let result = kendall_tau(&index, values);
    TrendTest::Computed {
        tau: result.tau,
        p_value: result.p_value,
        n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_tied_sample_uses_normal_approximation() {
        let x = [12.0, 2.0, 1.0, 12.0, 2.0];
        let y = [1.0, 4.0, 7.0, 1.0, 0.0];
        let r = kendall_tau(&x, &y);
        assert_close(r.tau.unwrap(), -0.471_404_520_791_031_7, 1e-12);
        assert_close(r.p_value.unwrap(), 0.282_745_459_932_774_8, 1e-6);
    }

    #[test]
    fn test_strictly_increasing_series() {
        let values: Vec<f64> = (0..30).map(|i| i as f64 * 0.5 + 3.0).collect();
        match trend_test(&values) {
            TrendTest::Computed { tau, p_value, n } => {
                assert_eq!(n, 30);
                assert_close(tau.unwrap(), 1.0, 1e-12);
                assert!(p_value.unwrap() < 0.05);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_strictly_decreasing_exact_p() {
        let values = [8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        let test = trend_test(&values);
        assert_close(test.tau().unwrap(), -1.0, 1e-12);
        // 2 / 8!
        assert_close(test.p_value().unwrap(), 2.0 / 40_320.0, 1e-12);
    }

    #[test]
    fn test_exact_p_with_some_discordance() {
        let values = [1.0, 3.0, 2.0, 5.0, 4.0, 7.0, 6.0, 9.0, 8.0, 10.0];
        let test = trend_test(&values);
        assert_close(test.tau().unwrap(), 0.822_222_222_222_222_1, 1e-12);
        assert_close(test.p_value().unwrap(), 0.000_357_694_003_527_336_9, 1e-12);
    }

    #[test]
    fn test_large_sample_normal_approximation() {
        let values: Vec<f64> = (0..40).map(|i| ((i * 7) % 40) as f64).collect();
        let test = trend_test(&values);
        assert_close(test.tau().unwrap(), 0.146_153_846_153_846_16, 1e-12);
        assert_close(test.p_value().unwrap(), 0.184_106_129, 1e-6);
    }

    #[test]
    fn test_constant_series_is_undefined() {
        let values = [4.2; 12];
        assert_eq!(
            trend_test(&values),
            TrendTest::Computed {
                tau: None,
                p_value: None,
                n: 12
            }
        );
    }

    #[test]
    fn test_insufficient_data() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert_eq!(trend_test(&values), TrendTest::InsufficientData { n: 7 });
        assert_eq!(trend_test(&[]), TrendTest::InsufficientData { n: 0 });
    }

    #[test]
    fn test_signed_zero_counts_as_tie() {
        let index: Vec<f64> = (0..41).map(|i| i as f64).collect();
        let mut values: Vec<f64> = (0..41).map(|i| ((i * 17) % 41) as f64 - 20.5).collect();
        let mut zeros = values.clone();
        values[3] = -0.0;
        values[30] = 0.0;
        zeros[3] = 0.0;
        zeros[30] = 0.0;

        let mixed = kendall_tau(&index, &values);
        let plain = kendall_tau(&index, &zeros);
        assert_eq!(mixed, plain);
        assert_eq!(count_pairs(&index, &values).y_ties, 1);
    }

    #[test]
    fn test_mahonian_cdf_small() {
        // permutations of 3 by inversions: 1, 2, 2, 1
        assert_eq!(mahonian_cdf(3, 0), 1.0);
        assert_eq!(mahonian_cdf(3, 1), 3.0);
        assert_eq!(mahonian_cdf(3, 2), 5.0);
        assert_eq!(mahonian_cdf(3, 3), 6.0);
    }
}
