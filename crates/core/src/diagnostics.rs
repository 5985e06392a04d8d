//! Checks on synthesized series
//!
//! Consumer-side helpers for picking points and comparing their series:
//! sample statistics, correlation and normalized cross-correlation, plus the
//! target cross-correlation implied by a cross spectrum. Plotting code works
//! from these and `WindSimulator::target_spectra` /
//! `WindSimulator::theoretical_cross_correlation`.

use crate::error::SimulationError;
use rand::Rng;
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

/// Which points to inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSelection {
    /// `count` points drawn uniformly (with replacement)
    Random(usize),
    /// A single point
    Single(usize),
    /// A pair of points, e.g. for cross-correlation
    Pair(usize, usize),
}

impl PointSelection {
    /// Selection from a raw index list: one index or a pair
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndices` for any other length.
    pub fn from_indices(indices: &[usize]) -> Result<Self, SimulationError> {
        match *indices {
            [i] => Ok(Self::Single(i)),
            [i, j] => Ok(Self::Pair(i, j)),
            _ => Err(SimulationError::InvalidIndices {
                selection: format!("{indices:?}"),
                point_count: None,
            }),
        }
    }

    /// Concrete indices for a set of `point_count` points
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndices` if an index is out of range, or if a random
    /// selection is requested from no points or for zero points.
    pub fn resolve<R: Rng>(
        &self,
        point_count: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>, SimulationError> {
        self.check(point_count)?;
        Ok(match *self {
            Self::Random(count) => (0..count)
                .map(|_| rng.random_range(0..point_count))
                .collect(),
            Self::Single(i) => vec![i],
            Self::Pair(i, j) => vec![i, j],
        })
    }

    /// Check the selection against a set of `point_count` points
    ///
    /// # Errors
    ///
    /// Same conditions as [`resolve`](Self::resolve).
    pub fn check(&self, point_count: usize) -> Result<(), SimulationError> {
        let valid = match *self {
            Self::Random(count) => count > 0 && point_count > 0,
            Self::Single(i) => i < point_count,
            Self::Pair(i, j) => i < point_count && j < point_count,
        };
        if valid {
            Ok(())
        } else {
            Err(SimulationError::InvalidIndices {
                selection: format!("{self:?}"),
                point_count: Some(point_count),
            })
        }
    }
}

/// Arithmetic mean
#[must_use]
pub fn mean(series: &[f64]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().sum::<f64>() / series.len() as f64
}

/// Population variance
#[must_use]
pub fn variance(series: &[f64]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let mu = mean(series);
    series.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / series.len() as f64
}

/// Pearson correlation coefficient of two equal-length series
///
/// Returns NaN if either series has zero variance.
#[must_use]
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());
    let (a, b) = (&a[..len], &b[..len]);
    let (mu_a, mu_b) = (mean(a), mean(b));

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mu_a;
        let dy = y - mu_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    cov / (var_a * var_b).sqrt()
}

/// Normalized cross-correlation for lags `-max_lag..=max_lag`
///
/// Entry `k` holds lag `k - max_lag`; a positive lag pairs `a[t]` with
/// `b[t + lag]`. Normalized by the zero-lag standard deviations and the full
/// series length, so the zero-lag value equals [`correlation`].
#[must_use]
pub fn cross_correlation(a: &[f64], b: &[f64], max_lag: usize) -> Vec<f64> {
    let len = a.len().min(b.len());
    let (a, b) = (&a[..len], &b[..len]);
    let (mu_a, mu_b) = (mean(a), mean(b));
    let norm = (variance(a) * variance(b)).sqrt() * len as f64;

    let max_lag = max_lag.min(len.saturating_sub(1));
    let lag_sum = |lag: isize| -> f64 {
        let shift = lag.unsigned_abs();
        let pairs = a.iter().zip(b.iter().skip(shift));
        let reverse = b.iter().zip(a.iter().skip(shift));
        if lag >= 0 {
            pairs.map(|(x, y)| (x - mu_a) * (y - mu_b)).sum()
        } else {
            reverse.map(|(y, x)| (x - mu_a) * (y - mu_b)).sum()
        }
    };

    let max_lag = max_lag as isize;
    (-max_lag..=max_lag).map(|lag| lag_sum(lag) / norm).collect()
}

/// Target cross-correlation from a one-sided real cross spectrum
///
/// `cross_spectrum[l]` is `sqrt(S_i·S_j)·Coh_ij` at grid frequency `l`. The
/// spectrum is placed in bins `1..=N`, mirrored into the top `N` bins, inverse
/// transformed and centred, so entry `k` holds lag `(k - M/2)·dt`. Values are
/// scaled by the peak magnitude (left as-is when that is zero).
///
/// # Panics
///
/// If `time_points` is not larger than the spectrum length.
#[must_use]
pub fn theoretical_cross_correlation(cross_spectrum: &[f64], time_points: usize) -> Vec<f64> {
    assert!(
        time_points > cross_spectrum.len(),
        "cannot mirror {} bins into {time_points} samples",
        cross_spectrum.len()
    );
    let mut full = vec![Complex64::new(0.0, 0.0); time_points];
    for (k, &x) in cross_spectrum.iter().enumerate() {
        full[k + 1] = Complex64::new(x, 0.0);
        full[time_points - 1 - k] = Complex64::new(x, 0.0);
    }

    let mut planner = FftPlanner::new();
    planner.plan_fft_inverse(time_points).process(&mut full);

    let mut values: Vec<f64> = full.iter().map(|c| c.re).collect();
    values.rotate_right(time_points / 2);

    let peak = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if peak > 0.0 {
        for v in &mut values {
            *v /= peak;
        }
    }
    values
}
