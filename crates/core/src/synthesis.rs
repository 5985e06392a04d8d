//! Frequency-domain to time-domain synthesis
//!
//! For point `j` the spectral coefficients are
//!
//! ```text
//! B_j[l] = Σ_{m ≤ j} H_l[j, m] · exp(i·φ[m, l])        l = 0..N
//! ```
//!
//! zero-padded to `M = 2N`, transformed with an unnormalised inverse FFT
//! (`ifft(B)·M`), shifted by half a frequency bin and scaled:
//!
//! ```text
//! x_j[p] = sqrt(2·dw) · Re(G_j[p] · exp(i·p·π / M))
//! ```
//!
//! The half-bin shift accounts for the midpoint frequency grid
//! `(l + 0.5)·dw`. Only factor entries with `m ≤ j` enter the sum.

use nalgebra::DMatrix;
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Factor rows needed to synthesize a contiguous range of points
///
/// `slices[l]` holds rows `rows` of the lower-triangular factor at frequency
/// `l`, restricted to columns `0..rows.end` (columns past the last row are
/// structurally zero).
#[derive(Debug, Clone)]
pub struct FactorRows {
    rows: Range<usize>,
    slices: Vec<DMatrix<f64>>,
}

impl FactorRows {
    /// Empty container for `rows`, sized for `frequencies` slices
    #[must_use]
    pub fn with_capacity(rows: Range<usize>, frequencies: usize) -> Self {
        Self {
            rows,
            slices: Vec::with_capacity(frequencies),
        }
    }

    /// Append the rows of one full `n x n` factor
    pub fn push_factor(&mut self, factor: DMatrix<f64>) {
        let n = factor.nrows();
        let slice = if self.rows.start == 0 && self.rows.end == n {
            factor
        } else {
            factor
                .view((self.rows.start, 0), (self.rows.len(), self.rows.end))
                .into_owned()
        };
        self.slices.push(slice);
    }

    /// Wrap full factors, keeping every row
    #[must_use]
    pub fn from_full(factors: Vec<DMatrix<f64>>) -> Self {
        let n = factors.first().map_or(0, DMatrix::<f64>::nrows);
        Self {
            rows: 0..n,
            slices: factors,
        }
    }

    #[must_use]
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Number of frequency slices held
    #[must_use]
    pub fn frequency_count(&self) -> usize {
        self.slices.len()
    }

    /// Factor entry `H_l[j, m]` for a point `j` inside `rows` and `m ≤ j`
    #[inline]
    #[must_use]
    pub fn entry(&self, l: usize, j: usize, m: usize) -> f64 {
        self.slices[l][(j - self.rows.start, m)]
    }
}

/// Inverse-FFT synthesizer for fixed `N`, `M` and `dw`
pub struct Synthesizer {
    frequency_count: usize,
    time_points: usize,
    scale: f64,
    inverse: Arc<dyn Fft<f64>>,
    shift: Vec<Complex64>,
}

impl fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synthesizer")
            .field("frequency_count", &self.frequency_count)
            .field("time_points", &self.time_points)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

impl Synthesizer {
    /// Plan the inverse FFT of length `time_points`
    ///
    /// `time_points` must be at least `frequency_count`.
    #[must_use]
    pub fn new(frequency_count: usize, time_points: usize, frequency_step: f64) -> Self {
        assert!(
            time_points >= frequency_count,
            "cannot zero-pad {frequency_count} coefficients into {time_points} samples"
        );
        let mut planner = FftPlanner::new();
        let inverse = planner.plan_fft_inverse(time_points);
        let m = time_points as f64;
        let shift = (0..time_points)
            .map(|p| Complex64::from_polar(1.0, p as f64 * PI / m))
            .collect();

        Self {
            frequency_count,
            time_points,
            scale: (2.0 * frequency_step).sqrt(),
            inverse,
            shift,
        }
    }

    #[must_use]
    pub fn time_points(&self) -> usize {
        self.time_points
    }

    /// Scratch buffer sized for the planned FFT
    #[must_use]
    pub fn scratch(&self) -> Vec<Complex64> {
        vec![Complex64::new(0.0, 0.0); self.inverse.get_inplace_scratch_len()]
    }

    /// Zero-padded coefficient vector `B_j` of length `M`
    #[must_use]
    pub fn coefficients(
        &self,
        factors: &FactorRows,
        phasors: &DMatrix<Complex64>,
        j: usize,
    ) -> Vec<Complex64> {
        let mut b = vec![Complex64::new(0.0, 0.0); self.time_points];
        for (l, coefficient) in b.iter_mut().take(self.frequency_count).enumerate() {
            let mut acc = Complex64::new(0.0, 0.0);
            for m in 0..=j {
                acc += phasors[(m, l)] * factors.entry(l, j, m);
            }
            *coefficient = acc;
        }
        b
    }

    /// Time series for point `j`
    ///
    /// `phasors` is the `n x N` matrix of `exp(i·φ[m, l])`.
    #[must_use]
    pub fn synthesize_point(
        &self,
        factors: &FactorRows,
        phasors: &DMatrix<Complex64>,
        j: usize,
        scratch: &mut [Complex64],
    ) -> Vec<f64> {
        let mut g = self.coefficients(factors, phasors, j);
        // rustfft's inverse is unnormalised, i.e. already ifft(B)·M
        self.inverse.process_with_scratch(&mut g, scratch);
        g.iter()
            .zip(&self.shift)
            .map(|(g_p, shift_p)| self.scale * (g_p * shift_p).re)
            .collect()
    }
}
