//! Random phase generation
//!
//! Phases are uniform on `[0, 2π)` and laid out as an `n x N` matrix indexed
//! `phase[(m, l)]` (point `m`, frequency `l`). They are drawn row by row so a
//! given RNG state always maps to the same matrix.

use nalgebra::DMatrix;
use rand::Rng;
use rustfft::num_complex::Complex64;
use std::f64::consts::TAU;

/// Draw an `n x N` matrix of independent phases on `[0, 2π)`
pub fn draw_phases<R: Rng>(points: usize, frequencies: usize, rng: &mut R) -> DMatrix<f64> {
    DMatrix::from_row_iterator(
        points,
        frequencies,
        (0..points * frequencies).map(|_| rng.random_range(0.0..TAU)),
    )
}

/// Unit phasors `exp(i·phase)`, same layout as the phase matrix
#[must_use]
pub fn phasors(phases: &DMatrix<f64>) -> DMatrix<Complex64> {
    phases.map(|p| Complex64::from_polar(1.0, p))
}
