//! Spatial coherence between simulation points
//!
//! Davenport-type exponential decay with direction-dependent coefficients:
//!
//! ```text
//! D_ij   = sqrt(C_x²Δx² + C_y²Δy² + C_z²Δz²)
//! Coh_ij = exp(-2·n·D_ij / max(2π(U_i + U_j), 1e-8))
//! ```
//!
//! Coherence is 1 for coincident points, decays with separation and
//! frequency, and grows with the mean wind speed of the pair.

use crate::params::constants::COHERENCE_DENOMINATOR_FLOOR;
use crate::params::SimulationParameters;
use nalgebra::DMatrix;
use std::f64::consts::PI;

/// Coherence model parameterised by the decay coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoherenceModel {
    decay: [f64; 3],
}

impl CoherenceModel {
    #[must_use]
    pub fn new(decay_x: f64, decay_y: f64, decay_z: f64) -> Self {
        Self {
            decay: [decay_x, decay_y, decay_z],
        }
    }

    /// Model using `C_x`, `C_y`, `C_z` from the parameter set
    #[must_use]
    pub fn from_params(params: &SimulationParameters) -> Self {
        Self {
            decay: params.decay_coefficients(),
        }
    }

    /// Weighted separation `D_ij`
    #[inline]
    #[must_use]
    pub fn decay_distance(&self, a: &[f64; 3], b: &[f64; 3]) -> f64 {
        let [cx, cy, cz] = self.decay;
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        let dz = a[2] - b[2];
        (cx * cx * dx * dx + cy * cy * dy * dy + cz * cz * dz * dz).sqrt()
    }

    /// Coherence between two points at one frequency
    #[inline]
    #[must_use]
    pub fn coherence(
        &self,
        a: &[f64; 3],
        b: &[f64; 3],
        frequency: f64,
        speed_a: f64,
        speed_b: f64,
    ) -> f64 {
        let denominator = (2.0 * PI * (speed_a + speed_b)).max(COHERENCE_DENOMINATOR_FLOOR);
        (-2.0 * frequency * self.decay_distance(a, b) / denominator).exp()
    }
}

/// Full `n x n` coherence matrix at one frequency
#[must_use]
pub fn coherence_matrix(
    model: &CoherenceModel,
    positions: &[[f64; 3]],
    wind_speeds: &[f64],
    frequency: f64,
) -> DMatrix<f64> {
    let n = positions.len();
    DMatrix::from_fn(n, n, |i, j| {
        model.coherence(
            &positions[i],
            &positions[j],
            frequency,
            wind_speeds[i],
            wind_speeds[j],
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model() -> CoherenceModel {
        CoherenceModel::from_params(&SimulationParameters::default())
    }

    #[test]
    fn test_self_coherence_is_one() {
        let p = [3.0, -2.0, 15.0];
        assert_eq!(model().coherence(&p, &p, 2.5, 20.0, 20.0), 1.0);
    }

    #[test]
    fn test_coherence_decays_with_separation() {
        let m = model();
        let origin = [0.0, 0.0, 10.0];
        let mut previous = 1.0;
        for dx in [1.0, 5.0, 25.0, 125.0, 1000.0] {
            let c = m.coherence(&origin, &[dx, 0.0, 10.0], 1.0, 25.0, 25.0);
            assert!(c > 0.0 && c < previous, "dx={dx}: {c}");
            previous = c;
        }
        // exp(-2·1·16000 / (2π·50)) ≈ 6e-45
        let far = (-2.0 * 16.0 * 1000.0 / (2.0 * PI * 50.0)).exp();
        assert_relative_eq!(previous, far, max_relative = 1e-12);
        assert!(previous < 1e-40);
    }

    #[test]
    fn test_coherence_grows_with_wind_speed() {
        let m = model();
        let a = [0.0, 0.0, 10.0];
        let b = [0.0, 5.0, 10.0];
        let slow = m.coherence(&a, &b, 1.0, 5.0, 5.0);
        let fast = m.coherence(&a, &b, 1.0, 30.0, 30.0);
        assert!(fast > slow);
    }

    #[test]
    fn test_reference_value() {
        let m = CoherenceModel::new(16.0, 6.0, 10.0);
        let a = [0.0, 0.0, 10.0];
        let b = [1.0, 2.0, 12.0];
        let d = (256.0_f64 + 36.0 * 4.0 + 100.0 * 4.0).sqrt();
        let expected = (-2.0 * 0.5 * d / (2.0 * PI * 40.0)).exp();
        assert_relative_eq!(m.coherence(&a, &b, 0.5, 20.0, 20.0), expected, epsilon = 1e-14);
    }

    #[test]
    fn test_zero_speeds_use_floor() {
        let m = model();
        let a = [0.0, 0.0, 10.0];
        let b = [0.0, 0.0, 11.0];
        let c = m.coherence(&a, &b, 1.0, 0.0, 0.0);
        assert!(c.is_finite());
        assert_eq!(c, 0.0);
        // Coincident points stay fully coherent even at zero speed
        assert_eq!(m.coherence(&a, &a, 1.0, 0.0, 0.0), 1.0);
    }

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let positions = [[0.0, 0.0, 10.0], [5.0, 1.0, 20.0], [9.0, -3.0, 30.0]];
        let speeds = [20.0, 24.0, 27.0];
        let coh = coherence_matrix(&model(), &positions, &speeds, 0.8);
        for i in 0..3 {
            assert_eq!(coh[(i, i)], 1.0);
            for j in 0..3 {
                assert_eq!(coh[(i, j)], coh[(j, i)]);
            }
        }
    }
}
