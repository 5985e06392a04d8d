//! Cross-power-spectral-density matrix construction
//!
//! For each frequency the CPSD matrix over all points is
//!
//! ```text
//! S_ij(n) = sqrt(S_i(n)·S_j(n)) · Coh_ij(n)
//! ```
//!
//! with `S_ii = S_i`. The matrix couples every point to every other point, so
//! building it always needs the full point set.

use crate::coherence::CoherenceModel;
use crate::params::{Component, SimulationParameters};
use crate::points::PointSet;
use crate::spectrum::SpectrumModel;
use nalgebra::DMatrix;

/// Builds per-frequency CPSD matrices for one point set and component
pub struct CrossSpectrumBuilder<'a> {
    params: &'a SimulationParameters,
    spectrum: &'a dyn SpectrumModel,
    coherence: CoherenceModel,
    points: &'a PointSet,
    heights: Vec<f64>,
    component: Component,
}

impl<'a> CrossSpectrumBuilder<'a> {
    #[must_use]
    pub fn new(
        params: &'a SimulationParameters,
        spectrum: &'a dyn SpectrumModel,
        points: &'a PointSet,
        component: Component,
    ) -> Self {
        Self {
            params,
            spectrum,
            coherence: CoherenceModel::from_params(params),
            points,
            heights: points.heights(),
            component,
        }
    }

    /// Number of points (matrix dimension)
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.points.len()
    }

    /// One-point target spectra at `frequency`, one entry per point
    #[must_use]
    pub fn target_spectra(&self, frequency: f64) -> Vec<f64> {
        self.spectrum
            .power_spectrum_at_heights(self.params, frequency, &self.heights, self.component)
    }

    /// CPSD matrix at one frequency
    #[must_use]
    pub fn at_frequency(&self, frequency: f64) -> DMatrix<f64> {
        let s = self.target_spectra(frequency);
        let positions = self.points.positions();
        let speeds = self.points.wind_speeds();
        let n = self.dimension();

        DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                s[i]
            } else {
                let coh = self.coherence.coherence(
                    &positions[i],
                    &positions[j],
                    frequency,
                    speeds[i],
                    speeds[j],
                );
                (s[i] * s[j]).sqrt() * coh
            }
        })
    }

    /// CPSD matrices for every frequency, in order
    #[must_use]
    pub fn build(&self, frequencies: &[f64]) -> Vec<DMatrix<f64>> {
        frequencies.iter().map(|&w| self.at_frequency(w)).collect()
    }
}
