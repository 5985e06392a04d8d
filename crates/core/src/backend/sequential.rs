//! Single-threaded reference backend

use super::SynthesisBackend;
use crate::cross_spectrum::CrossSpectrumBuilder;
use crate::factorize::factorize_all;
use crate::synthesis::{FactorRows, Synthesizer};
use nalgebra::DMatrix;
use rustfft::num_complex::Complex64;

/// Loops over frequencies and points in order
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialBackend;

impl SynthesisBackend for SequentialBackend {
    fn build_cross_spectra(
        &self,
        builder: &CrossSpectrumBuilder<'_>,
        frequencies: &[f64],
    ) -> Vec<DMatrix<f64>> {
        builder.build(frequencies)
    }

    fn factorize(&self, cpsd: &[DMatrix<f64>]) -> Result<Vec<DMatrix<f64>>, usize> {
        factorize_all(cpsd)
    }

    fn synthesize(
        &self,
        synthesizer: &Synthesizer,
        factors: &FactorRows,
        phasors: &DMatrix<Complex64>,
    ) -> Vec<Vec<f64>> {
        let mut scratch = synthesizer.scratch();
        factors
            .rows()
            .map(|j| synthesizer.synthesize_point(factors, phasors, j, &mut scratch))
            .collect()
    }

    fn name(&self) -> &'static str {
        "sequential"
    }

    fn is_parallel(&self) -> bool {
        false
    }
}
