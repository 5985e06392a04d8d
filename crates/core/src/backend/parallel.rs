//! Rayon data-parallel backend
//!
//! Frequencies are independent until synthesis, so CPSD construction and
//! factorization map over the frequency axis. Synthesis maps over output rows,
//! each worker holding its own FFT scratch buffer.

use super::SynthesisBackend;
use crate::cross_spectrum::CrossSpectrumBuilder;
use crate::factorize::factorize_slice;
use crate::synthesis::{FactorRows, Synthesizer};
use nalgebra::DMatrix;
use rayon::prelude::*;
use rustfft::num_complex::Complex64;

/// Parallel over frequencies and output rows
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelBackend;

impl SynthesisBackend for ParallelBackend {
    fn build_cross_spectra(
        &self,
        builder: &CrossSpectrumBuilder<'_>,
        frequencies: &[f64],
    ) -> Vec<DMatrix<f64>> {
        frequencies
            .par_iter()
            .map(|&w| builder.at_frequency(w))
            .collect()
    }

    fn factorize(&self, cpsd: &[DMatrix<f64>]) -> Result<Vec<DMatrix<f64>>, usize> {
        let factors: Vec<Option<DMatrix<f64>>> = cpsd.par_iter().map(factorize_slice).collect();

        // Report the lowest failing index regardless of scheduling order
        if let Some(idx) = factors.iter().position(Option::is_none) {
            return Err(idx);
        }
        Ok(factors.into_iter().flatten().collect())
    }

    fn synthesize(
        &self,
        synthesizer: &Synthesizer,
        factors: &FactorRows,
        phasors: &DMatrix<Complex64>,
    ) -> Vec<Vec<f64>> {
        factors
            .rows()
            .into_par_iter()
            .map_init(
                || synthesizer.scratch(),
                |scratch, j| synthesizer.synthesize_point(factors, phasors, j, scratch),
            )
            .collect()
    }

    fn name(&self) -> &'static str {
        "parallel"
    }

    fn is_parallel(&self) -> bool {
        true
    }
}
