//! Synthesis backend trait definition
//!
//! The three heavy stages of the pipeline go through this trait so the
//! batch scheduler can drive either strategy without knowing which one it has.

use crate::cross_spectrum::CrossSpectrumBuilder;
use crate::synthesis::{FactorRows, Synthesizer};
use nalgebra::DMatrix;
use rustfft::num_complex::Complex64;

/// Backend-agnostic interface for the CPSD, factorization and synthesis stages
pub trait SynthesisBackend: Send + Sync {
    /// Build CPSD matrices for each frequency, in order
    ///
    /// # Arguments
    ///
    /// * `builder` - CPSD builder bound to the point set and component
    /// * `frequencies` - Frequencies to evaluate (Hz)
    fn build_cross_spectra(
        &self,
        builder: &CrossSpectrumBuilder<'_>,
        frequencies: &[f64],
    ) -> Vec<DMatrix<f64>>;

    /// Cholesky-factor each regularized CPSD slice
    ///
    /// # Errors
    ///
    /// Returns the index (into `cpsd`) of the lowest slice that is not
    /// positive definite.
    fn factorize(&self, cpsd: &[DMatrix<f64>]) -> Result<Vec<DMatrix<f64>>, usize>;

    /// Synthesize the time series for every point in `factors.rows()`
    ///
    /// # Arguments
    ///
    /// * `synthesizer` - FFT plan and scaling for the current `N`, `M`, `dw`
    /// * `factors` - Factor rows for the points being synthesized
    /// * `phasors` - `n x N` matrix of `exp(i·φ[m, l])` for the whole point set
    ///
    /// # Returns
    ///
    /// One series of length `M` per point, in row order
    fn synthesize(
        &self,
        synthesizer: &Synthesizer,
        factors: &FactorRows,
        phasors: &DMatrix<Complex64>,
    ) -> Vec<Vec<f64>>;

    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Check if this backend runs stages concurrently
    fn is_parallel(&self) -> bool;
}
