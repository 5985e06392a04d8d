//! Stochastic wind field simulator
//!
//! `WindSimulator` ties the pipeline together:
//!
//! ```text
//! parameters ─► frequency grid ─► CPSD (spectrum × coherence) ─► Cholesky
//!                                                                  │
//!                         random phases ─► B_j ─► inverse FFT ─► samples
//! ```
//!
//! wrapped in the batch scheduler. The simulator owns its random seed and
//! advances it once per `simulate` call, so consecutive calls give different
//! realizations while a fresh instance with the same seed replays the same
//! sequence.

use crate::backend::{create_backend, BackendKind, SynthesisBackend};
use crate::batch::{self, BatchConfig, BatchPlan, PipelineInputs};
use crate::coherence::CoherenceModel;
use crate::cross_spectrum::CrossSpectrumBuilder;
use crate::diagnostics::{self, PointSelection};
use crate::error::SimulationError;
use crate::params::{Component, ParameterUpdate, SimulationParameters};
use crate::phase::{draw_phases, phasors};
use crate::points::PointSet;
use crate::profiler::ProfilerScope;
use crate::spectrum::{SpectrumKind, SpectrumModel};
use crate::synthesis::Synthesizer;
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

/// Synthesized fluctuating wind for one call
#[derive(Debug, Clone, PartialEq)]
pub struct WindField {
    /// `n x M` samples, one row per input point
    pub samples: DMatrix<f64>,
    /// Midpoint frequency grid (Hz), length `N`
    pub frequencies: Vec<f64>,
    /// Sample spacing (s)
    pub time_step: f64,
}

impl WindField {
    /// Number of points (rows)
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.samples.nrows()
    }

    /// Number of time samples per point
    #[must_use]
    pub fn time_point_count(&self) -> usize {
        self.samples.ncols()
    }

    /// Time series for one point
    #[must_use]
    pub fn series(&self, point: usize) -> Vec<f64> {
        self.samples.row(point).iter().copied().collect()
    }

    /// Sample times `p·dt`
    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        (0..self.time_point_count())
            .map(|p| p as f64 * self.time_step)
            .collect()
    }

    /// Covered duration `M·dt` (s)
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.time_point_count() as f64 * self.time_step
    }
}

/// Spectral-representation wind field simulator
pub struct WindSimulator {
    params: SimulationParameters,
    spectrum: Box<dyn SpectrumModel>,
    backend: Box<dyn SynthesisBackend>,
    batch: BatchConfig,
    seed: u64,
}

impl std::fmt::Debug for WindSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindSimulator")
            .field("params", &self.params)
            .field("spectrum", &self.spectrum.name())
            .field("backend", &self.backend.name())
            .field("batch", &self.batch)
            .field("seed", &self.seed)
            .finish()
    }
}

impl WindSimulator {
    /// Simulator with default parameters, the Kaimal spectrum and the
    /// parallel backend
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_backend(seed, BackendKind::default())
    }

    /// Simulator with default parameters and an explicit backend
    #[must_use]
    pub fn with_backend(seed: u64, backend: BackendKind) -> Self {
        let simulator = Self {
            params: SimulationParameters::default(),
            spectrum: SpectrumKind::default().create(),
            backend: create_backend(backend),
            batch: BatchConfig::default(),
            seed,
        };
        info!(
            "Created wind simulator (seed {}, {} spectrum, {} backend)",
            seed,
            simulator.spectrum.name(),
            simulator.backend.name()
        );
        simulator
    }

    /// Simulator whose spectrum is looked up by tag
    ///
    /// # Errors
    ///
    /// Returns `UnknownSpectrum` if `spectrum_tag` is not registered.
    pub fn from_tag(
        seed: u64,
        spectrum_tag: &str,
        backend: BackendKind,
    ) -> Result<Self, SimulationError> {
        let kind = SpectrumKind::from_tag(spectrum_tag)?;
        Ok(Self::with_backend(seed, backend).with_spectrum(kind.create()))
    }

    /// Replace the spectrum model
    pub fn with_spectrum(mut self, spectrum: Box<dyn SpectrumModel>) -> Self {
        debug!("Using {} spectrum", spectrum.name());
        self.spectrum = spectrum;
        self
    }

    /// Replace the batching configuration
    pub fn with_batch_config(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    /// Replace the parameter set
    pub fn with_parameters(mut self, params: SimulationParameters) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    #[must_use]
    pub fn batch_config(&self) -> &BatchConfig {
        &self.batch
    }

    pub fn set_batch_config(&mut self, batch: BatchConfig) {
        self.batch = batch;
    }

    /// Seed the next `simulate` call will use
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn backend(&self) -> &dyn SynthesisBackend {
        self.backend.as_ref()
    }

    /// Apply parameter overrides; derived values are recomputed
    pub fn update_parameters(&mut self, overrides: &ParameterUpdate) {
        self.params.update(overrides);
        debug!(
            "Parameters updated: N={}, M={}, dw={:.6}, z_d={:.4}",
            self.params.frequency_count(),
            self.params.time_point_count(),
            self.params.frequency_step(),
            self.params.zero_plane_displacement()
        );
    }

    /// Midpoint frequency grid for the current parameters
    #[must_use]
    pub fn frequencies(&self) -> Vec<f64> {
        self.params.frequencies()
    }

    /// Batch plan that `simulate` would use for `points` points
    #[must_use]
    pub fn plan(&self, points: usize) -> BatchPlan {
        BatchPlan::new(
            points,
            self.params.frequency_count(),
            self.params.time_point_count(),
            &self.batch,
        )
    }

    /// Theoretical one-point spectra, `N x n` (frequency by point)
    #[must_use]
    pub fn target_spectra(&self, heights: &[f64], component: Component) -> DMatrix<f64> {
        let frequencies = self.params.frequencies();
        DMatrix::from_fn(frequencies.len(), heights.len(), |k, i| {
            self.spectrum
                .power_spectrum(&self.params, frequencies[k], heights[i], component)
        })
    }

    /// Target cross-correlation between points `i` and `j`
    ///
    /// Built from `sqrt(S_i·S_j)·Coh_ij` over the frequency grid; length `M`,
    /// entry `k` at lag `(k - M/2)·dt`, peak-normalized. For `i == j` this is
    /// the target auto-correlation.
    ///
    /// # Errors
    ///
    /// Configuration errors for bad inputs or parameters, and
    /// `InvalidIndices` if `i` or `j` is out of range.
    pub fn theoretical_cross_correlation(
        &self,
        positions: &[[f64; 3]],
        wind_speeds: &[f64],
        i: usize,
        j: usize,
        component: Component,
    ) -> Result<Vec<f64>, SimulationError> {
        self.params.validate()?;
        let points = PointSet::new(positions.to_vec(), wind_speeds.to_vec())?;
        PointSelection::Pair(i, j).check(points.len())?;

        let (a, b) = (&points.positions()[i], &points.positions()[j]);
        let (speed_a, speed_b) = (points.wind_speeds()[i], points.wind_speeds()[j]);
        let coherence = CoherenceModel::from_params(&self.params);
        let cross_spectrum: Vec<f64> = self
            .params
            .frequencies()
            .into_iter()
            .map(|w| {
                let s_a = self.spectrum.power_spectrum(&self.params, w, a[2], component);
                let s_b = self.spectrum.power_spectrum(&self.params, w, b[2], component);
                (s_a * s_b).sqrt() * coherence.coherence(a, b, w, speed_a, speed_b)
            })
            .collect();

        Ok(diagnostics::theoretical_cross_correlation(
            &cross_spectrum,
            self.params.time_point_count(),
        ))
    }

    /// Synthesize fluctuating wind at every point
    ///
    /// Uses the instance seed, then advances it by one.
    ///
    /// # Arguments
    ///
    /// * `positions` - `(x, y, z)` per point (m)
    /// * `wind_speeds` - Mean wind speed per point (m/s), same order
    /// * `component` - Along-wind or vertical
    ///
    /// # Errors
    ///
    /// Configuration errors for bad inputs or parameters, and
    /// `NotPositiveDefinite` if a regularized CPSD slice cannot be factorized.
    pub fn simulate(
        &mut self,
        positions: &[[f64; 3]],
        wind_speeds: &[f64],
        component: Component,
    ) -> Result<WindField, SimulationError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.seed = self.seed.wrapping_add(1);
        self.simulate_with_rng(positions, wind_speeds, component, &mut rng)
    }

    /// Same as [`simulate`](Self::simulate) with a caller-owned RNG
    ///
    /// The instance seed is left untouched.
    ///
    /// # Errors
    ///
    /// See [`simulate`](Self::simulate).
    pub fn simulate_with_rng<R: Rng>(
        &self,
        positions: &[[f64; 3]],
        wind_speeds: &[f64],
        component: Component,
        rng: &mut R,
    ) -> Result<WindField, SimulationError> {
        let _scope = ProfilerScope::new("simulate");
        self.params.validate()?;
        let points = PointSet::new(positions.to_vec(), wind_speeds.to_vec())?;
        let below = self.count_below_displacement(&points);
        if below > 0 {
            warn!(
                "{} of {} points are below the zero-plane displacement z_d = {:.3} m; \
                 their samples will be NaN",
                below,
                points.len(),
                self.params.zero_plane_displacement()
            );
        }

        let n = points.len();
        let frequency_count = self.params.frequency_count();
        let time_points = self.params.time_point_count();
        let frequencies = self.params.frequencies();

        // Drawn once for the whole point set so batches share the same phases
        let phases = draw_phases(n, frequency_count, rng);
        let phasors = phasors(&phases);
        drop(phases);

        let plan = BatchPlan::new(n, frequency_count, time_points, &self.batch);
        let builder =
            CrossSpectrumBuilder::new(&self.params, self.spectrum.as_ref(), &points, component);
        let synthesizer =
            Synthesizer::new(frequency_count, time_points, self.params.frequency_step());

        let inputs = PipelineInputs {
            builder: &builder,
            frequencies: &frequencies,
            synthesizer: &synthesizer,
            phasors: &phasors,
        };
        let samples = batch::execute(&plan, self.backend.as_ref(), &inputs)?;

        info!(
            "Synthesized {} component at {} points ({} samples each)",
            component, n, time_points
        );

        Ok(WindField {
            samples,
            frequencies,
            time_step: self.params.time_step(),
        })
    }

    /// Points whose log wind profile is undefined
    ///
    /// `Z == z_d` is excluded: the spectrum there is zero, not NaN.
    fn count_below_displacement(&self, points: &PointSet) -> usize {
        let z_d = self.params.zero_plane_displacement();
        points.positions().iter().filter(|p| p[2] < z_d).count()
    }
}
