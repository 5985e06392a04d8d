//! Memory-aware batching of the synthesis pipeline
//!
//! The dominant allocations scale with the point count `n` and the frequency
//! count `N`:
//!
//! ```text
//! CPSD slices            f·n²·8 bytes   (f = frequency batch)
//! factor slices          f·n²·8 bytes
//! retained factor rows   N·b·n·8 bytes  (b = point batch)
//! B/G buffers            b·M·16 bytes
//! output                 n·M·8 bytes
//! ```
//!
//! summed and multiplied by a safety factor. When the estimate exceeds the
//! budget the point set is split into contiguous row batches and the frequency
//! axis into contiguous sub-ranges.
//!
//! Every point batch still builds CPSD matrices over the full point set
//! (coherence couples every pair) and factorizes them; it only keeps and
//! synthesizes its own rows. Frequency sub-ranges bound how many full `n x n`
//! slices exist at once. Batches write disjoint output rows and read the same
//! phase matrix, so batching never changes the samples.

use crate::backend::SynthesisBackend;
use crate::cross_spectrum::CrossSpectrumBuilder;
use crate::error::SimulationError;
use crate::profiler::ProfilerScope;
use crate::synthesis::{FactorRows, Synthesizer};
use nalgebra::DMatrix;
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, info, warn};

/// Multiplier applied to the raw byte estimate
pub const SAFETY_FACTOR: f64 = 1.5;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const REAL_BYTES: f64 = 8.0;
const COMPLEX_BYTES: f64 = 16.0;

/// Batching knobs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Memory budget in GiB
    pub max_memory_gb: f64,
    /// Force point batches of this size
    pub point_batch_size: Option<usize>,
    /// Force frequency sub-batches of this size
    pub freq_batch_size: Option<usize>,
    /// Pick batch sizes automatically when over budget
    pub auto_batch: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_memory_gb: 4.0,
            point_batch_size: None,
            freq_batch_size: None,
            auto_batch: true,
        }
    }
}

impl BatchConfig {
    fn budget_bytes(&self) -> f64 {
        self.max_memory_gb * BYTES_PER_GB
    }

    fn is_forced(&self) -> bool {
        self.point_batch_size.is_some() || self.freq_batch_size.is_some()
    }
}

/// Peak memory estimate for one batch configuration, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryEstimate {
    /// CPSD slices alive during construction
    pub cross_spectra: f64,
    /// Factor slices alive during factorization
    pub factors: f64,
    /// Factor rows retained for synthesis
    pub retained_rows: f64,
    /// Coefficient and FFT buffers
    pub buffers: f64,
    /// Output sample matrix
    pub output: f64,
}

impl MemoryEstimate {
    /// Estimate for `n` points, `N` frequencies and `M` time points, processed
    /// in point batches of `point_batch` and frequency batches of `freq_batch`
    #[must_use]
    pub fn new(
        points: usize,
        frequencies: usize,
        time_points: usize,
        point_batch: usize,
        freq_batch: usize,
    ) -> Self {
        let n = points as f64;
        let b = point_batch.min(points) as f64;
        let f = freq_batch.min(frequencies) as f64;
        Self {
            cross_spectra: f * n * n * REAL_BYTES,
            factors: f * n * n * REAL_BYTES,
            retained_rows: frequencies as f64 * b * n * REAL_BYTES,
            buffers: b * time_points as f64 * COMPLEX_BYTES,
            output: n * time_points as f64 * REAL_BYTES,
        }
    }

    /// Raw sum without the safety factor
    #[must_use]
    pub fn raw_bytes(&self) -> f64 {
        self.cross_spectra + self.factors + self.retained_rows + self.buffers + self.output
    }

    /// Sum with the safety factor applied
    #[must_use]
    pub fn total_bytes(&self) -> f64 {
        self.raw_bytes() * SAFETY_FACTOR
    }

    #[must_use]
    pub fn total_gb(&self) -> f64 {
        self.total_bytes() / BYTES_PER_GB
    }
}

/// How a `simulate` call will be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One pass over all points and frequencies
    Direct,
    /// Split into point batches, each walking the frequency sub-batches
    Batched {
        point_batches: usize,
        freq_batches: usize,
    },
}

/// Point and frequency partition for one call
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    /// Contiguous output row ranges, in order
    pub point_ranges: Vec<Range<usize>>,
    /// Contiguous frequency index ranges, in order
    pub freq_ranges: Vec<Range<usize>>,
    /// Estimate for the chosen batch sizes
    pub estimate: MemoryEstimate,
}

impl BatchPlan {
    /// Decide batch sizes for `n` points, `N` frequencies and `M` time points
    #[must_use]
    pub fn new(
        points: usize,
        frequencies: usize,
        time_points: usize,
        config: &BatchConfig,
    ) -> Self {
        let budget = config.budget_bytes();
        let full = MemoryEstimate::new(points, frequencies, time_points, points, frequencies);
        info!(
            "Estimated memory for {} points x {} frequencies: {:.3} GB (budget {:.3} GB)",
            points,
            frequencies,
            full.total_gb(),
            config.max_memory_gb
        );

        let mut point_batch = config.point_batch_size.unwrap_or(points).clamp(1, points.max(1));
        let mut freq_batch = config
            .freq_batch_size
            .unwrap_or(frequencies)
            .clamp(1, frequencies.max(1));

        if !config.is_forced() && full.total_bytes() > budget {
            if config.auto_batch {
                loop {
                    let estimate = MemoryEstimate::new(
                        points,
                        frequencies,
                        time_points,
                        point_batch,
                        freq_batch,
                    );
                    if estimate.total_bytes() <= budget {
                        break;
                    }
                    // Shrink whichever side dominates the estimate
                    let slices_dominate =
                        estimate.cross_spectra + estimate.factors >= estimate.retained_rows;
                    if freq_batch > 1 && (slices_dominate || point_batch == 1) {
                        freq_batch = freq_batch.div_ceil(2);
                    } else if point_batch > 1 {
                        point_batch = point_batch.div_ceil(2);
                    } else {
                        warn!(
                            "Smallest batches still need {:.3} GB, over the {:.3} GB budget",
                            estimate.total_gb(),
                            config.max_memory_gb
                        );
                        break;
                    }
                }
            } else {
                warn!(
                    "Running unbatched at {:.3} GB, over the {:.3} GB budget (auto_batch disabled)",
                    full.total_gb(),
                    config.max_memory_gb
                );
            }
        }

        let plan = Self {
            point_ranges: contiguous_ranges(points, point_batch),
            freq_ranges: contiguous_ranges(frequencies, freq_batch),
            estimate: MemoryEstimate::new(
                points,
                frequencies,
                time_points,
                point_batch,
                freq_batch,
            ),
        };
        debug!(
            "Batch plan: {:?}, point batch {}, frequency batch {}, {:.3} GB",
            plan.mode(),
            point_batch,
            freq_batch,
            plan.estimate.total_gb()
        );
        plan
    }

    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        if self.point_ranges.len() <= 1 && self.freq_ranges.len() <= 1 {
            ExecutionMode::Direct
        } else {
            ExecutionMode::Batched {
                point_batches: self.point_ranges.len(),
                freq_batches: self.freq_ranges.len(),
            }
        }
    }
}

/// Split `0..len` into contiguous ranges of at most `size`
#[must_use]
pub fn contiguous_ranges(len: usize, size: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// Shared inputs for every batch of one call
pub struct PipelineInputs<'a> {
    pub builder: &'a CrossSpectrumBuilder<'a>,
    pub frequencies: &'a [f64],
    pub synthesizer: &'a Synthesizer,
    pub phasors: &'a DMatrix<Complex64>,
}

/// Run the plan and assemble the `n x M` sample matrix
///
/// # Errors
///
/// Returns `NotPositiveDefinite` for the first frequency whose CPSD slice
/// fails to factorize; the whole call is aborted.
pub fn execute(
    plan: &BatchPlan,
    backend: &dyn SynthesisBackend,
    inputs: &PipelineInputs<'_>,
) -> Result<DMatrix<f64>, SimulationError> {
    let n = inputs.builder.dimension();
    let time_points = inputs.synthesizer.time_points();
    let mut samples = DMatrix::zeros(n, time_points);

    match plan.mode() {
        ExecutionMode::Direct => debug!("Running direct pipeline on {} backend", backend.name()),
        ExecutionMode::Batched {
            point_batches,
            freq_batches,
        } => info!(
            "Running {} point batches x {} frequency batches on {} backend",
            point_batches,
            freq_batches,
            backend.name()
        ),
    }

    for (batch_idx, rows) in plan.point_ranges.iter().enumerate() {
        debug!(
            "Point batch {}/{}: rows {}..{}",
            batch_idx + 1,
            plan.point_ranges.len(),
            rows.start,
            rows.end
        );
        let factors = factor_rows(plan, backend, inputs, rows)?;

        let series = {
            let _scope = ProfilerScope::new("synthesis");
            backend.synthesize(inputs.synthesizer, &factors, inputs.phasors)
        };
        for (j, row) in rows.clone().zip(series) {
            samples.row_mut(j).copy_from_slice(&row);
        }
    }

    Ok(samples)
}

/// Build and factorize every frequency sub-range, keeping the rows in `rows`
fn factor_rows(
    plan: &BatchPlan,
    backend: &dyn SynthesisBackend,
    inputs: &PipelineInputs<'_>,
    rows: &Range<usize>,
) -> Result<FactorRows, SimulationError> {
    let mut retained = FactorRows::with_capacity(rows.clone(), inputs.frequencies.len());

    for freqs in &plan.freq_ranges {
        let cpsd = {
            let _scope = ProfilerScope::new("cross_spectrum");
            backend.build_cross_spectra(inputs.builder, &inputs.frequencies[freqs.clone()])
        };
        let factors = {
            let _scope = ProfilerScope::new("factorization");
            backend.factorize(&cpsd).map_err(|offset| {
                let frequency_index = freqs.start + offset;
                SimulationError::NotPositiveDefinite {
                    frequency_index,
                    frequency: inputs.frequencies[frequency_index],
                    batch: rows.clone(),
                }
            })?
        };
        drop(cpsd);

        for factor in factors {
            retained.push_factor(factor);
        }
    }

    Ok(retained)
}
