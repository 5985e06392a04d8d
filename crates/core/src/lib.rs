//! Stochastic Wind Field Simulation Core Library
//!
//! Synthesizes spatially correlated turbulent wind velocity series at a set of
//! 3D points using the spectral representation method (Shinozuka-Deodatis).
//!
//! ## Pipeline
//!
//! - Midpoint frequency grid `(k + 0.5)·dw` up to the cutoff frequency
//! - Cross-power-spectral-density matrix per frequency from a Kaimal-type
//!   target spectrum and Davenport-type exponential coherence
//! - Regularized Cholesky factorization of every CPSD matrix
//! - Uniform random phases combined with the factors, inverse FFT and
//!   half-bin shift to produce the time series
//! - Memory-aware batching over points and frequencies
//!
//! Two interchangeable backends (sequential loops and Rayon data-parallel)
//! implement the heavy stages with identical numerics.
//!
//! ```rust,ignore
//! use wind_sim_core::{Component, WindSimulator};
//!
//! let mut sim = WindSimulator::new(42);
//! let positions = [[0.0, 0.0, 20.0], [5.0, 0.0, 20.0]];
//! let field = sim.simulate(&positions, &[25.0, 25.0], Component::U)?;
//! assert_eq!(field.samples.nrows(), 2);
//! ```

pub mod backend;
pub mod batch;
pub mod coherence;
pub mod cross_spectrum;
pub mod diagnostics;
pub mod error;
pub mod factorize;
pub mod params;
pub mod phase;
pub mod points;
pub mod profiler;
pub mod spectrum;
pub mod synthesis;
pub mod simulator;

// Re-export the main entry points
pub use backend::{create_backend, BackendKind, SynthesisBackend};
pub use batch::{BatchConfig, BatchPlan, ExecutionMode, MemoryEstimate};
pub use coherence::CoherenceModel;
pub use cross_spectrum::CrossSpectrumBuilder;
pub use error::{SimulationError, Stage};
pub use params::{Component, ParameterUpdate, SimulationParameters};
pub use points::PointSet;
pub use simulator::{WindField, WindSimulator};
pub use spectrum::{KaimalSpectrum, SpectrumKind, SpectrumModel};
