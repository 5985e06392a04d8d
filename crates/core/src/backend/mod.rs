//! Execution strategies for the synthesis pipeline
//!
//! Both strategies implement the `SynthesisBackend` trait and run the same
//! per-frequency and per-point kernels, so they produce the same samples for
//! the same inputs and phases.
//!
//! - `SequentialBackend`: plain loops, the reference implementation.
//! - `ParallelBackend`: Rayon parallel iterators over frequencies (CPSD
//!   construction, factorization) and output rows (synthesis).
//!
//! # Example
//!
//! ```rust,ignore
//! use wind_sim_core::backend::{create_backend, BackendKind};
//!
//! let backend = create_backend(BackendKind::Parallel);
//! assert!(backend.is_parallel());
//! ```

mod parallel;
mod sequential;
#[allow(clippy::module_name_repetitions)]
mod r#trait;

pub use parallel::ParallelBackend;
pub use r#trait::SynthesisBackend;
pub use sequential::SequentialBackend;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Available execution strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// Single-threaded loops
    Sequential,
    /// Data-parallel over frequencies and points
    #[default]
    Parallel,
}

/// Create a backend for the requested strategy
///
/// # Returns
///
/// A boxed `SynthesisBackend` trait object
pub fn create_backend(kind: BackendKind) -> Box<dyn SynthesisBackend> {
    match kind {
        BackendKind::Sequential => {
            info!("Using sequential synthesis backend");
            Box::new(SequentialBackend)
        }
        BackendKind::Parallel => {
            info!(
                "Using parallel synthesis backend ({} threads)",
                rayon::current_num_threads()
            );
            Box::new(ParallelBackend)
        }
    }
}
