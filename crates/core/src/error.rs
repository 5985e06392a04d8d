//! Error types for the wind synthesis pipeline
//!
//! Every failure is terminal for the `simulate` call that raised it. Nothing in
//! the pipeline retries; errors propagate straight to the caller with enough
//! context to tell which stage failed and, for factorization, which frequency
//! and point batch.

use std::ops::Range;

/// Pipeline stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Input validation and configuration lookup
    Configuration,
    /// Cholesky factorization of the CPSD matrices
    Factorization,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::Factorization => "factorization",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while synthesizing a wind field
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Component tag was neither `u` nor `w`
    InvalidComponent(String),
    /// Spectrum tag is not registered
    UnknownSpectrum(String),
    /// Point selection is empty or refers to points outside `0..n`
    InvalidIndices {
        /// Offending selection, rendered for the message
        selection: String,
        /// Number of points available, if the selection got that far
        point_count: Option<usize>,
    },
    /// Positions and wind speeds have different lengths
    ShapeMismatch {
        /// Number of positions supplied
        positions: usize,
        /// Number of wind speeds supplied
        wind_speeds: usize,
    },
    /// No points were supplied
    EmptyPointSet,
    /// Parameters cannot produce a frequency grid
    InvalidParameters(String),
    /// Regularized CPSD slice was not positive definite
    NotPositiveDefinite {
        /// Index into the frequency grid
        frequency_index: usize,
        /// Frequency value (Hz)
        frequency: f64,
        /// Output rows being computed when the failure happened
        batch: Range<usize>,
    },
}

impl SimulationError {
    /// Stage that raised this error
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            SimulationError::InvalidComponent(_)
            | SimulationError::UnknownSpectrum(_)
            | SimulationError::InvalidIndices { .. }
            | SimulationError::ShapeMismatch { .. }
            | SimulationError::EmptyPointSet
            | SimulationError::InvalidParameters(_) => Stage::Configuration,
            SimulationError::NotPositiveDefinite { .. } => Stage::Factorization,
        }
    }
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::InvalidComponent(tag) => {
                write!(f, "Invalid wind component '{tag}': expected 'u' or 'w'")
            }
            SimulationError::UnknownSpectrum(tag) => write!(f, "Unknown spectrum '{tag}'"),
            SimulationError::InvalidIndices {
                selection,
                point_count: Some(count),
            } => write!(f, "Invalid point selection {selection} for {count} points"),
            SimulationError::InvalidIndices {
                selection,
                point_count: None,
            } => write!(
                f,
                "Invalid point selection {selection}: expected one index or a pair"
            ),
            SimulationError::ShapeMismatch {
                positions,
                wind_speeds,
            } => write!(
                f,
                "Got {positions} positions but {wind_speeds} wind speeds"
            ),
            SimulationError::EmptyPointSet => write!(f, "At least one point is required"),
            SimulationError::InvalidParameters(msg) => write!(f, "Invalid parameters: {msg}"),
            SimulationError::NotPositiveDefinite {
                frequency_index,
                frequency,
                batch,
            } => write!(
                f,
                "{} failed: CPSD matrix at frequency {frequency_index} ({frequency:.6} Hz) is not \
                 positive definite after regularization (points {}..{})",
                self.stage(),
                batch.start,
                batch.end
            ),
        }
    }
}

impl std::error::Error for SimulationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_classification() {
        let configuration = [
            SimulationError::InvalidComponent("v".into()),
            SimulationError::UnknownSpectrum("karman".into()),
            SimulationError::InvalidIndices {
                selection: "[]".into(),
                point_count: None,
            },
            SimulationError::ShapeMismatch {
                positions: 1,
                wind_speeds: 2,
            },
            SimulationError::EmptyPointSet,
            SimulationError::InvalidParameters("N".into()),
        ];
        for err in &configuration {
            assert_eq!(err.stage(), Stage::Configuration, "{err}");
        }
        let err = SimulationError::NotPositiveDefinite {
            frequency_index: 3,
            frequency: 0.5,
            batch: 0..4,
        };
        assert_eq!(err.stage(), Stage::Factorization);
    }

    #[test]
    fn test_display_names_frequency_and_batch() {
        let err = SimulationError::NotPositiveDefinite {
            frequency_index: 7,
            frequency: 0.0125,
            batch: 10..20,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("factorization failed"), "{msg}");
        assert!(msg.contains("frequency 7"), "{msg}");
        assert!(msg.contains("points 10..20"), "{msg}");
    }

    #[test]
    fn test_display_index_selection() {
        let shape = SimulationError::InvalidIndices {
            selection: "[1, 2, 3]".into(),
            point_count: None,
        };
        assert_eq!(
            shape.to_string(),
            "Invalid point selection [1, 2, 3]: expected one index or a pair"
        );
        let range = SimulationError::InvalidIndices {
            selection: "Single(4)".into(),
            point_count: Some(3),
        };
        assert_eq!(range.to_string(), "Invalid point selection Single(4) for 3 points");
    }
}
