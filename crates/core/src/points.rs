//! Simulation point set
//!
//! Ordered positions with their mean wind speeds. Output rows follow the
//! input order.

use crate::error::SimulationError;
use serde::{Deserialize, Serialize};

/// Positions `(x, y, z)` in meters and matching mean wind speeds in m/s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    positions: Vec<[f64; 3]>,
    wind_speeds: Vec<f64>,
}

impl PointSet {
    /// Pair positions with wind speeds
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the lengths differ and `EmptyPointSet` if
    /// there are no points.
    pub fn new(positions: Vec<[f64; 3]>, wind_speeds: Vec<f64>) -> Result<Self, SimulationError> {
        if positions.len() != wind_speeds.len() {
            return Err(SimulationError::ShapeMismatch {
                positions: positions.len(),
                wind_speeds: wind_speeds.len(),
            });
        }
        if positions.is_empty() {
            return Err(SimulationError::EmptyPointSet);
        }
        Ok(Self {
            positions,
            wind_speeds,
        })
    }

    /// Number of points
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false for a constructed set; present for API symmetry
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    #[must_use]
    pub fn wind_speeds(&self) -> &[f64] {
        &self.wind_speeds
    }

    /// Point heights `z`
    #[must_use]
    pub fn heights(&self) -> Vec<f64> {
        self.positions.iter().map(|p| p[2]).collect()
    }
}
