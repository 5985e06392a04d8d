//! Simulation parameters and wind component selection
//!
//! `SimulationParameters` holds the physical and numerical constants of the
//! spectral representation method. The frequency step `dw`, the zero-plane
//! displacement `z_d` and the time-point count `M` are derived values: they are
//! recomputed on every update and cannot be set directly, so no update can
//! leave them stale.

use crate::error::SimulationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// Numerical constants shared by the pipeline stages
pub mod constants {
    /// Diagonal regularization added before Cholesky factorization
    pub const CHOLESKY_REGULARIZATION: f64 = 1e-12;

    /// Floor on the coherence denominator `2π(U_i + U_j)`
    pub const COHERENCE_DENOMINATOR_FLOOR: f64 = 1e-8;

    /// Reference height for the power-law mean wind profile (m)
    pub const REFERENCE_HEIGHT: f64 = 10.0;
}

/// Fluctuating wind component to synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    /// Along-wind (longitudinal) fluctuations
    #[serde(rename = "u")]
    U,
    /// Vertical fluctuations
    #[serde(rename = "w")]
    W,
}

impl Component {
    /// Single-letter tag used in configuration
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::U => "u",
            Self::W => "w",
        }
    }
}

impl FromStr for Component {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u" => Ok(Self::U),
            "w" => Ok(Self::W),
            other => Err(SimulationError::InvalidComponent(other.to_string())),
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Physical and numerical constants for one simulator instance
///
/// Serialized field names follow the conventional symbols (`K`, `H_bar`,
/// `z_0`, ...). Deserialization goes through [`ParameterUpdate`], so a partial
/// document fills the remaining fields from the defaults and the derived
/// values are always consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ParameterUpdate")]
pub struct SimulationParameters {
    #[serde(rename = "K")]
    von_karman: f64,
    #[serde(rename = "H_bar")]
    obstruction_height: f64,
    #[serde(rename = "z_0")]
    roughness_length: f64,
    #[serde(rename = "alpha")]
    roughness_exponent: f64,
    #[serde(rename = "C_x")]
    decay_x: f64,
    #[serde(rename = "C_y")]
    decay_y: f64,
    #[serde(rename = "C_z")]
    decay_z: f64,
    #[serde(rename = "w_up")]
    cutoff_frequency: f64,
    #[serde(rename = "N")]
    frequency_count: usize,
    #[serde(rename = "M")]
    time_point_count: usize,
    #[serde(rename = "T")]
    duration: f64,
    #[serde(rename = "dt")]
    time_step: f64,
    #[serde(rename = "U_d")]
    design_wind_speed: f64,
    #[serde(rename = "dw")]
    frequency_step: f64,
    #[serde(rename = "z_d")]
    zero_plane_displacement: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        let mut params = Self {
            von_karman: 0.4,
            obstruction_height: 10.0, // Mean height of surrounding buildings (m)
            roughness_length: 0.05,
            roughness_exponent: 0.16,
            decay_x: 16.0,
            decay_y: 6.0,
            decay_z: 10.0,
            cutoff_frequency: 5.0, // Hz
            frequency_count: 3000,
            time_point_count: 6000,
            duration: 600.0, // s
            time_step: 0.1,  // s
            design_wind_speed: 25.0, // m/s
            frequency_step: 0.0,
            zero_plane_displacement: 0.0,
        };
        params.derive();
        params
    }
}

impl SimulationParameters {
    /// Apply a set of overrides, then re-derive `dw`, `z_d` and `M`
    ///
    /// `M` always ends up equal to `2N`. An explicit `M` override that
    /// disagrees is replaced and logged.
    pub fn update(&mut self, overrides: &ParameterUpdate) {
        macro_rules! apply {
            ($($field:ident),*) => {
                $(if let Some(value) = overrides.$field {
                    self.$field = value;
                })*
            };
        }
        apply!(
            von_karman,
            obstruction_height,
            roughness_length,
            roughness_exponent,
            decay_x,
            decay_y,
            decay_z,
            cutoff_frequency,
            frequency_count,
            duration,
            time_step,
            design_wind_speed
        );

        self.derive();

        if let Some(m) = overrides.time_point_count {
            if m != self.time_point_count {
                warn!(
                    "Ignoring M = {} override: time-point count is fixed at 2N = {}",
                    m, self.time_point_count
                );
            }
        }
    }

    fn derive(&mut self) {
        self.frequency_step = self.cutoff_frequency / self.frequency_count as f64;
        self.zero_plane_displacement =
            self.obstruction_height - self.roughness_length / self.von_karman;
        self.time_point_count = 2 * self.frequency_count;
    }

    /// Check that the parameters describe a usable frequency grid
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` if `N` is zero or `w_up` is not a positive
    /// finite number.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.frequency_count == 0 {
            return Err(SimulationError::InvalidParameters(
                "frequency segment count N must be at least 1".to_string(),
            ));
        }
        if !(self.cutoff_frequency.is_finite() && self.cutoff_frequency > 0.0) {
            return Err(SimulationError::InvalidParameters(format!(
                "cutoff frequency w_up must be positive, got {}",
                self.cutoff_frequency
            )));
        }
        Ok(())
    }

    /// Midpoint frequency grid `(k + 0.5)·dw` for `k = 0..N`
    #[must_use]
    pub fn frequencies(&self) -> Vec<f64> {
        let dw = self.frequency_step;
        (0..self.frequency_count)
            .map(|k| (k as f64 + 0.5) * dw)
            .collect()
    }

    /// Power-law mean wind speed `U_d·(z / 10)^alpha` at height `z`
    ///
    /// Convenience for building the per-point mean speeds that `simulate`
    /// expects; the synthesis itself never calls it.
    #[must_use]
    pub fn mean_wind_speed(&self, z: f64) -> f64 {
        self.design_wind_speed * (z / constants::REFERENCE_HEIGHT).powf(self.roughness_exponent)
    }

    /// Von Kármán constant `K`
    #[must_use]
    pub fn von_karman(&self) -> f64 {
        self.von_karman
    }

    /// Mean obstruction height `H_bar` (m)
    #[must_use]
    pub fn obstruction_height(&self) -> f64 {
        self.obstruction_height
    }

    /// Surface roughness length `z_0` (m)
    #[must_use]
    pub fn roughness_length(&self) -> f64 {
        self.roughness_length
    }

    /// Mean-profile roughness exponent `alpha`
    #[must_use]
    pub fn roughness_exponent(&self) -> f64 {
        self.roughness_exponent
    }

    /// Coherence decay coefficients `[C_x, C_y, C_z]`
    #[must_use]
    pub fn decay_coefficients(&self) -> [f64; 3] {
        [self.decay_x, self.decay_y, self.decay_z]
    }

    /// Cutoff frequency `w_up` (Hz)
    #[must_use]
    pub fn cutoff_frequency(&self) -> f64 {
        self.cutoff_frequency
    }

    /// Frequency segment count `N`
    #[must_use]
    pub fn frequency_count(&self) -> usize {
        self.frequency_count
    }

    /// Time-point count `M` (always `2N`)
    #[must_use]
    pub fn time_point_count(&self) -> usize {
        self.time_point_count
    }

    /// Nominal duration `T` (s). Advisory only; samples span `M·dt`.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Time step `dt` (s)
    #[must_use]
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Design wind speed `U_d` (m/s)
    #[must_use]
    pub fn design_wind_speed(&self) -> f64 {
        self.design_wind_speed
    }

    /// Frequency increment `dw = w_up / N`
    #[must_use]
    pub fn frequency_step(&self) -> f64 {
        self.frequency_step
    }

    /// Zero-plane displacement `z_d = H_bar - z_0 / K` (m)
    #[must_use]
    pub fn zero_plane_displacement(&self) -> f64 {
        self.zero_plane_displacement
    }
}

/// Partial set of parameter overrides
///
/// Every field is optional; `None` leaves the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterUpdate {
    #[serde(rename = "K")]
    pub von_karman: Option<f64>,
    #[serde(rename = "H_bar")]
    pub obstruction_height: Option<f64>,
    #[serde(rename = "z_0")]
    pub roughness_length: Option<f64>,
    #[serde(rename = "alpha")]
    pub roughness_exponent: Option<f64>,
    #[serde(rename = "C_x")]
    pub decay_x: Option<f64>,
    #[serde(rename = "C_y")]
    pub decay_y: Option<f64>,
    #[serde(rename = "C_z")]
    pub decay_z: Option<f64>,
    #[serde(rename = "w_up")]
    pub cutoff_frequency: Option<f64>,
    #[serde(rename = "N")]
    pub frequency_count: Option<usize>,
    #[serde(rename = "M")]
    pub time_point_count: Option<usize>,
    #[serde(rename = "T")]
    pub duration: Option<f64>,
    #[serde(rename = "dt")]
    pub time_step: Option<f64>,
    #[serde(rename = "U_d")]
    pub design_wind_speed: Option<f64>,
}

impl ParameterUpdate {
    /// Build an update from `(symbol, value)` pairs
    ///
    /// Recognised symbols are `K`, `H_bar`, `z_0`, `alpha`, `C_x`, `C_y`,
    /// `C_z`, `w_up`, `N`, `M`, `T`, `dt` and `U_d`. Anything else is skipped.
    /// Counts (`N`, `M`) are rounded to the nearest integer.
    pub fn from_named<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut update = Self::default();
        for (name, value) in pairs {
            match name {
                "K" => update.von_karman = Some(value),
                "H_bar" => update.obstruction_height = Some(value),
                "z_0" => update.roughness_length = Some(value),
                "alpha" => update.roughness_exponent = Some(value),
                "C_x" => update.decay_x = Some(value),
                "C_y" => update.decay_y = Some(value),
                "C_z" => update.decay_z = Some(value),
                "w_up" => update.cutoff_frequency = Some(value),
                "N" => update.frequency_count = Some(value.round().max(0.0) as usize),
                "M" => update.time_point_count = Some(value.round().max(0.0) as usize),
                "T" => update.duration = Some(value),
                "dt" => update.time_step = Some(value),
                "U_d" => update.design_wind_speed = Some(value),
                other => debug!("Ignoring unknown parameter '{}'", other),
            }
        }
        update
    }
}

impl From<ParameterUpdate> for SimulationParameters {
    fn from(update: ParameterUpdate) -> Self {
        let mut params = Self::default();
        params.update(&update);
        params
    }
}
