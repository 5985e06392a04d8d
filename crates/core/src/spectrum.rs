//! Target one-point power spectra
//!
//! The synthesis consumes spectra through the [`SpectrumModel`] trait. The
//! built-in model is the Kaimal-type closed form driven by the logarithmic
//! friction velocity:
//!
//! ```text
//! u* = K·U_d / ln((Z - z_d) / z_0)
//! f  = n·Z / U_d
//! S_u(n) = (u*² / n) · 200f / (1 + 50f)^(5/3)
//! S_w(n) = (u*² / n) · 6f / (1 + 4f)²
//! ```
//!
//! Heights below the zero-plane displacement make the logarithm undefined;
//! the resulting NaN values are returned as-is. At exactly `z_d` the
//! logarithm is `-inf`, `u*` collapses to zero and so does the spectrum.

use crate::error::SimulationError;
use crate::params::{Component, SimulationParameters};

/// One-point power spectral density capability
///
/// Implementations read whatever constants they need from the parameter set
/// at call time, so parameter updates take effect without rebuilding the
/// model.
pub trait SpectrumModel: Send + Sync {
    /// Power spectral density at `frequency` (Hz) and `height` (m)
    fn power_spectrum(
        &self,
        params: &SimulationParameters,
        frequency: f64,
        height: f64,
        component: Component,
    ) -> f64;

    /// Power spectral density at one frequency for many heights
    fn power_spectrum_at_heights(
        &self,
        params: &SimulationParameters,
        frequency: f64,
        heights: &[f64],
        component: Component,
    ) -> Vec<f64> {
        heights
            .iter()
            .map(|&z| self.power_spectrum(params, frequency, z, component))
            .collect()
    }

    /// Short name for logging
    fn name(&self) -> &'static str;
}

/// Friction velocity `u* = K·U_d / ln((Z - z_d) / z_0)`
#[inline]
#[must_use]
pub fn friction_velocity(params: &SimulationParameters, height: f64) -> f64 {
    params.von_karman() * params.design_wind_speed()
        / ((height - params.zero_plane_displacement()) / params.roughness_length()).ln()
}

/// Dimensionless frequency `f = n·Z / U_d`
#[inline]
#[must_use]
pub fn reduced_frequency(frequency: f64, height: f64, design_wind_speed: f64) -> f64 {
    frequency * height / design_wind_speed
}

/// Kaimal-type along-wind and vertical spectra
#[derive(Debug, Clone, Copy, Default)]
pub struct KaimalSpectrum;

impl KaimalSpectrum {
    /// Along-wind spectrum from friction velocity and reduced frequency
    #[inline]
    #[must_use]
    pub fn along_wind(frequency: f64, u_star: f64, f: f64) -> f64 {
        (u_star * u_star / frequency) * (200.0 * f / (1.0 + 50.0 * f).powf(5.0 / 3.0))
    }

    /// Vertical spectrum from friction velocity and reduced frequency
    #[inline]
    #[must_use]
    pub fn vertical(frequency: f64, u_star: f64, f: f64) -> f64 {
        let denom = 1.0 + 4.0 * f;
        (u_star * u_star / frequency) * (6.0 * f / (denom * denom))
    }
}

impl SpectrumModel for KaimalSpectrum {
    fn power_spectrum(
        &self,
        params: &SimulationParameters,
        frequency: f64,
        height: f64,
        component: Component,
    ) -> f64 {
        let u_star = friction_velocity(params, height);
        let f = reduced_frequency(frequency, height, params.design_wind_speed());
        match component {
            Component::U => Self::along_wind(frequency, u_star, f),
            Component::W => Self::vertical(frequency, u_star, f),
        }
    }

    fn name(&self) -> &'static str {
        "kaimal"
    }
}

/// Registered spectrum implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpectrumKind {
    /// Kaimal-type closed form
    #[default]
    Kaimal,
}

impl SpectrumKind {
    /// Look up a spectrum by tag
    ///
    /// # Errors
    ///
    /// Returns `UnknownSpectrum` for tags that are not registered.
    pub fn from_tag(tag: &str) -> Result<Self, SimulationError> {
        match tag.to_ascii_lowercase().as_str() {
            "kaimal" => Ok(Self::Kaimal),
            _ => Err(SimulationError::UnknownSpectrum(tag.to_string())),
        }
    }

    /// Instantiate the model behind this tag
    #[must_use]
    pub fn create(self) -> Box<dyn SpectrumModel> {
        match self {
            Self::Kaimal => Box::new(KaimalSpectrum),
        }
    }
}
