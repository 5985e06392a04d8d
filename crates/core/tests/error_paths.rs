//! Failures surfaced through `simulate`

mod common;

use approx::assert_relative_eq;
use common::{small_simulator, tower};
use std::ops::Range;
use wind_sim_core::{
    BackendKind, BatchConfig, Component, KaimalSpectrum, SimulationError, SimulationParameters,
    SpectrumModel, Stage,
};

/// Kaimal below 1 Hz, negative (non-physical) above
struct NegativeAboveOneHertz;

impl SpectrumModel for NegativeAboveOneHertz {
    fn power_spectrum(
        &self,
        params: &SimulationParameters,
        frequency: f64,
        height: f64,
        component: Component,
    ) -> f64 {
        if frequency > 1.0 {
            -1.0
        } else {
            KaimalSpectrum.power_spectrum(params, frequency, height, component)
        }
    }

    fn name(&self) -> &'static str {
        "negative-above-1hz"
    }
}

fn assert_not_positive_definite(
    err: &SimulationError,
    expected_index: usize,
    expected_frequency: f64,
    expected_batch: &Range<usize>,
) {
    assert_eq!(err.stage(), Stage::Factorization);
    match err {
        SimulationError::NotPositiveDefinite {
            frequency_index,
            frequency,
            batch,
        } => {
            assert_eq!(*frequency_index, expected_index);
            assert_relative_eq!(*frequency, expected_frequency, max_relative = 1e-12);
            assert_eq!(batch, expected_batch);
        }
        other => panic!("expected NotPositiveDefinite, got {other:?}"),
    }
}

#[test]
fn test_indefinite_slice_reports_global_frequency_and_batch() {
    // w_up = 2 Hz over 100 segments: index 50 sits at 1.01 Hz, the first above 1 Hz
    let config = BatchConfig {
        point_batch_size: Some(2),
        freq_batch_size: Some(7),
        ..Default::default()
    };
    let (positions, speeds) = tower(5);

    for backend in [BackendKind::Sequential, BackendKind::Parallel] {
        let mut sim = small_simulator(4, backend, 100)
            .with_spectrum(Box::new(NegativeAboveOneHertz))
            .with_batch_config(config);
        let err = sim
            .simulate(&positions, &speeds, Component::U)
            .unwrap_err();
        assert_not_positive_definite(&err, 50, 1.01, &(0..2));
        assert!(err.to_string().contains("frequency 50"), "{err}");
    }
}

#[test]
fn test_indefinite_slice_aborts_direct_run() {
    let (positions, speeds) = tower(3);

    for backend in [BackendKind::Sequential, BackendKind::Parallel] {
        let mut sim =
            small_simulator(4, backend, 100).with_spectrum(Box::new(NegativeAboveOneHertz));
        let err = sim
            .simulate(&positions, &speeds, Component::W)
            .unwrap_err();
        assert_not_positive_definite(&err, 50, 1.01, &(0..3));
        // The failed call still consumed its seed
        assert_eq!(sim.seed(), 5);
    }
}

#[test]
fn test_spectrum_below_failure_band_succeeds() {
    // Cutoff at 1 Hz keeps every frequency on the Kaimal branch
    let mut sim = small_simulator(4, BackendKind::Parallel, 100)
        .with_spectrum(Box::new(NegativeAboveOneHertz));
    sim.update_parameters(&wind_sim_core::ParameterUpdate {
        cutoff_frequency: Some(1.0),
        ..Default::default()
    });
    let (positions, speeds) = tower(3);
    let field = sim.simulate(&positions, &speeds, Component::U).unwrap();
    assert!(field.samples.iter().all(|v| v.is_finite()));
}
