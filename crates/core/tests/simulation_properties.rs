//! End-to-end properties of the synthesized wind field

mod common;

use approx::assert_relative_eq;
use common::{small_simulator, tower};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f64::consts::PI;
use wind_sim_core::diagnostics::correlation;
use wind_sim_core::phase::draw_phases;
use wind_sim_core::{
    BackendKind, CoherenceModel, Component, KaimalSpectrum, ParameterUpdate, SimulationError,
    SimulationParameters, SpectrumModel, Stage, WindSimulator,
};

#[test]
fn test_parameter_updates_keep_derived_values_consistent() {
    let mut sim = WindSimulator::with_backend(0, BackendKind::Sequential);
    let updates = [
        ParameterUpdate::from_named([("w_up", 3.0)]),
        ParameterUpdate::from_named([("N", 500.0), ("H_bar", 15.0)]),
        ParameterUpdate::from_named([("z_0", 0.3), ("K", 0.41), ("unused", 9.0)]),
    ];
    for update in &updates {
        sim.update_parameters(update);
        let p = sim.params();
        assert_relative_eq!(
            p.frequency_step(),
            p.cutoff_frequency() / p.frequency_count() as f64
        );
        assert_relative_eq!(
            p.zero_plane_displacement(),
            p.obstruction_height() - p.roughness_length() / p.von_karman()
        );
        assert_eq!(p.time_point_count(), 2 * p.frequency_count());
    }
}

#[test]
fn test_frequency_grid() {
    let sim = small_simulator(0, BackendKind::Sequential, 100);
    let dw = sim.params().frequency_step();
    let freqs = sim.frequencies();
    assert_eq!(freqs.len(), 100);
    assert_relative_eq!(freqs[0], 0.5 * dw);
    assert_relative_eq!(freqs[99], 99.5 * dw, max_relative = 1e-12);
    assert!(freqs.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn test_output_shape_for_various_point_counts() {
    for n in [1, 2, 5, 9] {
        let mut sim = small_simulator(3, BackendKind::Parallel, 64);
        let (positions, speeds) = tower(n);
        let field = sim.simulate(&positions, &speeds, Component::U).unwrap();
        assert_eq!(field.samples.shape(), (n, 128));
        assert_eq!(field.frequencies.len(), 64);
        assert!(field.samples.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_single_point_matches_one_dimensional_formula() {
    let n_freq = 64;
    let sim = small_simulator(0, BackendKind::Sequential, n_freq);
    let params = sim.params().clone();
    let height = 25.0;
    let field = sim
        .simulate_with_rng(
            &[[0.0, 0.0, height]],
            &[26.0],
            Component::U,
            &mut StdRng::seed_from_u64(77),
        )
        .unwrap();

    let phases = draw_phases(1, n_freq, &mut StdRng::seed_from_u64(77));
    let dw = params.frequency_step();
    let m = params.time_point_count();
    let freqs = params.frequencies();
    let amplitudes: Vec<f64> = freqs
        .iter()
        .map(|&w| (KaimalSpectrum.power_spectrum(&params, w, height, Component::U) + 1e-12).sqrt())
        .collect();

    for p in [0, 1, 17, 64, 127] {
        let expected = (2.0 * dw).sqrt()
            * (0..n_freq)
                .map(|l| {
                    let theta = 2.0 * PI * (l as f64 + 0.5) * p as f64 / m as f64;
                    amplitudes[l] * (theta + phases[(0, l)]).cos()
                })
                .sum::<f64>();
        assert_relative_eq!(field.samples[(0, p)], expected, epsilon = 1e-9, max_relative = 1e-9);
    }
}

#[test]
fn test_first_point_variance_equals_spectrum_area() {
    let n_freq = 256;
    let mut sim = small_simulator(21, BackendKind::Parallel, n_freq);
    let (positions, speeds) = tower(3);
    let field = sim.simulate(&positions, &speeds, Component::W).unwrap();

    // Point 0 only sees its own diagonal factor entry, so its mean square
    // over one period is exactly dw·Σ(S + ε)
    let params = sim.params();
    let area: f64 = params
        .frequencies()
        .iter()
        .map(|&w| KaimalSpectrum.power_spectrum(params, w, positions[0][2], Component::W) + 1e-12)
        .sum::<f64>()
        * params.frequency_step();
    let series = field.series(0);
    let mean_square = series.iter().map(|v| v * v).sum::<f64>() / series.len() as f64;
    assert_relative_eq!(mean_square, area, max_relative = 1e-9);
}

#[test]
fn test_coincident_points_reference_scenario() {
    let mut sim = WindSimulator::new(0);
    let params = sim.params().clone();
    assert_eq!(params.frequency_count(), 3000);
    assert_eq!(params.time_point_count(), 6000);

    let positions = [[0.0, 0.0, 10.0], [0.0, 0.0, 10.0]];
    let speeds = [25.0, 25.0];

    let coherence = CoherenceModel::from_params(&params);
    for w in params.frequencies() {
        let c = coherence.coherence(&positions[0], &positions[1], w, speeds[0], speeds[1]);
        assert_relative_eq!(c, 1.0);
    }

    let field = sim.simulate(&positions, &speeds, Component::U).unwrap();
    assert_eq!(field.samples.shape(), (2, 6000));
    let r = correlation(&field.series(0), &field.series(1));
    assert!(r > 0.9999, "coincident points should be fully correlated, got {r}");
}

#[test]
fn test_separated_points_are_partially_correlated() {
    let mut sim = small_simulator(8, BackendKind::Parallel, 1024);
    let near = sim
        .simulate(&[[0.0, 0.0, 20.0], [0.0, 1.0, 20.0]], &[25.0, 25.0], Component::U)
        .unwrap();
    let far = sim
        .simulate(&[[0.0, 0.0, 20.0], [0.0, 400.0, 20.0]], &[25.0, 25.0], Component::U)
        .unwrap();
    let r_near = correlation(&near.series(0), &near.series(1));
    let r_far = correlation(&far.series(0), &far.series(1));
    assert!(r_near > 0.5, "near pair correlation {r_near}");
    assert!(r_far.abs() < r_near, "far {r_far} vs near {r_near}");
}

#[test]
fn test_reproducible_with_fixed_seed() {
    let (positions, speeds) = tower(4);
    let mut a = small_simulator(1234, BackendKind::Parallel, 128);
    let mut b = small_simulator(1234, BackendKind::Parallel, 128);
    for _ in 0..2 {
        let fa = a.simulate(&positions, &speeds, Component::U).unwrap();
        let fb = b.simulate(&positions, &speeds, Component::U).unwrap();
        assert_eq!(fa.samples, fb.samples);
    }
}

#[test]
fn test_points_below_zero_plane_produce_nan() {
    let mut sim = small_simulator(0, BackendKind::Sequential, 32);
    // z_d = 9.875 with the default parameters
    let field = sim
        .simulate(&[[0.0, 0.0, 20.0], [0.0, 0.0, 5.0]], &[25.0, 20.0], Component::U)
        .unwrap();
    assert!(field.series(0).iter().all(|v| v.is_finite()));
    assert!(field.series(1).iter().all(|v| v.is_nan()));
}

#[test]
fn test_point_at_zero_plane_stays_finite() {
    let mut sim = small_simulator(0, BackendKind::Sequential, 32);
    let z_d = sim.params().zero_plane_displacement();
    // ln(0) drives u* to zero, so the target spectrum vanishes instead of going NaN
    let spectra = sim.target_spectra(&[z_d], Component::U);
    assert!(spectra.iter().all(|s| *s == 0.0));

    let field = sim
        .simulate(&[[0.0, 0.0, z_d], [0.0, 0.0, 20.0]], &[20.0, 25.0], Component::U)
        .unwrap();
    assert!(field.samples.iter().all(|v| v.is_finite()));
}

#[test]
fn test_configuration_errors() {
    assert_eq!(
        "x".parse::<Component>().unwrap_err().stage(),
        Stage::Configuration
    );

    let mut sim = small_simulator(0, BackendKind::Sequential, 32);
    assert_eq!(
        sim.simulate(&[], &[], Component::U).unwrap_err(),
        SimulationError::EmptyPointSet
    );

    sim.update_parameters(&ParameterUpdate {
        cutoff_frequency: Some(0.0),
        ..Default::default()
    });
    assert!(matches!(
        sim.simulate(&[[0.0, 0.0, 20.0]], &[25.0], Component::U),
        Err(SimulationError::InvalidParameters(_))
    ));
}

#[test]
fn test_parameters_from_partial_update() {
    // Missing fields come from the defaults; derived values are recomputed
    let update = ParameterUpdate {
        frequency_count: Some(10),
        ..Default::default()
    };
    let params = SimulationParameters::from(update);
    assert_eq!(params.frequency_count(), 10);
    assert_eq!(params.time_point_count(), 20);
    assert_relative_eq!(params.frequency_step(), 0.5);
}
