//! Shared setup for integration tests

#![allow(dead_code)]

use tracing_subscriber::EnvFilter;
use wind_sim_core::{BackendKind, ParameterUpdate, WindSimulator};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Simulator with a reduced frequency grid so tests stay fast
pub fn small_simulator(seed: u64, backend: BackendKind, frequencies: usize) -> WindSimulator {
    let mut sim = WindSimulator::with_backend(seed, backend);
    sim.update_parameters(&ParameterUpdate {
        frequency_count: Some(frequencies),
        cutoff_frequency: Some(2.0),
        ..Default::default()
    });
    sim
}

/// Points along a line at increasing height, with power-law mean speeds
pub fn tower(points: usize) -> (Vec<[f64; 3]>, Vec<f64>) {
    let params = wind_sim_core::SimulationParameters::default();
    let positions: Vec<[f64; 3]> = (0..points)
        .map(|i| [2.0 * i as f64, 0.5 * i as f64, 15.0 + 5.0 * i as f64])
        .collect();
    let speeds = positions.iter().map(|p| params.mean_wind_speed(p[2])).collect();
    (positions, speeds)
}
