// kestrel_sim/src/scenario.rs

use std::f64::consts::PI;

use kestrel_core::models::imu::{index, ImuDynamicalSystem, IMU_STATE_SIZE};
use kestrel_core::models::DynamicalSystem;
use kestrel_core::time_array::DiscreteTimeArray;
use kestrel_core::types::{InputVector, Matrix, StateVector, VectorKind};
use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::ScenarioConfig;
use crate::error::SimResult;
use crate::noise::GaussianWhiteNoise;
use crate::reconstruction::imu_attitude_trajectory_reconstruction;
use crate::simulator::DynamicalSystemSimulator;

/// Everything a scenario run produces.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    /// The seed every random draw of the run was derived from.
    pub seed: u64,
    /// Simulated ground truth, `1 ..= samples`.
    pub states: DiscreteTimeArray,
    /// Reconstructed states, `1 ..= samples`.
    pub estimates: DiscreteTimeArray,
}

/// The excitation applied during block `i` of the input profile. Linear and
/// angular acceleration increments oscillate at different periods so every
/// axis gets excited.
pub fn input_profile(i: u64) -> InputVector {
    let i = i as f64;
    DVector::from_vec(vec![
        0.4 * (PI / 10.0 * i).sin(),
        0.6 * (PI / 12.0 * i).sin(),
        0.2 * (PI / 5.0 * i).sin(),
        10.0 * (PI / 12.0 * i).sin(),
        0.07 * (PI / 15.0 * i).sin(),
        0.05 * (PI / 5.0 * i).sin(),
    ])
}

/// Simulates a noisy IMU trajectory, then reconstructs it from the noisy
/// measurements with a randomly initialised EKF.
pub fn run_scenario(config: &ScenarioConfig) -> SimResult<ScenarioOutcome> {
    config.validate()?;

    let seed = config
        .simulation
        .seed
        .unwrap_or_else(|| ChaCha8Rng::from_entropy().gen());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let samples = config.simulation.samples;
    let hold = config.simulation.input_hold;
    let dt = config.simulation.dt;
    info!(seed, samples, dt, "running IMU attitude scenario");

    // --- 1. Simulate the ground truth ---
    let imu = ImuDynamicalSystem::new(dt);
    let process_noise = GaussianWhiteNoise::isotropic(
        imu.state_size(),
        config.noise.process_std,
        rng.gen(),
    );
    let measurement_noise = GaussianWhiteNoise::isotropic(
        imu.measurement_size(),
        config.noise.measurement_std,
        rng.gen(),
    );
    let q = process_noise.covariance();
    let r = measurement_noise.covariance();

    let mut sim = DynamicalSystemSimulator::new(imu);
    sim.set_process_noise(Box::new(process_noise));
    sim.set_measurement_noise(Box::new(measurement_noise));
    sim.set_state(DVector::zeros(IMU_STATE_SIZE), 0)?;

    // The simulator needs the input up to `samples`; the estimator up to `samples - 1`.
    let mut u = DiscreteTimeArray::new(VectorKind::Input);
    for block in 0..=samples / hold {
        let u_block = input_profile(block);
        let start = block * hold;
        for k in start..(start + hold).min(samples) {
            u.push_back(u_block.clone(), k)?;
        }
        sim.set_input(u_block, start)?;
    }

    sim.simulate_dynamics_to(samples + 1)?;
    let y = sim.get_measurement_array(1, samples)?;
    let states = sim.get_state_array(1, samples)?;
    debug!(measurements = y.len(), inputs = u.len(), "simulation finished");

    // --- 2. Reconstruct from a random initial guess ---
    let xh0 = initial_guess(config, &mut rng);
    let p = initial_covariance(&xh0);

    let estimates = imu_attitude_trajectory_reconstruction(&y, &u, xh0, p, q, r, dt)?;

    Ok(ScenarioOutcome {
        seed,
        states,
        estimates,
    })
}

/// Each component uniform in `[-spread, spread]`, with the optional override
/// on the first orientation component.
fn initial_guess(config: &ScenarioConfig, rng: &mut impl Rng) -> StateVector {
    let spread = config.estimator.initial_spread;
    let mut xh0 = DVector::from_fn(IMU_STATE_SIZE, |_, _| rng.gen_range(-1.0..=1.0) * spread);
    if let Some(x) = config.estimator.initial_orientation_x {
        xh0[index::ORIENTATION] = x;
    }
    xh0
}

/// `P0 = diag(xh0)²`: the further a component is from zero, the less it is trusted.
fn initial_covariance(xh0: &StateVector) -> Matrix {
    let d = DMatrix::from_diagonal(xh0);
    &d * d.transpose()
}
