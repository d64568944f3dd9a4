// kestrel_sim/src/reconstruction.rs

use kestrel_core::estimation::ExtendedKalmanFilter;
use kestrel_core::models::imu::ImuDynamicalSystem;
use kestrel_core::models::DynamicalSystem;
use kestrel_core::observer::ZeroDelayObserver;
use kestrel_core::time_array::DiscreteTimeArray;
use kestrel_core::types::{Matrix, StateVector, VectorKind};
use tracing::{debug, info};

use crate::error::{SimError, SimResult};

/// Reconstructs the state trajectory of an IMU-carrying rigid body from its
/// measurements `y` and the known inputs `u`.
///
/// The initial estimate `xh0` is placed one sample before the first
/// measurement, so `u` must cover `first - 1 ..= last - 1`. The returned array
/// holds one estimate per measurement.
pub fn imu_attitude_trajectory_reconstruction(
    y: &DiscreteTimeArray,
    u: &DiscreteTimeArray,
    xh0: StateVector,
    p: Matrix,
    q: Matrix,
    r: Matrix,
    dt: f64,
) -> SimResult<DiscreteTimeArray> {
    let (Some(first), Some(last)) = (y.first_time(), y.last_time()) else {
        return Err(SimError::InvalidScenario("no measurements to reconstruct from".into()));
    };
    let k0 = first.checked_sub(1).ok_or_else(|| {
        SimError::InvalidScenario("the first measurement must come after time 0".into())
    })?;

    let imu = ImuDynamicalSystem::new(dt);
    let dims = imu.dims();
    let ekf = ExtendedKalmanFilter::new(imu, p, q, r)?;
    let mut observer = ZeroDelayObserver::new(dims, ekf)?;
    observer.set_state(xh0, k0)?;

    info!(from = first, to = last, dt, "reconstructing trajectory");
    let mut estimates = DiscreteTimeArray::new(VectorKind::State);
    for k in first..=last {
        let u_prev = u.get(k - 1).ok_or(SimError::MissingSample {
            kind: VectorKind::Input,
            k: k - 1,
        })?;
        observer.set_input(u_prev.clone(), k - 1)?;
        observer.set_measurement(y[k].clone(), k)?;

        let xh = observer.get_estimate_state(k)?;
        estimates.push_back(xh, k)?;
    }
    debug!(estimates = estimates.len(), "reconstruction finished");

    Ok(estimates)
}
