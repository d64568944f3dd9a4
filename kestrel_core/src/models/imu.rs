// kestrel_core/src/models/imu.rs

use nalgebra::{DVector, Vector3};

use crate::kinematics::{integrate_kinematics, matrix_to_rotation_vector, rotation_vector_to_matrix};
use crate::models::DynamicalSystem;
use crate::types::{InputVector, MeasureVector, StateVector, TimeIndex};

/// Standard gravity, m/s^2.
pub const GRAVITY: f64 = 9.8;

pub const IMU_STATE_SIZE: usize = 18;
pub const IMU_MEASUREMENT_SIZE: usize = 6;
pub const IMU_INPUT_SIZE: usize = 6;

/// Offsets of the 3-vectors packed into the IMU state.
///
/// - Position (3) in World Frame
/// - Velocity (3) in World Frame
/// - Acceleration (3) in World Frame
/// - Orientation (3, rotation vector) of the Body in the World Frame
/// - Angular Velocity (3) in Body Frame
/// - Angular Acceleration (3) in Body Frame
pub mod index {
    pub const POSITION: usize = 0;
    pub const VELOCITY: usize = 3;
    pub const ACCELERATION: usize = 6;
    pub const ORIENTATION: usize = 9;
    pub const ANGULAR_VELOCITY: usize = 12;
    pub const ANGULAR_ACCELERATION: usize = 15;
}

/// An inertial measurement unit riding on a rigid body.
///
/// The state carries the full second-order kinematics of the body. The input is
/// an increment of the linear acceleration `[0..3]` and of the angular
/// acceleration `[3..6]`, applied after the kinematics step. The measurement is
/// what the IMU reads: the specific force in the body frame `[0..3]` and the
/// body angular velocity `[3..6]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImuDynamicalSystem {
    /// The sampling period, seconds.
    pub dt: f64,
    /// The magnitude of gravity, acting along -z of the world frame.
    pub gravity_magnitude: f64,
}

impl Default for ImuDynamicalSystem {
    fn default() -> Self {
        Self {
            dt: 1e-3,
            gravity_magnitude: GRAVITY,
        }
    }
}

impl ImuDynamicalSystem {
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            ..Default::default()
        }
    }

    pub fn set_sampling_period(&mut self, dt: f64) {
        self.dt = dt;
    }
}

fn segment(x: &DVector<f64>, start: usize) -> Vector3<f64> {
    x.fixed_rows::<3>(start).into_owned()
}

impl DynamicalSystem for ImuDynamicalSystem {
    fn state_size(&self) -> usize {
        IMU_STATE_SIZE
    }

    fn measurement_size(&self) -> usize {
        IMU_MEASUREMENT_SIZE
    }

    fn input_size(&self) -> usize {
        IMU_INPUT_SIZE
    }

    fn state_dynamics(&self, x: &StateVector, u: &InputVector, _k: TimeIndex) -> StateVector {
        let mut position = segment(x, index::POSITION);
        let mut velocity = segment(x, index::VELOCITY);
        let acceleration = segment(x, index::ACCELERATION);
        let mut orientation = rotation_vector_to_matrix(&segment(x, index::ORIENTATION));
        let mut angular_velocity = segment(x, index::ANGULAR_VELOCITY);
        let angular_acceleration = segment(x, index::ANGULAR_ACCELERATION);

        integrate_kinematics(
            &mut position,
            &mut velocity,
            &acceleration,
            &mut orientation,
            &mut angular_velocity,
            &angular_acceleration,
            self.dt,
        );

        let mut x_next = x.clone();
        x_next.fixed_rows_mut::<3>(index::POSITION).copy_from(&position);
        x_next.fixed_rows_mut::<3>(index::VELOCITY).copy_from(&velocity);
        x_next
            .fixed_rows_mut::<3>(index::ORIENTATION)
            .copy_from(&matrix_to_rotation_vector(&orientation));
        x_next
            .fixed_rows_mut::<3>(index::ANGULAR_VELOCITY)
            .copy_from(&angular_velocity);

        // The input drives the accelerations for the next step.
        x_next
            .fixed_rows_mut::<3>(index::ACCELERATION)
            .copy_from(&(acceleration + u.fixed_rows::<3>(0)));
        x_next
            .fixed_rows_mut::<3>(index::ANGULAR_ACCELERATION)
            .copy_from(&(angular_acceleration + u.fixed_rows::<3>(3)));

        x_next
    }

    fn measure_dynamics(&self, x: &StateVector, _k: TimeIndex) -> MeasureVector {
        let orientation = rotation_vector_to_matrix(&segment(x, index::ORIENTATION));
        let acceleration = segment(x, index::ACCELERATION);
        let angular_velocity = segment(x, index::ANGULAR_VELOCITY);

        // An accelerometer at rest reads +g along the world z axis.
        let specific_force_world = acceleration + Vector3::z() * self.gravity_magnitude;
        let accelerometer = orientation.transpose() * specific_force_world;

        let mut y = DVector::zeros(IMU_MEASUREMENT_SIZE);
        y.fixed_rows_mut::<3>(0).copy_from(&accelerometer);
        y.fixed_rows_mut::<3>(3).copy_from(&angular_velocity);
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn state_with(offset: usize, value: Vector3<f64>) -> StateVector {
        let mut x = DVector::zeros(IMU_STATE_SIZE);
        x.fixed_rows_mut::<3>(offset).copy_from(&value);
        x
    }

    #[test]
    fn level_imu_at_rest_reads_gravity() {
        let imu = ImuDynamicalSystem::default();
        let y = imu.measure_dynamics(&DVector::zeros(IMU_STATE_SIZE), 0);
        assert_abs_diff_eq!(
            y,
            DVector::from_vec(vec![0.0, 0.0, GRAVITY, 0.0, 0.0, 0.0]),
            epsilon = 1e-12
        );
    }

    #[test]
    fn tilted_imu_sees_gravity_in_its_own_frame() {
        let imu = ImuDynamicalSystem::default();
        // Rolled by +90 degrees about x: world z is the body +y axis.
        let x = state_with(index::ORIENTATION, Vector3::new(FRAC_PI_2, 0.0, 0.0));
        let y = imu.measure_dynamics(&x, 0);
        assert_abs_diff_eq!(y.fixed_rows::<3>(0).into_owned(), Vector3::new(0.0, GRAVITY, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn state_without_excitation_is_a_fixed_point() {
        let imu = ImuDynamicalSystem::new(0.01);
        let mut x = state_with(index::POSITION, Vector3::new(1.0, -2.0, 3.0));
        x.fixed_rows_mut::<3>(index::ORIENTATION)
            .copy_from(&Vector3::new(0.1, -0.2, 0.3));

        let next = imu.state_dynamics(&x, &DVector::zeros(IMU_INPUT_SIZE), 0);
        assert_abs_diff_eq!(next, x, epsilon = 1e-12);
    }

    #[test]
    fn dynamics_integrate_then_apply_the_input() {
        let imu = ImuDynamicalSystem::new(0.1);
        let mut x = state_with(index::VELOCITY, Vector3::new(1.0, 0.0, 0.0));
        x.fixed_rows_mut::<3>(index::ACCELERATION)
            .copy_from(&Vector3::new(0.0, 2.0, 0.0));
        x.fixed_rows_mut::<3>(index::ANGULAR_VELOCITY)
            .copy_from(&Vector3::new(0.0, 0.0, 1.0));
        let u = DVector::from_vec(vec![0.5, 0.0, 0.0, 0.0, 0.0, -3.0]);

        let next = imu.state_dynamics(&x, &u, 0);

        assert_abs_diff_eq!(segment(&next, index::POSITION), Vector3::new(0.1, 0.01, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(segment(&next, index::VELOCITY), Vector3::new(1.0, 0.2, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(segment(&next, index::ORIENTATION), Vector3::new(0.0, 0.0, 0.1), epsilon = 1e-12);
        assert_abs_diff_eq!(segment(&next, index::ACCELERATION), Vector3::new(0.5, 2.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(
            segment(&next, index::ANGULAR_ACCELERATION),
            Vector3::new(0.0, 0.0, -3.0),
            epsilon = 1e-12
        );
    }
}
