// kestrel_core/src/kinematics.rs

//! Rigid-body kinematics integration.
//!
//! Translation is advanced with the constant-acceleration closed form and
//! orientation with the exponential map of the body-frame rotation vector, so
//! the orientation never leaves the rotation group. Both a rotation matrix and
//! a unit quaternion can carry the orientation; they share one exponential-map
//! routine and one degenerate-angle threshold.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

/// Rotation angles at or below this are treated as no rotation at all.
pub const EPSILON_ANGLE: f64 = 1e-16;

/// Rodrigues' formula: the rotation matrix of the rotation vector `theta`
/// (axis times angle, radians).
pub fn rotation_vector_to_matrix(theta: &Vector3<f64>) -> Matrix3<f64> {
    let angle = theta.norm();
    if angle <= EPSILON_ANGLE {
        return Matrix3::identity();
    }

    let k = (theta / angle).cross_matrix();
    Matrix3::identity() + k * angle.sin() + k * k * (1.0 - angle.cos())
}

/// The quaternion exponential of the rotation vector `theta`.
pub fn rotation_vector_to_quaternion(theta: &Vector3<f64>) -> UnitQuaternion<f64> {
    let angle = theta.norm();
    if angle <= EPSILON_ANGLE {
        return UnitQuaternion::identity();
    }

    let (s, c) = (0.5 * angle).sin_cos();
    let axis = theta / angle;
    UnitQuaternion::new_unchecked(Quaternion::from_parts(c, axis * s))
}

/// The logarithm map: the rotation vector of a rotation matrix.
///
/// The angle comes from `atan2(sin, cos)` rather than `acos` of the trace, so
/// small rotations keep full precision.
pub fn matrix_to_rotation_vector(orientation: &Matrix3<f64>) -> Vector3<f64> {
    let m = orientation;
    // sin(angle) * axis
    let v = 0.5
        * Vector3::new(
            m[(2, 1)] - m[(1, 2)],
            m[(0, 2)] - m[(2, 0)],
            m[(1, 0)] - m[(0, 1)],
        );
    let s = v.norm();
    let c = 0.5 * (m.trace() - 1.0);
    let angle = s.atan2(c);

    if c > 0.0 || s > 1e-6 {
        if s == 0.0 {
            return Vector3::zeros();
        }
        return v * (angle / s);
    }

    // Close to a half turn the antisymmetric part vanishes; read the axis off
    // the symmetric part instead: sym(R) = cos*I + (1 - cos) * a*a^T.
    let sym = (m + m.transpose()) * 0.5;
    let aat = (sym - Matrix3::identity() * c) / (1.0 - c);
    let i = aat.diagonal().imax();
    let mut axis: Vector3<f64> = aat.column(i).into_owned() / aat[(i, i)].max(0.0).sqrt();
    if axis.dot(&v) < 0.0 {
        axis = -axis;
    }
    axis.normalize() * angle
}

/// Re-orthonormalizes a nearly orthonormal matrix with Gram-Schmidt on its
/// columns. The third column is rebuilt as a cross product, which keeps the
/// determinant at +1.
pub fn orthonormalize(m: &mut Matrix3<f64>) {
    let c0: Vector3<f64> = m.column(0).into_owned();
    let c1: Vector3<f64> = m.column(1).into_owned();

    let x = c0.normalize();
    let y = (c1 - x * x.dot(&c1)).normalize();
    let z = x.cross(&y);
    *m = Matrix3::from_columns(&[x, y, z]);
}

/// A representation of a 3D orientation that the integrator can advance.
pub trait Orientation {
    /// Composes the orientation with the exponential of the body-frame
    /// rotation vector: `self <- self * exp(rotation_vector)`.
    ///
    /// Implementations re-project onto the rotation group afterwards.
    fn apply_body_increment(&mut self, rotation_vector: &Vector3<f64>);

    /// The orientation as a rotation matrix.
    fn to_matrix(&self) -> Matrix3<f64>;
}

impl Orientation for Matrix3<f64> {
    fn apply_body_increment(&mut self, rotation_vector: &Vector3<f64>) {
        *self *= rotation_vector_to_matrix(rotation_vector);
        orthonormalize(self);
    }

    fn to_matrix(&self) -> Matrix3<f64> {
        *self
    }
}

impl Orientation for UnitQuaternion<f64> {
    fn apply_body_increment(&mut self, rotation_vector: &Vector3<f64>) {
        *self *= rotation_vector_to_quaternion(rotation_vector);
        self.renormalize();
    }

    fn to_matrix(&self) -> Matrix3<f64> {
        self.to_rotation_matrix().into_inner()
    }
}

/// Integrates position, velocity, orientation and angular velocity over one
/// step of length `dt`, given the linear acceleration (world frame) and the
/// angular acceleration (body frame), both held constant over the step.
///
/// The rotation vector for the step is `w*dt + a*dt^2/2`, i.e. the mean of the
/// angular velocity before and after the step, times `dt`.
///
/// `dt` must be positive and finite; it is not checked.
pub fn integrate_kinematics<O: Orientation>(
    position: &mut Vector3<f64>,
    velocity: &mut Vector3<f64>,
    acceleration: &Vector3<f64>,
    orientation: &mut O,
    rotation_velocity: &mut Vector3<f64>,
    rotation_acceleration: &Vector3<f64>,
    dt: f64,
) {
    let half_dt2 = 0.5 * dt * dt;

    *position += *velocity * dt + acceleration * half_dt2;
    *velocity += acceleration * dt;

    let theta = *rotation_velocity * dt + rotation_acceleration * half_dt2;
    orientation.apply_body_increment(&theta);
    *rotation_velocity += rotation_acceleration * dt;
}

/// Integrates position and orientation over one step from the velocities
/// alone (first order, no acceleration terms).
pub fn integrate_configuration<O: Orientation>(
    position: &mut Vector3<f64>,
    orientation: &mut O,
    velocity: &Vector3<f64>,
    rotation_velocity: &Vector3<f64>,
    dt: f64,
) {
    *position += velocity * dt;
    orientation.apply_body_increment(&(rotation_velocity * dt));
}

/// The kinematic state of one rigid body, for callers that would rather carry
/// it as a unit than as loose vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodyState<O> {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub orientation: O,
    pub rotation_velocity: Vector3<f64>,
}

impl<O: Orientation> RigidBodyState<O> {
    pub fn new(
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        orientation: O,
        rotation_velocity: Vector3<f64>,
    ) -> Self {
        Self {
            position,
            velocity,
            orientation,
            rotation_velocity,
        }
    }

    /// See [`integrate_kinematics`].
    pub fn integrate_kinematics(
        &mut self,
        acceleration: &Vector3<f64>,
        rotation_acceleration: &Vector3<f64>,
        dt: f64,
    ) {
        integrate_kinematics(
            &mut self.position,
            &mut self.velocity,
            acceleration,
            &mut self.orientation,
            &mut self.rotation_velocity,
            rotation_acceleration,
            dt,
        );
    }

    /// See [`integrate_configuration`].
    pub fn integrate_configuration(&mut self, dt: f64) {
        integrate_configuration(
            &mut self.position,
            &mut self.orientation,
            &self.velocity,
            &self.rotation_velocity,
            dt,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Rotation3;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    fn assert_valid_rotation(m: &Matrix3<f64>, epsilon: f64) {
        let should_be_identity = m.transpose() * m;
        assert_abs_diff_eq!(should_be_identity, Matrix3::identity(), epsilon = epsilon);
        assert_abs_diff_eq!(m.determinant(), 1.0, epsilon = epsilon);
    }

    fn sample_orientation() -> (Matrix3<f64>, UnitQuaternion<f64>) {
        let q = UnitQuaternion::from_euler_angles(0.3, -1.1, 2.4);
        (q.to_rotation_matrix().into_inner(), q)
    }

    #[test]
    fn rodrigues_matches_nalgebra_axis_angle() {
        let theta = Vector3::new(0.2, -0.7, 1.3);
        let expected = Rotation3::from_scaled_axis(theta).into_inner();
        assert_abs_diff_eq!(rotation_vector_to_matrix(&theta), expected, epsilon = 1e-12);

        let expected_q = UnitQuaternion::from_scaled_axis(theta);
        assert_abs_diff_eq!(
            rotation_vector_to_quaternion(&theta).coords,
            expected_q.coords,
            epsilon = 1e-12
        );
    }

    #[test]
    fn log_map_inverts_the_exponential() {
        let theta = Vector3::new(-0.4, 0.9, 0.1);
        let m = rotation_vector_to_matrix(&theta);
        assert_abs_diff_eq!(matrix_to_rotation_vector(&m), theta, epsilon = 1e-12);
        assert_abs_diff_eq!(
            matrix_to_rotation_vector(&Matrix3::identity()),
            Vector3::zeros(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn log_map_is_precise_for_tiny_and_half_turn_rotations() {
        let tiny = Vector3::new(1e-9, -2e-9, 3e-10);
        let m = rotation_vector_to_matrix(&tiny);
        assert_abs_diff_eq!(matrix_to_rotation_vector(&m), tiny, epsilon = 1e-20);

        let axis = Vector3::new(2.0, -1.0, 2.0).normalize();
        let half_turn = axis * (PI - 1e-9);
        let m = rotation_vector_to_matrix(&half_turn);
        assert_abs_diff_eq!(matrix_to_rotation_vector(&m), half_turn, epsilon = 1e-7);
    }

    #[test]
    fn translation_follows_constant_acceleration() {
        let mut p = Vector3::new(1.0, 2.0, 3.0);
        let mut v = Vector3::new(0.5, 0.0, -1.0);
        let a = Vector3::new(0.0, 2.0, 4.0);
        let mut r = Matrix3::identity();
        let mut w = Vector3::zeros();
        let dt = 0.5;

        integrate_kinematics(&mut p, &mut v, &a, &mut r, &mut w, &Vector3::zeros(), dt);

        assert_abs_diff_eq!(p, Vector3::new(1.25, 2.25, 3.0), epsilon = EPS);
        assert_abs_diff_eq!(v, Vector3::new(0.5, 1.0, 1.0), epsilon = EPS);
    }

    #[test]
    fn angular_velocity_accumulates_angular_acceleration() {
        let mut p = Vector3::zeros();
        let mut v = Vector3::zeros();
        let mut q = UnitQuaternion::identity();
        let mut w = Vector3::new(0.0, 0.0, 1.0);
        let alpha = Vector3::new(0.0, 0.0, 2.0);

        integrate_kinematics(&mut p, &mut v, &Vector3::zeros(), &mut q, &mut w, &alpha, 0.1);

        assert_abs_diff_eq!(w, Vector3::new(0.0, 0.0, 1.2), epsilon = EPS);
        // theta = 1.0*0.1 + 0.5*2.0*0.01 = 0.11 about z
        assert_abs_diff_eq!(q.angle(), 0.11, epsilon = EPS);
    }

    #[test]
    fn matrix_and_quaternion_forms_agree() {
        let (mut r, mut q) = sample_orientation();
        let (mut p_r, mut p_q) = (Vector3::zeros(), Vector3::zeros());
        let (mut v_r, mut v_q) = (Vector3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        let (mut w_r, mut w_q) = (Vector3::new(0.3, -2.0, 0.7), Vector3::new(0.3, -2.0, 0.7));
        let a = Vector3::new(0.0, 0.0, -9.8);
        let alpha = Vector3::new(1.5, 0.2, -0.4);

        for _ in 0..100 {
            integrate_kinematics(&mut p_r, &mut v_r, &a, &mut r, &mut w_r, &alpha, 0.01);
            integrate_kinematics(&mut p_q, &mut v_q, &a, &mut q, &mut w_q, &alpha, 0.01);
        }

        assert_abs_diff_eq!(r, Orientation::to_matrix(&q), epsilon = 1e-9);
        assert_abs_diff_eq!(p_r, p_q, epsilon = EPS);
        assert_abs_diff_eq!(w_r, w_q, epsilon = EPS);
    }

    #[test]
    fn zero_angular_motion_leaves_orientation_unchanged() {
        let (r0, q0) = sample_orientation();
        for dt in [1e-6, 0.01, 1.0, 250.0] {
            let mut r = r0;
            let mut q = q0;
            let mut w = Vector3::zeros();
            integrate_kinematics(
                &mut Vector3::zeros(),
                &mut Vector3::new(3.0, 1.0, 0.0),
                &Vector3::new(0.0, 1.0, 0.0),
                &mut r,
                &mut w,
                &Vector3::zeros(),
                dt,
            );
            let mut w = Vector3::zeros();
            integrate_kinematics(
                &mut Vector3::zeros(),
                &mut Vector3::zeros(),
                &Vector3::zeros(),
                &mut q,
                &mut w,
                &Vector3::zeros(),
                dt,
            );
            assert_abs_diff_eq!(r, r0, epsilon = 1e-12);
            assert_abs_diff_eq!(q.coords, q0.coords, epsilon = 1e-12);
        }
    }

    #[test]
    fn orientation_stays_on_the_manifold_over_long_runs() {
        let (mut r, mut q) = sample_orientation();
        let mut r_cfg = r;
        let mut w_r = Vector3::zeros();
        let mut w_q = Vector3::zeros();

        for i in 0..10_000 {
            let t = i as f64 * 1e-3;
            let alpha = Vector3::new(
                5.0 * (3.0 * t).sin(),
                4.0 * (2.0 * t).cos(),
                -3.0 * (7.0 * t).sin(),
            );
            integrate_kinematics(
                &mut Vector3::zeros(),
                &mut Vector3::zeros(),
                &Vector3::zeros(),
                &mut r,
                &mut w_r,
                &alpha,
                1e-3,
            );
            integrate_kinematics(
                &mut Vector3::zeros(),
                &mut Vector3::zeros(),
                &Vector3::zeros(),
                &mut q,
                &mut w_q,
                &alpha,
                1e-3,
            );
            let w_cfg = Vector3::new(2.0 * (t).cos(), -PI, 0.5);
            integrate_configuration(&mut Vector3::zeros(), &mut r_cfg, &Vector3::zeros(), &w_cfg, 1e-2);
        }

        assert_valid_rotation(&r, 1e-10);
        assert_valid_rotation(&r_cfg, 1e-10);
        assert_abs_diff_eq!(q.quaternion().norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn output_is_continuous_across_the_degenerate_threshold() {
        let axis = Vector3::new(1.0, 2.0, -2.0).normalize();
        let delta = 0.5 * EPSILON_ANGLE;
        let (r0, q0) = sample_orientation();

        let below = axis * (EPSILON_ANGLE - delta);
        let above = axis * (EPSILON_ANGLE + delta);

        let (mut r_below, mut r_above) = (r0, r0);
        integrate_configuration(&mut Vector3::zeros(), &mut r_below, &Vector3::zeros(), &below, 1.0);
        integrate_configuration(&mut Vector3::zeros(), &mut r_above, &Vector3::zeros(), &above, 1.0);
        assert_abs_diff_eq!(r_below, r_above, epsilon = 1e-14);

        let (mut q_below, mut q_above) = (q0, q0);
        q_below.apply_body_increment(&below);
        q_above.apply_body_increment(&above);
        assert_abs_diff_eq!(q_below.coords, q_above.coords, epsilon = 1e-14);

        // A small but clearly non-degenerate angle still behaves linearly.
        let small = axis * 1e-9;
        let m = rotation_vector_to_matrix(&small);
        assert_abs_diff_eq!(m, Matrix3::identity() + small.cross_matrix(), epsilon = 1e-17);
    }

    #[test]
    fn increments_compose_in_the_body_frame() {
        // Yaw by 90 degrees, then a body-frame roll: the roll axis is the rotated x.
        let mut r = rotation_vector_to_matrix(&Vector3::new(0.0, 0.0, PI / 2.0));
        integrate_configuration(
            &mut Vector3::zeros(),
            &mut r,
            &Vector3::zeros(),
            &Vector3::new(PI / 2.0, 0.0, 0.0),
            1.0,
        );

        let expected = Rotation3::from_scaled_axis(Vector3::new(0.0, 0.0, PI / 2.0))
            * Rotation3::from_scaled_axis(Vector3::new(PI / 2.0, 0.0, 0.0));
        assert_abs_diff_eq!(r, expected.into_inner(), epsilon = 1e-12);
    }

    #[test]
    fn configuration_integration_is_first_order() {
        let mut body = RigidBodyState::new(
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(2.0, 0.0, -1.0),
            UnitQuaternion::identity(),
            Vector3::new(0.0, 0.4, 0.0),
        );
        body.integrate_configuration(0.5);

        assert_abs_diff_eq!(body.position, Vector3::new(2.0, 1.0, 0.5), epsilon = EPS);
        assert_abs_diff_eq!(body.orientation.scaled_axis(), Vector3::new(0.0, 0.2, 0.0), epsilon = EPS);
        // Velocities are inputs here and are left alone.
        assert_abs_diff_eq!(body.velocity, Vector3::new(2.0, 0.0, -1.0), epsilon = EPS);
    }
}
