// kestrel_core/src/estimation/ekf.rs

use nalgebra::{DMatrix, DVector};
use tracing::warn;

use crate::error::{ObserverError, ObserverResult};
use crate::models::DynamicalSystem;
use crate::observer::{OneStepEstimator, StepContext};
use crate::types::{
    InputVector, Matrix, MeasureVector, ObserverDims, StateVector, TimeIndex, VectorKind,
};

/// Perturbation used for the finite-difference Jacobians.
const JACOBIAN_EPSILON: f64 = 1e-7;

/// A concrete implementation of an Extended Kalman Filter over any
/// [`DynamicalSystem`].
///
/// The filter owns the covariance `P`; the state itself lives in the observer
/// that drives it, and reaches the filter through the [`StepContext`].
#[derive(Debug, Clone)]
pub struct ExtendedKalmanFilter<D> {
    model: D,
    /// The covariance of the current state estimate (P).
    covariance: Matrix,
    /// The process noise covariance matrix (Q), modeling uncertainty in the dynamics.
    process_noise_q: Matrix,
    /// The measurement noise covariance matrix (R).
    measurement_noise_r: Matrix,
}

/// The output of the prediction step.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub state: StateVector,
    pub covariance: Matrix,
}

impl<D: DynamicalSystem> ExtendedKalmanFilter<D> {
    /// Creates a new EKF instance, checking every matrix against the model's sizes.
    pub fn new(
        model: D,
        initial_covariance: Matrix,
        process_noise_q: Matrix,
        measurement_noise_r: Matrix,
    ) -> ObserverResult<Self> {
        let n = model.state_size();
        let m = model.measurement_size();
        check_square(VectorKind::State, n, &initial_covariance)?;
        check_square(VectorKind::State, n, &process_noise_q)?;
        check_square(VectorKind::Measurement, m, &measurement_noise_r)?;

        Ok(Self {
            model,
            covariance: initial_covariance,
            process_noise_q,
            measurement_noise_r,
        })
    }

    pub fn model(&self) -> &D {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut D {
        &mut self.model
    }

    pub fn covariance(&self) -> &Matrix {
        &self.covariance
    }

    pub fn set_covariance(&mut self, p: Matrix) -> ObserverResult<()> {
        check_square(VectorKind::State, self.model.state_size(), &p)?;
        self.covariance = p;
        Ok(())
    }

    /// `F = df/dx` at `(x, u)`, by forward finite differences.
    pub fn state_jacobian(&self, x: &StateVector, u: &InputVector, k: TimeIndex) -> Matrix {
        let n = x.len();
        let mut f_jac = DMatrix::zeros(n, n);
        let f_base = self.model.state_dynamics(x, u, k);

        for j in 0..n {
            let mut x_perturbed = x.clone();
            x_perturbed[j] += JACOBIAN_EPSILON;
            let f_perturbed = self.model.state_dynamics(&x_perturbed, u, k);
            f_jac
                .column_mut(j)
                .copy_from(&((f_perturbed - &f_base) / JACOBIAN_EPSILON));
        }
        f_jac
    }

    /// `H = dh/dx` at `x`, by forward finite differences.
    pub fn measurement_jacobian(&self, x: &StateVector, k: TimeIndex) -> Matrix {
        let n = x.len();
        let h_base = self.model.measure_dynamics(x, k);
        let mut h_jac = DMatrix::zeros(h_base.len(), n);

        for j in 0..n {
            let mut x_perturbed = x.clone();
            x_perturbed[j] += JACOBIAN_EPSILON;
            let h_perturbed = self.model.measure_dynamics(&x_perturbed, k);
            h_jac
                .column_mut(j)
                .copy_from(&((h_perturbed - &h_base) / JACOBIAN_EPSILON));
        }
        h_jac
    }

    /// The prediction step. Pure: the filter is not modified.
    /// `x_pred = f(x, u)`, `P_pred = F P F^T + Q`.
    pub fn predict(&self, x: &StateVector, u: &InputVector, k: TimeIndex) -> Prediction {
        let x_pred = self.model.state_dynamics(x, u, k);
        let f_jac = self.state_jacobian(x, u, k);
        let p_pred = &f_jac * &self.covariance * f_jac.transpose() + &self.process_noise_q;

        Prediction {
            state: x_pred,
            covariance: p_pred,
        }
    }

    /// The correction step against the measurement `y` taken at `k`. Pure.
    ///
    /// If the innovation covariance cannot be inverted, the prediction is
    /// returned unchanged.
    pub fn correct(&self, prediction: Prediction, y: &MeasureVector, k: TimeIndex) -> Prediction {
        let x_pred = &prediction.state;
        let p_pred = &prediction.covariance;

        let h_jac = self.measurement_jacobian(x_pred, k);
        let innovation = y - self.model.measure_dynamics(x_pred, k);
        let s = &h_jac * p_pred * h_jac.transpose() + &self.measurement_noise_r;

        let Some(s_inv) = s.try_inverse() else {
            warn!(k, "innovation covariance is singular; skipping the update");
            return prediction;
        };

        let k_gain = p_pred * h_jac.transpose() * s_inv;
        let n = x_pred.len();
        let state = x_pred + &k_gain * innovation;
        let covariance = (DMatrix::<f64>::identity(n, n) - &k_gain * &h_jac) * p_pred;

        Prediction { state, covariance }
    }
}

impl<D: DynamicalSystem> OneStepEstimator for ExtendedKalmanFilter<D> {
    fn one_step_estimation(&mut self, context: &StepContext<'_>) -> StateVector {
        let u = match context.input {
            Some(u) => u.clone(),
            None => DVector::zeros(self.model.input_size()),
        };

        let prediction = self.predict(context.state, &u, context.time);
        let corrected = self.correct(prediction, context.measurement, context.time + 1);

        self.covariance = corrected.covariance;
        corrected.state
    }

    fn dims(&self) -> Option<ObserverDims> {
        Some(self.model.dims())
    }
}

fn check_square(kind: VectorKind, expected: usize, matrix: &Matrix) -> ObserverResult<()> {
    for got in [matrix.nrows(), matrix.ncols()] {
        if got != expected {
            return Err(ObserverError::DimensionMismatch {
                kind,
                expected,
                got,
            });
        }
    }
    Ok(())
}
