// kestrel_core/src/models/mod.rs

use std::fmt::Debug;

use crate::types::{InputVector, MeasureVector, ObserverDims, StateVector, TimeIndex};

/// A discrete-time dynamical system: `x_{k+1} = f(x_k, u_k, k)` and
/// `y_k = h(x_k, k)`.
///
/// Models are pure: they hold parameters, never history, and return the same
/// result for the same arguments. Noise, if any, is added by whoever drives
/// the model (see the simulator).
pub trait DynamicalSystem: Debug + Send + Sync {
    /// Returns the length of the state vector `x`.
    fn state_size(&self) -> usize;

    /// Returns the length of the measurement vector `y`.
    fn measurement_size(&self) -> usize;

    /// Returns the length of the input vector `u`. Zero if the system has no input.
    fn input_size(&self) -> usize;

    /// Computes the next state `x_{k+1}` from the state and input at `k`.
    fn state_dynamics(&self, x: &StateVector, u: &InputVector, k: TimeIndex) -> StateVector;

    /// Computes the measurement `y_k` the system produces in state `x_k`.
    fn measure_dynamics(&self, x: &StateVector, k: TimeIndex) -> MeasureVector;

    /// The three sizes bundled, as the observer wants them.
    fn dims(&self) -> ObserverDims {
        ObserverDims::new(self.state_size(), self.measurement_size(), self.input_size())
    }
}

pub mod imu;
