// kestrel_core/src/observer.rs

//! The zero-delay observer loop.
//!
//! A zero-delay observer estimates `x_{k+1}` from `x_k`, `u_k` and `y_{k+1}`:
//! no data from after `k+1` is ever used, and no past estimate is ever
//! revisited. The observer below only does the bookkeeping (buffers, current
//! time, causality and feasibility checks). The estimation step itself is a
//! strategy object implementing [`OneStepEstimator`].

use tracing::{debug, trace};

use crate::error::{ObserverError, ObserverResult};
use crate::time_array::DiscreteTimeArray;
use crate::types::{
    InputVector, MeasureVector, ObserverDims, StateVector, TimeIndex, VectorKind,
};

/// Everything a single estimation step may look at.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// The current time `k0`. The step produces the state at `k0 + 1`.
    pub time: TimeIndex,
    /// The state estimate at `k0`.
    pub state: &'a StateVector,
    /// The measurement at `k0 + 1`.
    pub measurement: &'a MeasureVector,
    /// The input at `k0`. `None` for systems without inputs.
    pub input: Option<&'a InputVector>,
}

/// The contract for one step of a zero-delay estimator (`k0 -> k0 + 1`).
///
/// Implementations must be deterministic: identical contexts (and identical
/// internal state) give identical results.
pub trait OneStepEstimator {
    fn one_step_estimation(&mut self, context: &StepContext<'_>) -> StateVector;

    /// The sizes this estimator was built for, if it knows them. An observer
    /// refuses to wrap an estimator whose sizes differ from its own.
    fn dims(&self) -> Option<ObserverDims> {
        None
    }
}

/// Plain closures are estimators too, which keeps tests and quick experiments short.
impl<F> OneStepEstimator for F
where
    F: FnMut(&StepContext<'_>) -> StateVector,
{
    fn one_step_estimation(&mut self, context: &StepContext<'_>) -> StateVector {
        self(context)
    }
}

/// The single state the observer retains, and the time it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedState {
    pub time: TimeIndex,
    pub vector: StateVector,
}

/// A recursive, time-indexed observer.
///
/// Measurements and inputs are buffered in chronological order; asking for the
/// estimate at a future time runs the estimator once per step up to that time.
/// Only the newest state is kept, together with the measurements and inputs
/// that have not been consumed yet.
#[derive(Debug)]
pub struct ZeroDelayObserver<E> {
    dims: ObserverDims,
    estimator: E,
    state: Option<TimedState>,
    measurements: DiscreteTimeArray,
    inputs: DiscreteTimeArray,
}

impl<E: OneStepEstimator> ZeroDelayObserver<E> {
    /// Creates an observer with empty buffers.
    ///
    /// Fails with a dimension mismatch if the estimator reports sizes that
    /// differ from `dims`.
    pub fn new(dims: ObserverDims, estimator: E) -> ObserverResult<Self> {
        if let Some(expected) = estimator.dims() {
            check_dim(VectorKind::State, expected.state, dims.state)?;
            check_dim(VectorKind::Measurement, expected.measurement, dims.measurement)?;
            check_dim(VectorKind::Input, expected.input, dims.input)?;
        }

        Ok(Self {
            dims,
            estimator,
            state: None,
            measurements: DiscreteTimeArray::new(VectorKind::Measurement),
            inputs: DiscreteTimeArray::new(VectorKind::Input),
        })
    }

    pub fn dims(&self) -> ObserverDims {
        self.dims
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut E {
        &mut self.estimator
    }

    /// Sets the state at time `k`, replacing whatever state was held before.
    /// `k` becomes the current time.
    pub fn set_state(&mut self, x_k: StateVector, k: TimeIndex) -> ObserverResult<()> {
        check_dim(VectorKind::State, self.dims.state, x_k.len())?;
        debug!(k, "observer state set");
        self.state = Some(TimedState {
            time: k,
            vector: x_k,
        });
        Ok(())
    }

    pub fn clear_state(&mut self) {
        self.state = None;
    }

    /// Appends the measurement `y_k`. Measurements must arrive in order,
    /// without gaps.
    pub fn set_measurement(&mut self, y_k: MeasureVector, k: TimeIndex) -> ObserverResult<()> {
        check_dim(VectorKind::Measurement, self.dims.measurement, y_k.len())?;
        self.measurements.push_back(y_k, k)
    }

    pub fn clear_measurements(&mut self) {
        self.measurements.clear();
    }

    /// Appends the input `u_k`. Inputs must arrive in order, without gaps.
    pub fn set_input(&mut self, u_k: InputVector, k: TimeIndex) -> ObserverResult<()> {
        check_dim(VectorKind::Input, self.dims.input, u_k.len())?;
        self.inputs.push_back(u_k, k)
    }

    pub fn clear_inputs(&mut self) {
        self.inputs.clear();
    }

    /// The current time `k0`, or `None` if no state has been set.
    pub fn get_current_time(&self) -> Option<TimeIndex> {
        self.state.as_ref().map(|s| s.time)
    }

    /// The retained state at `k0`, without running anything.
    pub fn current_state(&self) -> Option<&TimedState> {
        self.state.as_ref()
    }

    pub fn measurements(&self) -> &DiscreteTimeArray {
        &self.measurements
    }

    pub fn inputs(&self) -> &DiscreteTimeArray {
        &self.inputs
    }

    /// Runs the observer loop up to time `k` and returns the state estimate
    /// there. `k` becomes the current time.
    ///
    /// With current time `k0`, this needs `k > k0`, the measurements
    /// `y_{k0+1} ..= y_k` and, if the system has inputs, `u_{k0} .. u_{k-1}`.
    /// Feasibility is checked for the whole span before the first step runs,
    /// and nothing is committed unless every step succeeds.
    pub fn get_estimate_state(&mut self, k: TimeIndex) -> ObserverResult<StateVector> {
        let current = self.state.as_ref().ok_or(ObserverError::StateNotSet)?;
        let k0 = current.time;

        if k <= k0 {
            return Err(ObserverError::Causality {
                requested: k,
                current: k0,
            });
        }
        if let Some(missing) = self.measurements.first_missing(k0 + 1..=k) {
            return Err(ObserverError::InsufficientData {
                kind: VectorKind::Measurement,
                missing,
                requested: k,
            });
        }
        if self.dims.has_input() {
            if let Some(missing) = self.inputs.first_missing(k0..=k - 1) {
                return Err(ObserverError::InsufficientData {
                    kind: VectorKind::Input,
                    missing,
                    requested: k,
                });
            }
        }

        debug!(k0, k, steps = k - k0, "running observer loop");

        let mut x = current.vector.clone();
        for i in k0..k {
            let context = StepContext {
                time: i,
                state: &x,
                measurement: &self.measurements[i + 1],
                input: self.dims.has_input().then(|| &self.inputs[i]),
            };
            let next = self.estimator.one_step_estimation(&context);
            check_dim(VectorKind::State, self.dims.state, next.len())?;
            trace!(k = i + 1, "observer step done");
            x = next;
        }

        // Commit, then drop what no later step can read again.
        self.state = Some(TimedState {
            time: k,
            vector: x.clone(),
        });
        self.measurements.truncate_through(k);
        self.inputs.truncate_before(k);

        Ok(x)
    }
}

fn check_dim(kind: VectorKind, expected: usize, got: usize) -> ObserverResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(ObserverError::DimensionMismatch {
            kind,
            expected,
            got,
        })
    }
}
