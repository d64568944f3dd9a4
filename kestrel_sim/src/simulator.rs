// kestrel_sim/src/simulator.rs

use std::collections::BTreeMap;

use kestrel_core::error::ObserverError;
use kestrel_core::models::DynamicalSystem;
use kestrel_core::time_array::DiscreteTimeArray;
use kestrel_core::types::{InputVector, StateVector, TimeIndex, VectorKind};
use nalgebra::DVector;
use tracing::{debug, trace};

use crate::error::{SimError, SimResult};
use crate::noise::NoiseSource;

/// Runs a [`DynamicalSystem`] forward to produce ground-truth states and the
/// (optionally noisy) measurements they generate.
///
/// Inputs are sparse: an input set at `k` applies from `k` until the next one
/// that was set. Before the first one the input is zero.
pub struct DynamicalSystemSimulator<D> {
    model: D,
    process_noise: Option<Box<dyn NoiseSource>>,
    measurement_noise: Option<Box<dyn NoiseSource>>,
    states: DiscreteTimeArray,
    measurements: DiscreteTimeArray,
    inputs: BTreeMap<TimeIndex, InputVector>,
}

impl<D: DynamicalSystem> DynamicalSystemSimulator<D> {
    pub fn new(model: D) -> Self {
        Self {
            model,
            process_noise: None,
            measurement_noise: None,
            states: DiscreteTimeArray::new(VectorKind::State),
            measurements: DiscreteTimeArray::new(VectorKind::Measurement),
            inputs: BTreeMap::new(),
        }
    }

    pub fn model(&self) -> &D {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut D {
        &mut self.model
    }

    /// Noise added to every state transition.
    pub fn set_process_noise(&mut self, noise: Box<dyn NoiseSource>) {
        self.process_noise = Some(noise);
    }

    /// Noise added to every measurement.
    pub fn set_measurement_noise(&mut self, noise: Box<dyn NoiseSource>) {
        self.measurement_noise = Some(noise);
    }

    /// Restarts the simulation from `x_k` at time `k`, discarding everything
    /// simulated so far.
    pub fn set_state(&mut self, x_k: StateVector, k: TimeIndex) -> SimResult<()> {
        check_len(VectorKind::State, self.model.state_size(), x_k.len())?;
        self.states.clear();
        self.measurements.clear();
        self.states.push_back(x_k, k)?;
        Ok(())
    }

    /// Sets the input from time `k` onwards.
    pub fn set_input(&mut self, u_k: InputVector, k: TimeIndex) -> SimResult<()> {
        check_len(VectorKind::Input, self.model.input_size(), u_k.len())?;
        self.inputs.insert(k, u_k);
        Ok(())
    }

    /// The input in effect at time `k`.
    pub fn input_at(&self, k: TimeIndex) -> InputVector {
        self.inputs
            .range(..=k)
            .next_back()
            .map(|(_, u)| u.clone())
            .unwrap_or_else(|| DVector::zeros(self.model.input_size()))
    }

    /// Simulates until the state at `k` is known. Every state before `k` gets
    /// its measurement on the way.
    pub fn simulate_dynamics_to(&mut self, k: TimeIndex) -> SimResult<()> {
        let start = self
            .states
            .last_time()
            .ok_or_else(|| SimError::InvalidScenario("simulator has no initial state".into()))?;

        debug!(from = start, to = k, "simulating dynamics");
        for t in start..k {
            let x_t = self.states[t].clone();

            if self.measurements.get(t).is_none() {
                let mut y_t = self.model.measure_dynamics(&x_t, t);
                if let Some(noise) = self.measurement_noise.as_mut() {
                    y_t = noise.add_noise(&y_t);
                }
                self.measurements.push_back(y_t, t)?;
            }

            let u_t = self.input_at(t);
            let mut x_next = self.model.state_dynamics(&x_t, &u_t, t);
            if let Some(noise) = self.process_noise.as_mut() {
                x_next = noise.add_noise(&x_next);
            }
            self.states.push_back(x_next, t + 1)?;
            trace!(k = t + 1, "simulated state");
        }
        Ok(())
    }

    /// Copies the simulated states `from ..= to`.
    pub fn get_state_array(&self, from: TimeIndex, to: TimeIndex) -> SimResult<DiscreteTimeArray> {
        copy_span(&self.states, VectorKind::State, from, to)
    }

    /// Copies the simulated measurements `from ..= to`.
    pub fn get_measurement_array(
        &self,
        from: TimeIndex,
        to: TimeIndex,
    ) -> SimResult<DiscreteTimeArray> {
        copy_span(&self.measurements, VectorKind::Measurement, from, to)
    }
}

fn check_len(kind: VectorKind, expected: usize, got: usize) -> SimResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(ObserverError::DimensionMismatch {
            kind,
            expected,
            got,
        }
        .into())
    }
}

fn copy_span(
    source: &DiscreteTimeArray,
    kind: VectorKind,
    from: TimeIndex,
    to: TimeIndex,
) -> SimResult<DiscreteTimeArray> {
    if let Some(k) = source.first_missing(from..=to) {
        return Err(SimError::MissingSample { kind, k });
    }
    let mut copy = DiscreteTimeArray::new(kind);
    for k in from..=to {
        copy.push_back(source[k].clone(), k)?;
    }
    Ok(copy)
}
