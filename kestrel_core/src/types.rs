// kestrel_core/src/types.rs

use nalgebra::{DMatrix, DVector};

// --- Core Type Aliases ---
pub type StateVector = DVector<f64>;
pub type MeasureVector = DVector<f64>;
pub type InputVector = DVector<f64>;
pub type Matrix = DMatrix<f64>;

/// A discrete time index. `k` in the estimation equations.
pub type TimeIndex = u64;

/// The structural sizes of an estimation problem.
///
/// These are fixed when an observer (or model) is built and every vector that
/// crosses its interface is checked against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverDims {
    /// `n`, the length of the state vector.
    pub state: usize,
    /// `m`, the length of the measurement vector.
    pub measurement: usize,
    /// `p`, the length of the input vector. Zero for systems without inputs.
    pub input: usize,
}

impl ObserverDims {
    pub fn new(state: usize, measurement: usize, input: usize) -> Self {
        Self {
            state,
            measurement,
            input,
        }
    }

    /// Whether the system is driven by an input at all.
    pub fn has_input(&self) -> bool {
        self.input > 0
    }
}

/// Which of the three vector streams a value belongs to. Used to make errors
/// self-describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorKind {
    State,
    Measurement,
    Input,
}

impl std::fmt::Display for VectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorKind::State => write!(f, "state"),
            VectorKind::Measurement => write!(f, "measurement"),
            VectorKind::Input => write!(f, "input"),
        }
    }
}
