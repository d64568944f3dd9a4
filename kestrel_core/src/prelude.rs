// kestrel_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::models::DynamicalSystem;
pub use crate::observer::{OneStepEstimator, StepContext, TimedState, ZeroDelayObserver};

// --- Core Data Structures ---
pub use crate::error::{ObserverError, ObserverResult};
pub use crate::time_array::DiscreteTimeArray;
pub use crate::types::{
    InputVector, MeasureVector, ObserverDims, StateVector, TimeIndex, VectorKind,
};

// --- Kinematics ---
pub use crate::kinematics::{
    integrate_configuration, integrate_kinematics, Orientation, RigidBodyState,
};

// --- Concrete Implementations ---
pub use crate::estimation::ekf::ExtendedKalmanFilter;
pub use crate::models::imu::ImuDynamicalSystem;
