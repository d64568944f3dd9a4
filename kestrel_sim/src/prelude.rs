// kestrel_sim/src/prelude.rs

// Re-export the entire kestrel_core prelude so you can easily access
// pure types like `ZeroDelayObserver`, `DynamicalSystem`, etc.
pub use kestrel_core::prelude::*;

// Re-export common simulation-specific types for easy access in other modules.
pub use crate::config::ScenarioConfig;
pub use crate::error::{SimError, SimResult};
pub use crate::noise::{GaussianWhiteNoise, NoiseSource};
pub use crate::simulator::DynamicalSystemSimulator;
pub use crate::reconstruction::imu_attitude_trajectory_reconstruction;
pub use crate::scenario::{run_scenario, ScenarioOutcome};
