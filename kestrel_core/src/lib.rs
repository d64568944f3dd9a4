// kestrel_core/src/lib.rs

// The pure, framework-agnostic half of the workspace: kinematics, the
// zero-delay observer loop and the models/filters that plug into it.
pub mod error;
pub mod estimation;
pub mod kinematics;
pub mod models;
pub mod observer;
pub mod prelude;
pub mod time_array;
pub mod types;
