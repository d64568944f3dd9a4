// kestrel_core/src/estimation/mod.rs

//! Concrete single-step estimators that plug into the
//! [`ZeroDelayObserver`](crate::observer::ZeroDelayObserver).

pub mod ekf;

pub use ekf::ExtendedKalmanFilter;
