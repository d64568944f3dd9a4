// kestrel_sim/src/lib.rs

// This prelude is for convenience for other files WITHIN the kestrel_sim crate.
pub mod prelude;

// Command line, configuration and logging for the `kestrel` binary.
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

// Synthetic data generation and the reconstruction pipeline.
pub mod noise;
pub mod output;
pub mod reconstruction;
pub mod scenario;
pub mod simulator;
