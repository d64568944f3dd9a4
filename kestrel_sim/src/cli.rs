// kestrel_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Kestrel: IMU attitude reconstruction with a zero-delay observer.
///
/// Simulates a rigid body driven by a known input profile, corrupts its IMU
/// readings with noise, then reconstructs the trajectory with an EKF and
/// writes the attitude comparison to a data file.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to a scenario TOML file. Built-in defaults are used without one.
    #[arg(short, long)]
    pub scenario: Option<PathBuf>,

    /// Where to write the trajectory file. Overrides `[output] path`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Seed for every random draw. Overrides `[simulation] seed`.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of samples to reconstruct. Overrides `[simulation] samples`.
    #[arg(short = 'n', long)]
    pub samples: Option<u64>,

    /// Print the resolved configuration as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,

    /// Log filter, used when `RUST_LOG` is unset (e.g. "debug" or "kestrel_core=trace").
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
