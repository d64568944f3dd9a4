// kestrel_sim/src/main.rs

//! The `kestrel` binary: simulate an IMU-carrying rigid body, reconstruct its
//! attitude with a zero-delay EKF observer, and write the comparison.
//!
//! To run with the default scenario:
//! `cargo run --bin kestrel -- --seed 1`

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use kestrel_sim::cli::Cli;
use kestrel_sim::config::ScenarioConfig;
use kestrel_sim::error::SimResult;
use kestrel_sim::logging::init_logging;
use kestrel_sim::output::{attitude_errors, summarize, write_trajectory_file};
use kestrel_sim::scenario::run_scenario;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> SimResult<()> {
    // --- 1. Resolve the configuration ---
    let mut config = ScenarioConfig::load(cli.scenario.as_deref())?;
    config.apply_cli(cli);
    config.validate()?;

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    // --- 2. Simulate and reconstruct ---
    let outcome = run_scenario(&config)?;

    // --- 3. Compare and write ---
    let rows = attitude_errors(&outcome.states, &outcome.estimates)?;
    write_trajectory_file(&config.output.path, &rows)?;

    if let Some((mean, last)) = summarize(&rows) {
        info!(
            seed = outcome.seed,
            mean_error_deg = mean,
            final_error_deg = last,
            "attitude reconstruction complete"
        );
    }
    Ok(())
}
