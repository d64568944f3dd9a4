// kestrel_sim/src/config.rs

//! Scenario configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML scenario file,
//! then `KESTREL_`-prefixed environment variables (`KESTREL_SIMULATION__SEED=3`).

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::SimResult;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// The root of the data parsed from a `scenario.toml` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)] // Use default if the [simulation] section is missing
    pub simulation: Simulation,

    #[serde(default)]
    pub noise: Noise,

    #[serde(default)]
    pub estimator: Estimator,

    #[serde(default)]
    pub output: Output,
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the sections in the scenario.toml file.
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Simulation {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    /// Number of samples to simulate and reconstruct.
    pub samples: u64,
    /// Sampling period in seconds.
    pub dt: f64,
    /// The input is held constant over blocks of this many samples.
    pub input_hold: u64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            seed: None,
            samples: 3000,
            dt: 1e-3,
            input_hold: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Noise {
    /// Standard deviation of the process noise, on every state component.
    pub process_std: f64,
    /// Standard deviation of the measurement noise, on every measurement component.
    pub measurement_std: f64,
}

impl Default for Noise {
    fn default() -> Self {
        Self {
            process_std: 0.01,
            measurement_std: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Estimator {
    /// The initial estimate is drawn uniformly from `[-spread, spread]` per component.
    pub initial_spread: f64,
    /// Overrides the first orientation component of the initial estimate.
    pub initial_orientation_x: Option<f64>,
}

impl Default for Estimator {
    fn default() -> Self {
        Self {
            initial_spread: 3.14,
            initial_orientation_x: Some(3.14),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Output {
    /// Where the trajectory comparison is written.
    pub path: PathBuf,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            path: "trajectory.dat".into(),
        }
    }
}

impl ScenarioConfig {
    /// The default layering: defaults, then the scenario file (if any), then
    /// the environment.
    pub fn figment(scenario: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(ScenarioConfig::default()));
        if let Some(path) = scenario {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("KESTREL_").split("__"))
    }

    pub fn from_figment(figment: &Figment) -> SimResult<Self> {
        let config: ScenarioConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(scenario: Option<&Path>) -> SimResult<Self> {
        Self::from_figment(&Self::figment(scenario))
    }

    /// Command-line flags win over every other source.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(seed) = cli.seed {
            self.simulation.seed = Some(seed);
        }
        if let Some(path) = &cli.output {
            self.output.path = path.clone();
        }
        if let Some(samples) = cli.samples {
            self.simulation.samples = samples;
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        use crate::error::SimError::InvalidScenario;

        if !(self.simulation.dt.is_finite() && self.simulation.dt > 0.0) {
            return Err(InvalidScenario(format!(
                "simulation.dt must be positive, got {}",
                self.simulation.dt
            )));
        }
        if self.simulation.samples == 0 {
            return Err(InvalidScenario("simulation.samples must be at least 1".into()));
        }
        if self.simulation.input_hold == 0 {
            return Err(InvalidScenario("simulation.input_hold must be at least 1".into()));
        }
        if self.noise.process_std < 0.0 || self.noise.measurement_std < 0.0 {
            return Err(InvalidScenario("noise standard deviations cannot be negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    #[test]
    fn defaults_describe_the_reference_scenario() {
        let config = ScenarioConfig::default();
        assert_eq!(config.simulation.samples, 3000);
        assert_eq!(config.simulation.input_hold, 10);
        assert_eq!(config.noise.process_std, 0.01);
        assert_eq!(config.output.path, PathBuf::from("trajectory.dat"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_only_what_it_names() {
        let figment = Figment::from(Serialized::defaults(ScenarioConfig::default())).merge(
            Toml::string(
                r#"
                [simulation]
                seed = 9
                samples = 200

                [noise]
                measurement_std = 0.5
                "#,
            ),
        );
        let config = ScenarioConfig::from_figment(&figment).unwrap();

        assert_eq!(config.simulation.seed, Some(9));
        assert_eq!(config.simulation.samples, 200);
        assert_eq!(config.simulation.dt, 1e-3);
        assert_eq!(config.noise.measurement_std, 0.5);
        assert_eq!(config.noise.process_std, 0.01);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let figment = Figment::from(Serialized::defaults(ScenarioConfig::default()))
            .merge(Toml::string("[simulation]\nsteps = 3\n"));
        assert!(matches!(
            ScenarioConfig::from_figment(&figment),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let figment = Figment::from(Serialized::defaults(ScenarioConfig::default()))
            .merge(Toml::string("[simulation]\ndt = -0.1\n"));
        assert!(matches!(
            ScenarioConfig::from_figment(&figment),
            Err(SimError::InvalidScenario(_))
        ));
    }

    #[test]
    fn bundled_scenario_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../assets/scenarios/imu_attitude.toml");
        let config = ScenarioConfig::load(Some(&path)).unwrap();
        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(config.estimator.initial_orientation_x, Some(3.14));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = ScenarioConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let figment = Figment::from(Serialized::defaults(ScenarioConfig::default()))
            .merge(Toml::string(&text));
        assert_eq!(ScenarioConfig::from_figment(&figment).unwrap(), config);
    }
}
