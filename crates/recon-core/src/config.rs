//! Configuration loading and typed config structures for the Recon simulator.
//!
//! The configuration lives in `recon-config.yaml` at the project root. It
//! holds the simulation settings (seed, horizon, discount, episode count,
//! policy), the grid instance, and logging settings. Every field has a
//! default, so an empty file is a valid configuration.
//!
//! Environment variables override YAML values:
//! - `RECON_SEED` overrides `simulation.seed`
//! - `RECON_HORIZON` overrides `simulation.horizon`

use std::path::Path;

use serde::Deserialize;

use crate::recon::ReconInstance;
use crate::runner::EpisodeSettings;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is out of range or an override could not be parsed.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration. Mirrors the structure of `recon-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReconConfig {
    /// Seed, horizon, and episode settings.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// The grid, agents, tools, and objects.
    #[serde(default)]
    pub instance: ReconInstance,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ReconConfig {
    /// Load configuration from a YAML file, apply environment overrides,
    /// and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment overrides,
    /// and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override settings with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is not a valid number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override settings from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a value is not a valid number.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("RECON_SEED") {
            self.simulation.seed = parse_override("RECON_SEED", &val)?;
        }
        if let Some(val) = lookup("RECON_HORIZON") {
            self.simulation.horizon = parse_override("RECON_HORIZON", &val)?;
        }
        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let discount = self.simulation.discount;
        if discount.is_nan() || discount <= 0.0 || discount > 1.0 {
            return Err(ConfigError::Invalid {
                reason: format!("simulation.discount must be in (0, 1], got {discount}"),
            });
        }
        let probabilities = [
            ("instance.detect_prob", self.instance.detect_prob),
            ("instance.detect_prob_damaged", self.instance.detect_prob_damaged),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    reason: format!("{name} must be in [0, 1], got {value}"),
                });
            }
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, val: &str) -> Result<T, ConfigError> {
    val.trim().parse().map_err(|_parse_err| ConfigError::Invalid {
        reason: format!("{key} is not a valid number: {val:?}"),
    })
}

/// Which policy drives the episodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// One random ground instance of the first declared action.
    #[default]
    Random,
    /// One random ground instance of any action.
    RandomAny,
    /// No actions.
    Noop,
}

/// Simulation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Seed for Bernoulli draws and the random policy.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Steps per episode.
    #[serde(default = "default_horizon")]
    pub horizon: u64,

    /// Per-step reward discount.
    #[serde(default = "default_discount")]
    pub discount: f64,

    /// Number of episodes to run.
    #[serde(default = "default_episodes")]
    pub episodes: u32,

    /// Policy selecting actions.
    #[serde(default)]
    pub policy: PolicyKind,
}

impl SimulationConfig {
    /// Horizon and discount as runner settings.
    pub const fn episode_settings(&self) -> EpisodeSettings {
        EpisodeSettings {
            horizon: self.horizon,
            discount: self.discount,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            horizon: default_horizon(),
            discount: default_discount(),
            episodes: default_episodes(),
            policy: PolicyKind::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_seed() -> u64 {
    42
}

const fn default_horizon() -> u64 {
    40
}

const fn default_discount() -> f64 {
    1.0
}

const fn default_episodes() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_owned()
}
