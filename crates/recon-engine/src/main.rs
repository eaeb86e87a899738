//! Episode runner binary for the Recon simulation.
//!
//! Loads configuration, builds the grid instance, and runs the configured
//! number of episodes with the configured policy.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `recon-config.yaml` (or `RECON_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build and load the Recon instance
//! 4. Create the simulator and policy
//! 5. Run the episodes
//! 6. Log the result

mod error;
mod trace_callback;

use std::path::PathBuf;

use recon_core::Simulator;
use recon_core::config::{LoggingConfig, PolicyKind, ReconConfig};
use recon_core::policy::{ActionScope, NoopPolicy, Policy, RandomBoolPolicy};
use recon_core::runner;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::trace_callback::TraceCallback;

/// Default configuration path, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "recon-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, instance loading, or an episode fails.
fn main() -> Result<(), EngineError> {
    // 1. Load configuration. Logging is configured from it, so failures
    // here surface through the returned error.
    let (config, config_path) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("recon-engine starting");
    info!(
        path = %config_path.display(),
        seed = config.simulation.seed,
        horizon = config.simulation.horizon,
        discount = config.simulation.discount,
        episodes = config.simulation.episodes,
        policy = ?config.simulation.policy,
        "Configuration loaded"
    );

    // 3. Build the instance.
    let (domain, store) = config.instance.load()?;
    info!(
        domain = domain.name(),
        instance = domain.instance_name(),
        transitions = domain.cpfs().len(),
        "Instance loaded"
    );

    // 4. Create the simulator and policy.
    let seed = config.simulation.seed;
    let mut sim = Simulator::with_seed(domain, store, seed);
    let mut policy = build_policy(config.simulation.policy, seed);
    let mut callback = TraceCallback::new();

    // 5. Run the episodes.
    let settings = config.simulation.episode_settings();
    let results = runner::run_episodes(
        &mut sim,
        policy.as_mut(),
        &settings,
        config.simulation.episodes,
        &mut callback,
    )?;

    // 6. Log results.
    if let Some(last) = results.last() {
        let final_state = serde_json::to_string(&last.final_state)?;
        debug!(final_state = %final_state, "Final state of last episode");
    }
    info!(
        episodes = results.len(),
        steps = callback.steps(),
        rewarded_steps = callback.rewarded_steps(),
        mean_total_reward = runner::mean_total_reward(&results),
        "recon-engine finished"
    );

    Ok(())
}

/// Load configuration from `RECON_CONFIG` or `recon-config.yaml`.
///
/// A missing file falls back to defaults, still subject to environment
/// overrides and validation.
fn load_config() -> Result<(ReconConfig, PathBuf), EngineError> {
    let path = std::env::var_os("RECON_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = ReconConfig::from_file(&path)?;
        return Ok((config, path));
    }
    let mut config = ReconConfig::default();
    config.apply_env_overrides()?;
    config.validate()?;
    Ok((config, path))
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Build the configured policy, seeded from the world seed.
fn build_policy(kind: PolicyKind, seed: u64) -> Box<dyn Policy> {
    match kind {
        PolicyKind::Random => Box::new(RandomBoolPolicy::from_seed(seed)),
        PolicyKind::RandomAny => {
            Box::new(RandomBoolPolicy::from_seed(seed).with_scope(ActionScope::AllDeclared))
        }
        PolicyKind::Noop => Box::new(NoopPolicy::new()),
    }
}
