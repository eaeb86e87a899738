//! Episode runner.
//!
//! [`run_episode`] drives the step loop for a fixed horizon: ask the
//! policy for actions, step the simulator, accumulate reward, notify the
//! callback. [`run_episodes`] repeats that from the initial state.
//!
//! The simulator has no terminal state of its own; the horizon is the
//! only stopping condition.

use recon_types::{ActionAssignment, StateSnapshot};
use tracing::info;

use crate::policy::{Policy, PolicyError};
use crate::step::{Simulator, StepError, StepResult};

/// Errors that can occur during an episode.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A step failed.
    #[error("step error: {source}")]
    Step {
        /// The underlying step error.
        #[from]
        source: StepError,
    },

    /// The policy failed to choose actions.
    #[error("policy error: {source}")]
    Policy {
        /// The underlying policy error.
        #[from]
        source: PolicyError,
    },

    /// Reading the initial state failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: recon_world::WorldError,
    },
}

/// Horizon and discount of an episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSettings {
    /// Number of steps to run.
    pub horizon: u64,
    /// Per-step discount factor applied to rewards.
    pub discount: f64,
}

impl Default for EpisodeSettings {
    fn default() -> Self {
        Self {
            horizon: 40,
            discount: 1.0,
        }
    }
}

/// Outcome of one episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeResult {
    /// Steps executed.
    pub steps: u64,
    /// Sum of rewards.
    pub total_reward: f64,
    /// Sum of `discount^t * reward_t`, with `t` starting at 0.
    pub discounted_reward: f64,
    /// State after the last step.
    pub final_state: StateSnapshot,
}

/// Callback invoked after each step.
pub trait StepCallback {
    /// Called after a step completes successfully.
    fn on_step(&mut self, actions: &ActionAssignment, result: &StepResult);
}

/// A no-op step callback.
pub struct NoOpCallback;

impl StepCallback for NoOpCallback {
    fn on_step(&mut self, _actions: &ActionAssignment, _result: &StepResult) {}
}

/// Run one episode from the simulator's current state.
///
/// # Errors
///
/// Returns [`RunnerError`] if the policy or a step fails.
pub fn run_episode(
    sim: &mut Simulator,
    policy: &mut dyn Policy,
    settings: &EpisodeSettings,
    callback: &mut dyn StepCallback,
) -> Result<EpisodeResult, RunnerError> {
    let mut state = sim.state()?;
    let mut total_reward = 0.0;
    let mut discounted_reward = 0.0;
    let mut weight = 1.0;
    let mut steps: u64 = 0;

    while steps < settings.horizon {
        let actions = policy.select_actions(sim.current_step(), &state, sim.store())?;
        let result = sim.step(&actions)?;

        total_reward += result.reward;
        discounted_reward += weight * result.reward;
        weight *= settings.discount;
        steps = steps.saturating_add(1);

        callback.on_step(&actions, &result);
        state = result.next_state;
    }

    Ok(EpisodeResult {
        steps,
        total_reward,
        discounted_reward,
        final_state: state,
    })
}

/// Run `episodes` episodes, resetting the simulator before each.
///
/// # Errors
///
/// Returns [`RunnerError`] from the first failing episode.
pub fn run_episodes(
    sim: &mut Simulator,
    policy: &mut dyn Policy,
    settings: &EpisodeSettings,
    episodes: u32,
    callback: &mut dyn StepCallback,
) -> Result<Vec<EpisodeResult>, RunnerError> {
    let mut results = Vec::new();
    for episode in 0..episodes {
        sim.reset();
        let result = run_episode(sim, policy, settings, callback)?;
        log_episode_end(episode, &result);
        results.push(result);
    }
    Ok(results)
}

/// Mean undiscounted reward over a set of episodes, or 0 for none.
#[allow(clippy::cast_precision_loss)]
pub fn mean_total_reward(results: &[EpisodeResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.total_reward).sum::<f64>() / results.len() as f64
}

/// Log the end of an episode.
pub fn log_episode_end(episode: u32, result: &EpisodeResult) {
    info!(
        episode,
        steps = result.steps,
        total_reward = result.total_reward,
        discounted_reward = result.discounted_reward,
        true_fluents = result.final_state.true_fluents().count(),
        "Episode ended"
    );
}
