//! Step callback that logs each step of an episode.

use recon_core::StepResult;
use recon_core::runner::StepCallback;
use recon_types::ActionAssignment;
use tracing::debug;

/// Logs every step at debug level and tracks the running reward.
#[derive(Debug, Default)]
pub struct TraceCallback {
    /// Steps seen across all episodes.
    steps: u64,
    /// Steps with a non-zero reward.
    rewarded_steps: u64,
}

impl TraceCallback {
    /// Create a callback with zeroed counters.
    pub const fn new() -> Self {
        Self {
            steps: 0,
            rewarded_steps: 0,
        }
    }

    /// Steps seen across all episodes.
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Steps whose reward was non-zero.
    pub const fn rewarded_steps(&self) -> u64 {
        self.rewarded_steps
    }
}

impl StepCallback for TraceCallback {
    fn on_step(&mut self, actions: &ActionAssignment, result: &StepResult) {
        self.steps = self.steps.saturating_add(1);
        if result.reward.abs() > f64::EPSILON {
            self.rewarded_steps = self.rewarded_steps.saturating_add(1);
        }

        let chosen: Vec<String> = actions.iter_true().map(ToString::to_string).collect();
        debug!(
            step = result.step,
            reward = result.reward,
            actions = ?chosen,
            bernoulli_draws = result.stats.bernoulli_draws,
            true_fluents = result.next_state.true_fluents().count(),
            "Step"
        );
    }
}
