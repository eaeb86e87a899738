//! Step driver: the simulator's single `Ready -> Ready` transition.
//!
//! Each call to [`Simulator::step`]:
//!
//! 1. **Validate** -- every assigned action must be a declared action-fluent
//!    with a well-typed argument tuple. Any combination of valid actions is
//!    accepted.
//! 2. **Reward** -- evaluate the reward on the pre-transition state.
//! 3. **Transition** -- compute and stage every ground next-state value.
//! 4. **Commit** -- swap the staged values in.
//! 5. **Advance** -- increment the step clock.
//!
//! A failure in steps 1 to 3 leaves the committed state untouched.

use recon_types::{ActionAssignment, StateSnapshot, VariableKind};
use recon_world::{FluentStore, WorldError};
use tracing::debug;

use crate::clock::{ClockError, StepClock};
use crate::domain::Domain;
use crate::eval::EvalError;
use crate::reward::compute_reward;
use crate::sampling::{SampleSource, SeededStreams};
use crate::transition::{TransitionEngine, TransitionStats};

/// Errors that can occur during a step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Reward or transition evaluation failed.
    #[error("evaluation error: {source}")]
    Eval {
        /// The underlying evaluation error.
        #[from]
        source: EvalError,
    },

    /// An action or state lookup failed validation.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The step clock overflowed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// The step number just completed (1 for the first step).
    pub step: u64,
    /// Reward of the actions in the pre-transition state.
    pub reward: f64,
    /// Every ground state-fluent after commit.
    pub next_state: StateSnapshot,
    /// Transition counters.
    pub stats: TransitionStats,
}

/// A loaded domain plus its evolving state.
pub struct Simulator {
    /// CPFs and reward.
    domain: Domain,
    /// Non-fluents and state-fluents.
    store: FluentStore,
    /// Uniform draws for Bernoulli outcomes.
    sampler: Box<dyn SampleSource>,
    /// Committed steps since the last reset.
    clock: StepClock,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("domain", &self.domain.name())
            .field("instance", &self.domain.instance_name())
            .field("step", &self.clock.step())
            .finish_non_exhaustive()
    }
}

impl Simulator {
    /// Create a simulator with an injected sample source.
    pub fn new(domain: Domain, store: FluentStore, sampler: Box<dyn SampleSource>) -> Self {
        Self {
            domain,
            store,
            sampler,
            clock: StepClock::new(),
        }
    }

    /// Create a simulator whose draws come from [`SeededStreams`].
    pub fn with_seed(domain: Domain, store: FluentStore, seed: u64) -> Self {
        Self::new(domain, store, Box::new(SeededStreams::new(seed)))
    }

    /// Advance the world by one step.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::World`] for an invalid action,
    /// [`StepError::Eval`] if the reward or a transition fails to evaluate,
    /// and [`StepError::Clock`] on step counter overflow. The committed state
    /// is unchanged on error.
    pub fn step(&mut self, actions: &ActionAssignment) -> Result<StepResult, StepError> {
        self.validate_actions(actions)?;
        let step = self.clock.peek_next()?;

        let reward = compute_reward(&self.domain, &self.store, actions)?;
        let stats = TransitionEngine::new(&self.domain).stage_all(
            &mut self.store,
            actions,
            self.sampler.as_mut(),
            step,
        )?;
        let committed = self.store.commit();
        self.clock.advance()?;

        let next_state = self.store.snapshot()?;
        debug!(
            step,
            reward,
            committed,
            bernoulli_draws = stats.bernoulli_draws,
            actions = actions.iter_true().count(),
            "Step complete"
        );

        Ok(StepResult {
            step,
            reward,
            next_state,
            stats,
        })
    }

    /// Restore the initial state and the step clock, and move the sampler
    /// on to the next episode.
    pub fn reset(&mut self) {
        self.store.reset();
        self.clock.reset();
        self.sampler.reset();
        debug!(instance = self.domain.instance_name(), "Simulator reset");
    }

    /// Every ground state-fluent of the committed state.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the schema references an unknown type.
    pub fn state(&self) -> Result<StateSnapshot, WorldError> {
        self.store.snapshot()
    }

    /// The loaded domain.
    pub const fn domain(&self) -> &Domain {
        &self.domain
    }

    /// The fluent store.
    pub const fn store(&self) -> &FluentStore {
        &self.store
    }

    /// Steps committed since the last reset.
    pub const fn current_step(&self) -> u64 {
        self.clock.step()
    }

    /// Check every assigned action against the schema.
    fn validate_actions(&self, actions: &ActionAssignment) -> Result<(), WorldError> {
        let schema = self.store.schema();
        for (action, _) in actions.iter() {
            let decl = schema.check_ground(action, self.store.registry())?;
            if decl.kind != VariableKind::ActionFluent {
                return Err(WorldError::WrongVariableKind {
                    variable: decl.name.clone(),
                    expected: VariableKind::ActionFluent,
                    actual: decl.kind,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use recon_types::{GroundVariable, ObjectRef, Value};

    use super::*;
    use crate::recon::{Cell, Direction, ReconInstance, agent_at, damaged, move_agent};

    fn simulator() -> Simulator {
        let (domain, store) = ReconInstance::default().load().unwrap();
        Simulator::with_seed(domain, store, 42)
    }

    #[test]
    fn step_moves_the_agent_and_counts() {
        let mut sim = simulator();
        let actions = ActionAssignment::with_true([move_agent("a1", Direction::Up)]);
        let result = sim.step(&actions).unwrap();
        assert_eq!(result.step, 1);
        assert_eq!(sim.current_step(), 1);
        assert!(result.next_state.is_true(&agent_at("a1", Cell::new(0, 1))));
        assert!(!result.next_state.is_true(&agent_at("a1", Cell::new(0, 0))));
        assert_eq!(result.next_state.len(), sim.store().state_instance_count().unwrap());
    }

    #[test]
    fn moving_off_the_grid_stays_put() {
        let mut sim = simulator();
        let actions = ActionAssignment::with_true([move_agent("a1", Direction::Down)]);
        let result = sim.step(&actions).unwrap();
        assert!(result.next_state.is_true(&agent_at("a1", Cell::new(0, 0))));
    }

    #[test]
    fn invalid_actions_are_rejected_without_side_effects() {
        let mut sim = simulator();
        let before = sim.state().unwrap();

        let not_an_action = ActionAssignment::with_true([damaged("camera")]);
        assert!(matches!(
            sim.step(&not_an_action),
            Err(StepError::World {
                source: WorldError::WrongVariableKind { .. }
            })
        ));

        let unknown = ActionAssignment::with_true([GroundVariable::new(
            "jump",
            vec![ObjectRef::new("agent", "a1")],
        )]);
        assert!(matches!(
            sim.step(&unknown),
            Err(StepError::World {
                source: WorldError::UndeclaredVariable(_)
            })
        ));

        let bad_arity = ActionAssignment::with_true([GroundVariable::nullary("up")]);
        assert!(matches!(
            sim.step(&bad_arity),
            Err(StepError::World {
                source: WorldError::ArityMismatch { .. }
            })
        ));

        assert_eq!(sim.state().unwrap(), before);
        assert_eq!(sim.current_step(), 0);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut sim = simulator();
        let before = sim.state().unwrap();
        sim.step(&ActionAssignment::with_true([move_agent("a1", Direction::Right)]))
            .unwrap();
        assert_ne!(sim.state().unwrap(), before);
        sim.reset();
        assert_eq!(sim.state().unwrap(), before);
        assert_eq!(sim.current_step(), 0);
        assert_eq!(
            sim.store().get(&agent_at("a1", Cell::new(0, 0))).unwrap(),
            Value::TRUE
        );
    }
}
