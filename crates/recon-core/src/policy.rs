//! Policy trait and simple implementations.
//!
//! Each step the runner presents the committed state to a [`Policy`] and
//! receives the [`ActionAssignment`] to apply. Planners and learners live
//! outside this crate; the policies here exercise the simulator end-to-end.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use recon_types::{ActionAssignment, GroundVariable, StateSnapshot, VariableKind};
use recon_world::{FluentStore, WorldError};

/// Errors that can occur while selecting actions.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The domain declares no action-fluents.
    #[error("domain declares no action-fluents")]
    NoActionFluents,

    /// No ground action exists to choose from.
    #[error("no ground instances to choose from")]
    NoGroundActions,

    /// Enumerating ground actions failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// A source of per-step actions.
pub trait Policy {
    /// Choose the actions for the upcoming step.
    ///
    /// `step` is the number of steps already taken and `state` the
    /// committed state they produced. `store` gives access to the
    /// registry and schema for enumerating ground actions.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if no valid assignment can be produced.
    fn select_actions(
        &mut self,
        step: u64,
        state: &StateSnapshot,
        store: &FluentStore,
    ) -> Result<ActionAssignment, PolicyError>;
}

/// Always takes no action.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPolicy;

impl NoopPolicy {
    /// Create a no-op policy.
    pub const fn new() -> Self {
        Self
    }
}

impl Policy for NoopPolicy {
    fn select_actions(
        &mut self,
        _step: u64,
        _state: &StateSnapshot,
        _store: &FluentStore,
    ) -> Result<ActionAssignment, PolicyError> {
        Ok(ActionAssignment::new())
    }
}

/// Which ground actions [`RandomBoolPolicy`] chooses among.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionScope {
    /// Only the ground instances of the first declared action-fluent.
    #[default]
    FirstDeclared,
    /// Every ground instance of every action-fluent.
    AllDeclared,
}

/// Sets exactly one ground action to `true`, chosen uniformly at random.
#[derive(Debug, Clone)]
pub struct RandomBoolPolicy<R = SmallRng> {
    /// Random source.
    rng: R,
    /// Candidate actions.
    scope: ActionScope,
}

impl<R: Rng> RandomBoolPolicy<R> {
    /// Choose among the first declared action-fluent's ground instances.
    pub const fn new(rng: R) -> Self {
        Self {
            rng,
            scope: ActionScope::FirstDeclared,
        }
    }

    /// Change the candidate set.
    #[must_use]
    pub const fn with_scope(mut self, scope: ActionScope) -> Self {
        self.scope = scope;
        self
    }

    fn candidates(&self, store: &FluentStore) -> Result<Vec<GroundVariable>, PolicyError> {
        let schema = store.schema();
        let mut actions = schema.of_kind(VariableKind::ActionFluent).peekable();
        if actions.peek().is_none() {
            return Err(PolicyError::NoActionFluents);
        }

        let mut candidates = Vec::new();
        match self.scope {
            ActionScope::FirstDeclared => {
                if let Some(decl) = actions.next() {
                    candidates = schema.ground_instances(&decl.name, store.registry())?;
                }
            }
            ActionScope::AllDeclared => {
                for decl in actions {
                    candidates.extend(schema.ground_instances(&decl.name, store.registry())?);
                }
            }
        }
        Ok(candidates)
    }
}

impl RandomBoolPolicy<SmallRng> {
    /// A policy driven by a [`SmallRng`] seeded from `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Policy for RandomBoolPolicy<R> {
    fn select_actions(
        &mut self,
        _step: u64,
        _state: &StateSnapshot,
        store: &FluentStore,
    ) -> Result<ActionAssignment, PolicyError> {
        let candidates = self.candidates(store)?;
        if candidates.is_empty() {
            return Err(PolicyError::NoGroundActions);
        }
        let choice = self.rng.random_range(0..candidates.len());
        let action = candidates
            .into_iter()
            .nth(choice)
            .ok_or(PolicyError::NoGroundActions)?;
        Ok(ActionAssignment::with_true([action]))
    }
}
