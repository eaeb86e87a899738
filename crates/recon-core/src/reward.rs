//! Reward computation.
//!
//! The reward is a function of the pre-transition state and the actions
//! taken in it, not of the resulting next state.

use recon_types::ActionAssignment;
use recon_world::FluentStore;

use crate::domain::Domain;
use crate::eval::{Bindings, EvalContext, EvalError};

/// Evaluate the domain's reward against the committed state and `actions`.
///
/// Call before the step's transitions are committed.
///
/// # Errors
///
/// Returns [`EvalError`] if the reward formula fails to evaluate.
pub fn compute_reward(
    domain: &Domain,
    store: &FluentStore,
    actions: &ActionAssignment,
) -> Result<f64, EvalError> {
    EvalContext::new(store, actions).evaluate_real(domain.reward(), &mut Bindings::new())
}
