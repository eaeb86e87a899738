//! Action assignment supplied by the policy each step.
//!
//! An [`ActionAssignment`] maps ground action-fluents to booleans. Any
//! ground action not listed is `false`, so a policy only needs to name the
//! actions it turns on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::structs::GroundVariable;

/// A mapping from ground action-fluents to booleans, defaulting to `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(GroundVariable, bool)>", into = "Vec<(GroundVariable, bool)>")]
pub struct ActionAssignment {
    /// Explicitly assigned actions.
    values: BTreeMap<GroundVariable, bool>,
}

impl ActionAssignment {
    /// Create an empty assignment (every action `false`).
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Build an assignment with each of the given actions set to `true`.
    pub fn with_true(actions: impl IntoIterator<Item = GroundVariable>) -> Self {
        Self {
            values: actions.into_iter().map(|a| (a, true)).collect(),
        }
    }

    /// Set a ground action to the given value.
    pub fn set(&mut self, action: GroundVariable, value: bool) {
        self.values.insert(action, value);
    }

    /// Look up a ground action. Unlisted actions are `false`.
    pub fn get(&self, action: &GroundVariable) -> bool {
        self.values.get(action).copied().unwrap_or(false)
    }

    /// Iterate over every explicitly listed ground action and its value.
    pub fn iter(&self) -> impl Iterator<Item = (&GroundVariable, bool)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    /// Iterate over the ground actions that are `true`.
    pub fn iter_true(&self) -> impl Iterator<Item = &GroundVariable> {
        self.values.iter().filter(|(_, v)| **v).map(|(k, _)| k)
    }

    /// Return `true` if no action is set to `true`.
    pub fn is_noop(&self) -> bool {
        self.iter_true().next().is_none()
    }

    /// Number of explicitly listed actions.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return `true` if no action is explicitly listed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<(GroundVariable, bool)>> for ActionAssignment {
    fn from(entries: Vec<(GroundVariable, bool)>) -> Self {
        Self {
            values: entries.into_iter().collect(),
        }
    }
}

impl From<ActionAssignment> for Vec<(GroundVariable, bool)> {
    fn from(assignment: ActionAssignment) -> Self {
        assignment.values.into_iter().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ids::ObjectRef;

    fn up(agent: &str) -> GroundVariable {
        GroundVariable::new("up", vec![ObjectRef::new("agent", agent)])
    }

    #[test]
    fn unlisted_actions_are_false() {
        let actions = ActionAssignment::with_true([up("a1")]);
        assert!(actions.get(&up("a1")));
        assert!(!actions.get(&up("a2")));
    }

    #[test]
    fn explicit_false_is_noop() {
        let mut actions = ActionAssignment::new();
        actions.set(up("a1"), false);
        assert!(actions.is_noop());
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn serde_round_trip_keeps_entries() {
        let actions = ActionAssignment::with_true([up("a1")]);
        let json = serde_json::to_string(&actions).unwrap();
        let back: ActionAssignment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, actions);
    }
}
