//! Committed state of every ground state-fluent.
//!
//! A [`StateSnapshot`] is what the step driver hands back to the policy
//! after each step. It is an ordered map so that iteration (and therefore
//! any serialized trajectory) is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::structs::{GroundVariable, Value};

/// Values of ground state-fluents, ordered by ground variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(GroundVariable, Value)>", into = "Vec<(GroundVariable, Value)>")]
pub struct StateSnapshot {
    /// Ground variable to value.
    values: BTreeMap<GroundVariable, Value>,
}

impl StateSnapshot {
    /// Create an empty snapshot.
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Look up a ground variable.
    pub fn get(&self, ground: &GroundVariable) -> Option<Value> {
        self.values.get(ground).copied()
    }

    /// Return `true` if the ground variable is present and `Value::Bool(true)`.
    pub fn is_true(&self, ground: &GroundVariable) -> bool {
        self.get(ground).is_some_and(Value::is_true)
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, ground: GroundVariable, value: Value) -> Option<Value> {
        self.values.insert(ground, value)
    }

    /// Return `true` if the ground variable has a value.
    pub fn contains(&self, ground: &GroundVariable) -> bool {
        self.values.contains_key(ground)
    }

    /// Iterate over all entries in ground-variable order.
    pub fn iter(&self) -> impl Iterator<Item = (&GroundVariable, Value)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    /// Iterate over the ground variables whose value is `true`.
    pub fn true_fluents(&self) -> impl Iterator<Item = &GroundVariable> {
        self.values
            .iter()
            .filter(|(_, v)| v.is_true())
            .map(|(k, _)| k)
    }

    /// Number of ground variables in the snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return `true` if the snapshot holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<(GroundVariable, Value)>> for StateSnapshot {
    fn from(entries: Vec<(GroundVariable, Value)>) -> Self {
        Self {
            values: entries.into_iter().collect(),
        }
    }
}

impl From<StateSnapshot> for Vec<(GroundVariable, Value)> {
    fn from(snapshot: StateSnapshot) -> Self {
        snapshot.values.into_iter().collect()
    }
}

impl FromIterator<(GroundVariable, Value)> for StateSnapshot {
    fn from_iter<I: IntoIterator<Item = (GroundVariable, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
