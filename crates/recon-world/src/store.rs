//! Fluent store: non-fluent facts, committed state, and next-state staging.
//!
//! The store holds three layers of values:
//!
//! - **Non-fluents** -- fixed at construction, never mutated afterwards.
//! - **Current state** -- the committed state-fluent values every read
//!   during a step observes.
//! - **Staging** -- next-state values written by the transition engine.
//!   Staging is invisible to reads until [`FluentStore::commit`] swaps it
//!   in, so every next-value computation in a step sees the same
//!   pre-step snapshot.
//!
//! Ground instances that were never explicitly set read as their declared
//! default. Action-fluents are not stored here; they arrive with each step's
//! [`ActionAssignment`](recon_types::ActionAssignment).

use std::collections::BTreeMap;

use recon_types::{GroundVariable, StateSnapshot, Value, VariableDecl, VariableKind};
use tracing::debug;

use crate::error::WorldError;
use crate::registry::ObjectRegistry;
use crate::schema::Schema;

/// Current values of non-fluents and state-fluents.
#[derive(Debug, Clone)]
pub struct FluentStore {
    /// Object domains.
    registry: ObjectRegistry,
    /// Variable declarations.
    schema: Schema,
    /// Non-fluent values explicitly set by the instance.
    non_fluents: BTreeMap<GroundVariable, Value>,
    /// Initial state-fluent overrides, kept for [`FluentStore::reset`].
    initial: BTreeMap<GroundVariable, Value>,
    /// Committed state-fluent values (sparse: unset instances use defaults).
    current: BTreeMap<GroundVariable, Value>,
    /// Next-state values awaiting commit.
    staged: BTreeMap<GroundVariable, Value>,
}

impl FluentStore {
    /// Build a store from a registry, schema, non-fluent values, and
    /// initial state overrides.
    ///
    /// Every entry is validated against the schema: it must be a ground
    /// instance of a declared variable of the right kind, and its value
    /// must match the variable's range.
    ///
    /// # Errors
    ///
    /// Returns the first [`WorldError`] encountered while validating an
    /// entry.
    pub fn new(
        registry: ObjectRegistry,
        schema: Schema,
        non_fluents: impl IntoIterator<Item = (GroundVariable, Value)>,
        initial_state: impl IntoIterator<Item = (GroundVariable, Value)>,
    ) -> Result<Self, WorldError> {
        let mut checked_non_fluents = BTreeMap::new();
        for (ground, value) in non_fluents {
            check_entry(&schema, &registry, &ground, value, VariableKind::NonFluent)?;
            checked_non_fluents.insert(ground, value);
        }

        let mut initial = BTreeMap::new();
        for (ground, value) in initial_state {
            check_entry(&schema, &registry, &ground, value, VariableKind::StateFluent)?;
            initial.insert(ground, value);
        }

        debug!(
            non_fluents = checked_non_fluents.len(),
            initial_overrides = initial.len(),
            "Fluent store initialized"
        );

        Ok(Self {
            registry,
            schema,
            non_fluents: checked_non_fluents,
            current: initial.clone(),
            initial,
            staged: BTreeMap::new(),
        })
    }

    /// The object registry this store is grounded over.
    pub const fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    /// The variable declarations this store validates against.
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Read a non-fluent or state-fluent from the committed snapshot.
    ///
    /// Unset ground instances return the declared default.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UndeclaredVariable`] or a signature error if
    /// the ground variable does not match its declaration, and
    /// [`WorldError::WrongVariableKind`] for action-fluents.
    pub fn get(&self, ground: &GroundVariable) -> Result<Value, WorldError> {
        let decl = self.schema.check_ground(ground, &self.registry)?;
        let layer = match decl.kind {
            VariableKind::NonFluent => &self.non_fluents,
            VariableKind::StateFluent => &self.current,
            VariableKind::ActionFluent => {
                return Err(WorldError::WrongVariableKind {
                    variable: decl.name.clone(),
                    expected: VariableKind::StateFluent,
                    actual: decl.kind,
                });
            }
        };
        Ok(layer.get(ground).copied().unwrap_or(decl.default))
    }

    /// Write a next-state value to the staging area.
    ///
    /// The committed snapshot is untouched until [`FluentStore::commit`].
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::WrongVariableKind`] if the variable is not a
    /// state-fluent, [`WorldError::ValueTypeMismatch`] for a value of the
    /// wrong range, or a signature error.
    pub fn stage(&mut self, ground: GroundVariable, value: Value) -> Result<(), WorldError> {
        check_entry(
            &self.schema,
            &self.registry,
            &ground,
            value,
            VariableKind::StateFluent,
        )?;
        self.staged.insert(ground, value);
        Ok(())
    }

    /// Number of values currently staged.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Drop every staged value without committing.
    pub fn discard_staged(&mut self) {
        self.staged.clear();
    }

    /// Replace the committed values with the staged ones in a single swap
    /// and clear staging. Ground instances that were not staged keep their
    /// previous value. Returns the number of values committed.
    pub fn commit(&mut self) -> usize {
        let staged = std::mem::take(&mut self.staged);
        let count = staged.len();
        self.current.extend(staged);
        count
    }

    /// Restore the initial state and clear staging.
    pub fn reset(&mut self) {
        self.current.clone_from(&self.initial);
        self.staged.clear();
    }

    /// Materialize every ground state-fluent of the committed state,
    /// substituting defaults for unset instances.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownType`] if a declaration references an
    /// unregistered type (prevented by [`Schema::declare`]).
    pub fn snapshot(&self) -> Result<StateSnapshot, WorldError> {
        let mut snapshot = StateSnapshot::new();
        for decl in self.schema.of_kind(VariableKind::StateFluent) {
            for args in self.registry.all_groundings(&decl.params)? {
                let ground = GroundVariable::new(decl.name.clone(), args);
                let value = self.current.get(&ground).copied().unwrap_or(decl.default);
                snapshot.insert(ground, value);
            }
        }
        Ok(snapshot)
    }

    /// Total number of ground state-fluent instances.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownType`] for unregistered parameter types.
    pub fn state_instance_count(&self) -> Result<usize, WorldError> {
        let mut total: usize = 0;
        for decl in self.schema.of_kind(VariableKind::StateFluent) {
            total = total.saturating_add(self.registry.grounding_count(&decl.params)?);
        }
        Ok(total)
    }
}

/// Validate one value write against the schema.
fn check_entry<'s>(
    schema: &'s Schema,
    registry: &ObjectRegistry,
    ground: &GroundVariable,
    value: Value,
    expected_kind: VariableKind,
) -> Result<&'s VariableDecl, WorldError> {
    let decl = schema.check_ground(ground, registry)?;
    if decl.kind != expected_kind {
        return Err(WorldError::WrongVariableKind {
            variable: decl.name.clone(),
            expected: expected_kind,
            actual: decl.kind,
        });
    }
    if value.range() != decl.range {
        return Err(WorldError::ValueTypeMismatch {
            ground: ground.clone(),
            expected: decl.range,
            actual: value.range(),
        });
    }
    Ok(decl)
}
