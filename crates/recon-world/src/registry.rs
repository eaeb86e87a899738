//! Typed object domains and ground-term enumeration.
//!
//! The registry owns the finite, ordered domain of every object type. All
//! quantification in the evaluator and all grounding in the transition
//! engine goes through [`ObjectRegistry::all_groundings`], which enumerates
//! the cross product of parameter domains lazily.
//!
//! # Enumeration order
//!
//! Tuples are produced argument-position-major: the first position varies
//! slowest and the last fastest, and objects within each position appear in
//! declaration order. For `(x_pos, y_pos)` with `x = [x0, x1]` and
//! `y = [y0, y1]` the order is `(x0, y0), (x0, y1), (x1, y0), (x1, y1)`.

use std::collections::{BTreeMap, BTreeSet};

use recon_types::{ObjectName, ObjectRef, TypeName};

use crate::error::WorldError;

/// Finite object domains for each registered type.
#[derive(Debug, Clone, Default)]
pub struct ObjectRegistry {
    /// Type name to its objects, in declaration order.
    domains: BTreeMap<TypeName, Vec<ObjectRef>>,

    /// Type names in registration order.
    order: Vec<TypeName>,
}

impl ObjectRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            domains: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a type with its ordered object domain.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateType`] if the type was already
    /// registered, or [`WorldError::DuplicateObject`] if an object name
    /// appears twice in `objects`.
    pub fn register_type(
        &mut self,
        type_name: TypeName,
        objects: impl IntoIterator<Item = ObjectName>,
    ) -> Result<(), WorldError> {
        if self.domains.contains_key(&type_name) {
            return Err(WorldError::DuplicateType(type_name));
        }

        let mut seen = BTreeSet::new();
        let mut domain = Vec::new();
        for name in objects {
            if !seen.insert(name.clone()) {
                return Err(WorldError::DuplicateObject {
                    type_name,
                    object: name.to_string(),
                });
            }
            domain.push(ObjectRef {
                type_name: type_name.clone(),
                name,
            });
        }

        self.order.push(type_name.clone());
        self.domains.insert(type_name, domain);
        Ok(())
    }

    /// Return the ordered object domain of a type.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownType`] if the type was never registered.
    pub fn resolve_domain(&self, type_name: &TypeName) -> Result<&[ObjectRef], WorldError> {
        self.domains
            .get(type_name)
            .map(Vec::as_slice)
            .ok_or_else(|| WorldError::UnknownType(type_name.clone()))
    }

    /// Return `true` if the type is registered.
    pub fn has_type(&self, type_name: &TypeName) -> bool {
        self.domains.contains_key(type_name)
    }

    /// Return `true` if the object belongs to its type's domain.
    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.domains
            .get(&object.type_name)
            .is_some_and(|domain| domain.contains(object))
    }

    /// Registered type names in registration order.
    pub fn type_names(&self) -> &[TypeName] {
        &self.order
    }

    /// Lazily enumerate every argument tuple for a parameter signature.
    ///
    /// An empty signature yields exactly one empty tuple; a signature with
    /// any empty domain yields nothing.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownType`] if any parameter type is not
    /// registered.
    pub fn all_groundings(&self, params: &[TypeName]) -> Result<Groundings<'_>, WorldError> {
        let domains = params
            .iter()
            .map(|t| self.resolve_domain(t))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Groundings::new(domains))
    }

    /// Number of argument tuples [`all_groundings`] would produce, saturating
    /// at `usize::MAX`.
    ///
    /// [`all_groundings`]: ObjectRegistry::all_groundings
    pub fn grounding_count(&self, params: &[TypeName]) -> Result<usize, WorldError> {
        let mut count: usize = 1;
        for t in params {
            count = count.saturating_mul(self.resolve_domain(t)?.len());
        }
        Ok(count)
    }
}

/// Lazy cross-product iterator over parameter domains.
///
/// Produced by [`ObjectRegistry::all_groundings`].
#[derive(Debug, Clone)]
pub struct Groundings<'a> {
    /// One domain per parameter position.
    domains: Vec<&'a [ObjectRef]>,
    /// Current index into each domain (an odometer).
    cursor: Vec<usize>,
    /// Set once every tuple has been produced.
    exhausted: bool,
}

impl<'a> Groundings<'a> {
    fn new(domains: Vec<&'a [ObjectRef]>) -> Self {
        let exhausted = domains.iter().any(|d| d.is_empty());
        let cursor = vec![0; domains.len()];
        Self {
            domains,
            cursor,
            exhausted,
        }
    }

    /// Advance the odometer, last position fastest. Marks the iterator
    /// exhausted once every position has wrapped.
    fn advance(&mut self) {
        for (index, domain) in self.cursor.iter_mut().zip(&self.domains).rev() {
            let next = index.saturating_add(1);
            if next < domain.len() {
                *index = next;
                return;
            }
            *index = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for Groundings<'_> {
    type Item = Vec<ObjectRef>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let tuple = self
            .cursor
            .iter()
            .zip(&self.domains)
            .map(|(&i, domain)| domain.get(i).cloned())
            .collect::<Option<Vec<_>>>();
        self.advance();
        tuple
    }
}
