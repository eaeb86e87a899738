//! Variable declarations and ground-variable signature checks.

use std::collections::BTreeMap;

use recon_types::{GroundVariable, TypeName, VarName, VariableDecl, VariableKind};

use crate::error::WorldError;
use crate::registry::ObjectRegistry;

/// The declared variable symbols of a domain.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Declarations keyed by variable name.
    decls: BTreeMap<VarName, VariableDecl>,

    /// Variable names in declaration order.
    order: Vec<VarName>,
}

impl Schema {
    /// Create an empty schema.
    pub const fn new() -> Self {
        Self {
            decls: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// Add a declaration.
    ///
    /// Every parameter type must already be registered and the default
    /// value must match the declared range.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateVariable`], [`WorldError::UnknownType`],
    /// or [`WorldError::ValueTypeMismatch`] for a default of the wrong range.
    pub fn declare(
        &mut self,
        decl: VariableDecl,
        registry: &ObjectRegistry,
    ) -> Result<(), WorldError> {
        if self.decls.contains_key(&decl.name) {
            return Err(WorldError::DuplicateVariable(decl.name));
        }
        for param in &decl.params {
            if !registry.has_type(param) {
                return Err(WorldError::UnknownType(param.clone()));
            }
        }
        if decl.default.range() != decl.range {
            return Err(WorldError::ValueTypeMismatch {
                ground: GroundVariable::nullary(decl.name.clone()),
                expected: decl.range,
                actual: decl.default.range(),
            });
        }

        self.order.push(decl.name.clone());
        self.decls.insert(decl.name.clone(), decl);
        Ok(())
    }

    /// Look up a declaration by name.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UndeclaredVariable`] if the name is unknown.
    pub fn get(&self, name: &VarName) -> Result<&VariableDecl, WorldError> {
        self.decls
            .get(name)
            .ok_or_else(|| WorldError::UndeclaredVariable(name.clone()))
    }

    /// Iterate over all declarations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &VariableDecl> {
        self.order.iter().filter_map(|name| self.decls.get(name))
    }

    /// Iterate over the declarations of one kind, in declaration order.
    pub fn of_kind(&self, kind: VariableKind) -> impl Iterator<Item = &VariableDecl> {
        self.iter().filter(move |decl| decl.kind == kind)
    }

    /// Number of declared variables.
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Return `true` if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Check a ground variable against its declared signature.
    ///
    /// Verifies that the variable is declared, that the argument count
    /// matches, and that each argument has the declared type and belongs to
    /// that type's domain.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UndeclaredVariable`], [`WorldError::ArityMismatch`],
    /// [`WorldError::ArgumentTypeMismatch`], or [`WorldError::UnknownObject`].
    pub fn check_ground(
        &self,
        ground: &GroundVariable,
        registry: &ObjectRegistry,
    ) -> Result<&VariableDecl, WorldError> {
        let decl = self.get(&ground.name)?;
        check_arity(&decl.name, &decl.params, ground.args.len())?;

        for (position, (arg, expected)) in ground.args.iter().zip(&decl.params).enumerate() {
            if &arg.type_name != expected {
                return Err(WorldError::ArgumentTypeMismatch {
                    variable: decl.name.clone(),
                    position,
                    expected: expected.clone(),
                    actual: arg.type_name.clone(),
                });
            }
            if !registry.contains(arg) {
                return Err(WorldError::unknown_object(arg));
            }
        }
        Ok(decl)
    }

    /// Enumerate every ground instance of a declared variable.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UndeclaredVariable`] or
    /// [`WorldError::UnknownType`].
    pub fn ground_instances(
        &self,
        name: &VarName,
        registry: &ObjectRegistry,
    ) -> Result<Vec<GroundVariable>, WorldError> {
        let decl = self.get(name)?;
        Ok(registry
            .all_groundings(&decl.params)?
            .map(|args| GroundVariable::new(decl.name.clone(), args))
            .collect())
    }
}

/// Verify that `actual` arguments match a declared parameter list.
///
/// # Errors
///
/// Returns [`WorldError::ArityMismatch`] when the counts differ.
pub fn check_arity(
    variable: &VarName,
    params: &[TypeName],
    actual: usize,
) -> Result<(), WorldError> {
    if params.len() == actual {
        Ok(())
    } else {
        Err(WorldError::ArityMismatch {
            variable: variable.clone(),
            expected: params.len(),
            actual,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use recon_types::{ObjectName, ObjectRef, Value};

    use super::*;

    fn setup() -> (ObjectRegistry, Schema) {
        let mut registry = ObjectRegistry::new();
        registry
            .register_type(TypeName::from("tool"), [ObjectName::from("cam")])
            .unwrap();
        registry
            .register_type(TypeName::from("obj"), [ObjectName::from("o1")])
            .unwrap();

        let mut schema = Schema::new();
        schema
            .declare(
                VariableDecl::boolean(
                    "damaged",
                    VariableKind::StateFluent,
                    [TypeName::from("tool")],
                ),
                &registry,
            )
            .unwrap();
        (registry, schema)
    }

    #[test]
    fn check_ground_accepts_matching_signature() {
        let (registry, schema) = setup();
        let g = GroundVariable::new("damaged", vec![ObjectRef::new("tool", "cam")]);
        assert!(schema.check_ground(&g, &registry).is_ok());
    }

    #[test]
    fn check_ground_rejects_wrong_arity() {
        let (registry, schema) = setup();
        let g = GroundVariable::nullary("damaged");
        assert!(matches!(
            schema.check_ground(&g, &registry),
            Err(WorldError::ArityMismatch {
                expected: 1,
                actual: 0,
                ..
            })
        ));
    }

    #[test]
    fn check_ground_rejects_wrong_type() {
        let (registry, schema) = setup();
        let g = GroundVariable::new("damaged", vec![ObjectRef::new("obj", "o1")]);
        assert!(matches!(
            schema.check_ground(&g, &registry),
            Err(WorldError::ArgumentTypeMismatch { position: 0, .. })
        ));
    }

    #[test]
    fn check_ground_rejects_unknown_object() {
        let (registry, schema) = setup();
        let g = GroundVariable::new("damaged", vec![ObjectRef::new("tool", "drill")]);
        assert!(matches!(
            schema.check_ground(&g, &registry),
            Err(WorldError::UnknownObject { .. })
        ));
    }

    #[test]
    fn undeclared_variable_is_rejected() {
        let (registry, schema) = setup();
        let g = GroundVariable::nullary("fuel");
        assert!(matches!(
            schema.check_ground(&g, &registry),
            Err(WorldError::UndeclaredVariable(_))
        ));
    }

    #[test]
    fn declare_rejects_unknown_param_type_and_bad_default() {
        let (registry, mut schema) = setup();
        let err = schema.declare(
            VariableDecl::boolean("at", VariableKind::StateFluent, [TypeName::from("x_pos")]),
            &registry,
        );
        assert!(matches!(err, Err(WorldError::UnknownType(_))));

        let err = schema.declare(
            VariableDecl::boolean("flag", VariableKind::NonFluent, []).with_default(Value::Real(1.0)),
            &registry,
        );
        assert!(matches!(err, Err(WorldError::ValueTypeMismatch { .. })));
    }

    #[test]
    fn of_kind_keeps_declaration_order() {
        let (registry, mut schema) = setup();
        schema
            .declare(
                VariableDecl::boolean("pictureTaken", VariableKind::StateFluent, [TypeName::from("obj")]),
                &registry,
            )
            .unwrap();
        let names: Vec<&str> = schema
            .of_kind(VariableKind::StateFluent)
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["damaged", "pictureTaken"]);
    }
}
