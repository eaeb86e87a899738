//! Error types for the `recon-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use recon_types::{GroundVariable, ObjectRef, TypeName, ValueRange, VarName, VariableKind};

/// Errors that can occur during registry, schema, or store operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A type name was referenced but never registered.
    #[error("unknown type: {0}")]
    UnknownType(TypeName),

    /// A type was registered twice.
    #[error("duplicate type: {0}")]
    DuplicateType(TypeName),

    /// The same object name appears twice within one type's domain.
    #[error("duplicate object {object} in type {type_name}")]
    DuplicateObject {
        /// The type whose domain contains the duplicate.
        type_name: TypeName,
        /// The duplicated object name.
        object: String,
    },

    /// An object is not a member of its type's domain.
    #[error("unknown object {object} of type {type_name}")]
    UnknownObject {
        /// The declared type of the object.
        type_name: TypeName,
        /// The object name.
        object: String,
    },

    /// A variable symbol was referenced but never declared.
    #[error("undeclared variable: {0}")]
    UndeclaredVariable(VarName),

    /// A variable symbol was declared twice.
    #[error("duplicate variable: {0}")]
    DuplicateVariable(VarName),

    /// A ground reference supplies the wrong number of arguments.
    #[error("{variable} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        /// The variable symbol.
        variable: VarName,
        /// Declared arity.
        expected: usize,
        /// Supplied arity.
        actual: usize,
    },

    /// A ground reference supplies an argument of the wrong type.
    #[error("{variable} argument {position} expects type {expected}, got {actual}")]
    ArgumentTypeMismatch {
        /// The variable symbol.
        variable: VarName,
        /// Zero-based argument position.
        position: usize,
        /// Declared parameter type.
        expected: TypeName,
        /// Type of the supplied argument.
        actual: TypeName,
    },

    /// An operation required a variable of a different kind.
    #[error("{variable} is a {actual}, expected a {expected}")]
    WrongVariableKind {
        /// The variable symbol.
        variable: VarName,
        /// The kind the operation requires.
        expected: VariableKind,
        /// The declared kind.
        actual: VariableKind,
    },

    /// A value does not belong to the variable's declared range.
    #[error("{ground} has range {expected}, got a {actual} value")]
    ValueTypeMismatch {
        /// The ground variable being written.
        ground: GroundVariable,
        /// Declared range.
        expected: ValueRange,
        /// Range of the supplied value.
        actual: ValueRange,
    },
}

impl WorldError {
    /// Build an [`WorldError::UnknownObject`] from an object reference.
    pub fn unknown_object(object: &ObjectRef) -> Self {
        Self::UnknownObject {
            type_name: object.type_name.clone(),
            object: object.name.to_string(),
        }
    }
}
