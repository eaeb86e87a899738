//! Type-safe name wrappers for the relational vocabulary.
//!
//! Types, objects, and variables are all identified by strings in a domain
//! description. Wrapping each in its own newtype prevents accidentally
//! passing an object name where a variable name is expected.
//!
//! Objects are never identified by name alone: an [`ObjectRef`] carries the
//! object's type as well, so `x_pos:1` and `y_pos:1` compare unequal even
//! though they share a name.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_name {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new name from anything convertible to a [`String`].
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Borrow the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(String::from(name))
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }
    };
}

define_name! {
    /// Name of an object type (e.g. `x_pos`, `agent`, `tool`).
    TypeName
}

define_name! {
    /// Name of an object within its type's domain (e.g. `x1`, `camera`).
    ObjectName
}

define_name! {
    /// Name of a variable symbol: a fluent (`agentAt`), a non-fluent
    /// (`HAZARD`), or a quantifier/parameter variable (`?x`).
    VarName
}

/// An object qualified by its type.
///
/// Equality and ordering consider the type first, then the name, so two
/// objects from different types are never interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// The type this object belongs to.
    pub type_name: TypeName,
    /// The object's name within its type.
    pub name: ObjectName,
}

impl ObjectRef {
    /// Create an object reference from a type and an object name.
    pub fn new(type_name: impl Into<TypeName>, name: impl Into<ObjectName>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }
}

impl core::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_different_type_is_distinct() {
        let x = ObjectRef::new("x_pos", "1");
        let y = ObjectRef::new("y_pos", "1");
        assert_ne!(x, y);
        assert_eq!(x.name, y.name);
    }

    #[test]
    fn names_display_verbatim() {
        assert_eq!(VarName::from("agentAt").to_string(), "agentAt");
        assert_eq!(ObjectRef::new("tool", "camera").to_string(), "camera");
    }
}
