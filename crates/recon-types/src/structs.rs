//! Core value and declaration structs.

use serde::{Deserialize, Serialize};

use crate::enums::{ValueRange, VariableKind};
use crate::ids::{ObjectRef, TypeName, VarName};

/// The value of a fluent, non-fluent, or evaluated formula.
///
/// Values are always fully known: there is no null or unknown state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A boolean value.
    Bool(bool),
    /// A real value.
    Real(f64),
}

impl Value {
    /// Shorthand for `Value::Bool(true)`.
    pub const TRUE: Self = Self::Bool(true);

    /// Shorthand for `Value::Bool(false)`.
    pub const FALSE: Self = Self::Bool(false);

    /// Return the range this value belongs to.
    pub const fn range(self) -> ValueRange {
        match self {
            Self::Bool(_) => ValueRange::Bool,
            Self::Real(_) => ValueRange::Real,
        }
    }

    /// Return the boolean payload, or `None` for real values.
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            Self::Real(_) => None,
        }
    }

    /// Return the value as a real number.
    ///
    /// Booleans coerce to `1.0` / `0.0` so that indicator sub-formulas can be
    /// weighted and summed.
    pub const fn as_real(self) -> f64 {
        match self {
            Self::Bool(true) => 1.0,
            Self::Bool(false) => 0.0,
            Self::Real(r) => r,
        }
    }

    /// Return `true` only for `Value::Bool(true)`.
    pub const fn is_true(self) -> bool {
        matches!(self, Self::Bool(true))
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Real(r) => write!(f, "{r}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Self::Real(r)
    }
}

/// A variable symbol with concrete objects substituted for all of its
/// parameters, e.g. `agentAt(rover, x1, y2)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroundVariable {
    /// The variable symbol.
    pub name: VarName,
    /// The argument tuple, typed according to the variable's signature.
    pub args: Vec<ObjectRef>,
}

impl GroundVariable {
    /// Create a ground variable from a name and argument tuple.
    pub fn new(name: impl Into<VarName>, args: Vec<ObjectRef>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Create a ground variable with no arguments (e.g. `DETECT_PROB`).
    pub fn nullary(name: impl Into<VarName>) -> Self {
        Self::new(name, Vec::new())
    }
}

impl core::fmt::Display for GroundVariable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// Declaration of a variable symbol: its kind, range, typed parameters,
/// and default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    /// The variable symbol.
    pub name: VarName,
    /// Whether this is a non-fluent, state-fluent, or action-fluent.
    pub kind: VariableKind,
    /// Value range of every ground instance.
    pub range: ValueRange,
    /// Parameter types, in argument order.
    pub params: Vec<TypeName>,
    /// Value of any ground instance that was never explicitly set.
    pub default: Value,
}

impl VariableDecl {
    /// Declare a boolean variable defaulting to `false`.
    pub fn boolean(
        name: impl Into<VarName>,
        kind: VariableKind,
        params: impl IntoIterator<Item = TypeName>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            range: ValueRange::Bool,
            params: params.into_iter().collect(),
            default: Value::FALSE,
        }
    }

    /// Declare a real-valued variable with the given default.
    pub fn real(
        name: impl Into<VarName>,
        kind: VariableKind,
        params: impl IntoIterator<Item = TypeName>,
        default: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            range: ValueRange::Real,
            params: params.into_iter().collect(),
            default: Value::Real(default),
        }
    }

    /// Override the default value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn booleans_coerce_to_indicator_reals() {
        assert!((Value::TRUE.as_real() - 1.0).abs() < f64::EPSILON);
        assert!(Value::FALSE.as_real().abs() < f64::EPSILON);
        assert!((Value::Real(0.25).as_real() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn only_bool_true_is_true() {
        assert!(Value::TRUE.is_true());
        assert!(!Value::FALSE.is_true());
        assert!(!Value::Real(1.0).is_true());
        assert_eq!(Value::Real(1.0).as_bool(), None);
    }

    #[test]
    fn ground_variable_display() {
        let g = GroundVariable::new(
            "agentAt",
            vec![
                ObjectRef::new("agent", "rover"),
                ObjectRef::new("x_pos", "x1"),
                ObjectRef::new("y_pos", "y2"),
            ],
        );
        assert_eq!(g.to_string(), "agentAt(rover, x1, y2)");
        assert_eq!(GroundVariable::nullary("DETECT_PROB").to_string(), "DETECT_PROB");
    }

    #[test]
    fn value_serializes_untagged() {
        assert_eq!(serde_json::to_string(&Value::TRUE).unwrap(), "true");
        assert_eq!(serde_json::to_string(&Value::Real(0.5)).unwrap(), "0.5");
        let parsed: Value = serde_json::from_str("0.4").unwrap();
        assert_eq!(parsed.range(), ValueRange::Real);
    }
}
