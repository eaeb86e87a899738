//! Enumeration types describing variable declarations.

use serde::{Deserialize, Serialize};

/// The role a variable plays in the MDP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// A fact fixed for the whole simulation (adjacency, hazards, tool roles).
    NonFluent,
    /// A time-varying property of the world, updated once per step.
    StateFluent,
    /// A decision variable set by the acting policy each step.
    ActionFluent,
}

impl VariableKind {
    /// Human-readable label for logging and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NonFluent => "non-fluent",
            Self::StateFluent => "state-fluent",
            Self::ActionFluent => "action-fluent",
        }
    }
}

impl core::fmt::Display for VariableKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value range of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRange {
    /// Boolean-valued.
    Bool,
    /// Real-valued.
    Real,
}

impl core::fmt::Display for ValueRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Real => f.write_str("real"),
        }
    }
}
