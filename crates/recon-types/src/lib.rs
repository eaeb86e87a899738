//! Shared type definitions for the Recon simulation.
//!
//! This crate is the single source of truth for the vocabulary shared by the
//! world model, the formula evaluator, and the step driver.
//!
//! # Modules
//!
//! - [`ids`] -- Name newtypes for types, objects, and variables, plus
//!   [`ObjectRef`], an object qualified by its type
//! - [`enums`] -- Variable kinds and value ranges
//! - [`structs`] -- Values, ground variables, and variable declarations
//! - [`actions`] -- The per-step [`ActionAssignment`]
//! - [`snapshot`] -- The committed [`StateSnapshot`] of all ground state-fluents

pub mod actions;
pub mod enums;
pub mod ids;
pub mod snapshot;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::ActionAssignment;
pub use enums::{ValueRange, VariableKind};
pub use ids::{ObjectName, ObjectRef, TypeName, VarName};
pub use snapshot::StateSnapshot;
pub use structs::{GroundVariable, Value, VariableDecl};
