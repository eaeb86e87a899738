//! Object registry, variable schema, and fluent store for the Recon simulation.
//!
//! This crate models the relational world the MDP is evaluated over: the
//! finite object domains of each type, the declared variable signatures,
//! and the current values of non-fluents and state-fluents.
//!
//! # Modules
//!
//! - [`error`] -- Error types for world operations.
//! - [`registry`] -- [`ObjectRegistry`]: typed object domains and lazy
//!   enumeration of argument tuples.
//! - [`schema`] -- [`Schema`]: variable declarations and ground-variable
//!   signature checks.
//! - [`store`] -- [`FluentStore`]: immutable non-fluents, the committed
//!   state snapshot, and the staging area for the next state.

pub mod error;
pub mod registry;
pub mod schema;
pub mod store;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use registry::{Groundings, ObjectRegistry};
pub use schema::Schema;
pub use store::FluentStore;
