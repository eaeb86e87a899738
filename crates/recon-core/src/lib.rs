//! Formula evaluation, transitions, rewards, and the step driver for the
//! Recon simulation.
//!
//! A loaded [`Domain`] holds one conditional probability function per
//! state-fluent and a reward formula. Each step evaluates the reward on the
//! pre-transition state, resolves every ground next-state value against a
//! single read-only view, then commits them all at once.
//!
//! # Modules
//!
//! - [`clock`] -- Checked step counter.
//! - [`config`] -- Configuration loading from `recon-config.yaml` into
//!   strongly-typed structs.
//! - [`domain`] -- Domain and instance definitions, load-time checks, and
//!   the loaded [`Domain`].
//! - [`eval`] -- Deterministic formula evaluation under variable bindings.
//! - [`formula`] -- The expression tree for CPFs and rewards.
//! - [`policy`] -- [`Policy`] trait, [`NoopPolicy`], and [`RandomBoolPolicy`].
//! - [`recon`] -- The Recon rover domain and its grid instance builder.
//! - [`reward`] -- Reward evaluation.
//! - [`runner`] -- Horizon-bounded episode loop.
//! - [`sampling`] -- Uniform draws for Bernoulli outcomes.
//! - [`step`] -- The [`Simulator`] and its single-step transition.
//! - [`transition`] -- Outcome resolution and staged next-state computation.
//!
//! [`Domain`]: domain::Domain
//! [`Policy`]: policy::Policy
//! [`NoopPolicy`]: policy::NoopPolicy
//! [`RandomBoolPolicy`]: policy::RandomBoolPolicy
//! [`Simulator`]: step::Simulator

pub mod clock;
pub mod config;
pub mod domain;
pub mod eval;
pub mod formula;
pub mod policy;
pub mod recon;
pub mod reward;
pub mod runner;
pub mod sampling;
pub mod step;
pub mod transition;

pub use domain::{Domain, DomainDef, InstanceDef, LoadError};
pub use formula::Formula;
pub use step::{Simulator, StepError, StepResult};
