//! Transition engine: compute and stage every ground next-state value.
//!
//! For each CPF and each ground instance of its state-fluent, the CPF body
//! is resolved against the committed snapshot with the instance's
//! arguments bound to the CPF parameters. Case nodes are descended
//! first-match until a leaf is reached; the leaf is either a deterministic
//! value or a Bernoulli probability that is sampled with one uniform draw.
//!
//! All next values are computed before any is staged, so no computation
//! can observe another's result. The caller commits after staging.

use recon_types::{ActionAssignment, GroundVariable, Value};
use recon_world::FluentStore;
use tracing::{debug, warn};

use crate::domain::Domain;
use crate::eval::{Bindings, EvalContext, EvalError};
use crate::formula::Formula;
use crate::sampling::SampleSource;

/// A resolved next-value outcome for one ground instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// The next value is fixed.
    Deterministic(Value),
    /// The next value is `true` with this probability, in `[0, 1]`.
    Bernoulli(f64),
}

/// Counters for one transition pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionStats {
    /// Ground state-fluent instances computed.
    pub ground_instances: usize,
    /// Bernoulli outcomes sampled.
    pub bernoulli_draws: usize,
}

/// Resolve a CPF body to its outcome under the given bindings.
///
/// Case branches are tried in declared order and the first true guard wins.
/// A Bernoulli probability outside `[0, 1]` is clamped with a warning.
///
/// # Errors
///
/// Returns [`EvalError`] if a guard, probability, or value fails to
/// evaluate, or a case has no matching branch and no default.
pub fn resolve_outcome(
    ctx: &EvalContext<'_>,
    formula: &Formula,
    bindings: &mut Bindings,
) -> Result<Outcome, EvalError> {
    let mut current = formula;
    loop {
        match current {
            Formula::Case { branches, default } => {
                current = ctx.select_branch(branches, default.as_deref(), bindings)?;
            }
            Formula::Bernoulli(p) => {
                let raw = ctx.evaluate_real(p, bindings)?;
                return Ok(Outcome::Bernoulli(clamp_probability(raw)));
            }
            Formula::KronDelta(inner) => {
                return ctx.evaluate(inner, bindings).map(Outcome::Deterministic);
            }
            leaf => return ctx.evaluate(leaf, bindings).map(Outcome::Deterministic),
        }
    }
}

/// Clamp a probability into `[0, 1]`; NaN becomes 0.
fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        warn!("Bernoulli probability is NaN, treating as 0");
        return 0.0;
    }
    if !(0.0..=1.0).contains(&p) {
        warn!(probability = p, "Bernoulli probability outside [0, 1], clamping");
    }
    p.clamp(0.0, 1.0)
}

/// Computes next-state values for every CPF of a domain.
#[derive(Debug, Clone, Copy)]
pub struct TransitionEngine<'d> {
    /// The domain whose CPFs are applied.
    domain: &'d Domain,
}

impl<'d> TransitionEngine<'d> {
    /// Create an engine for a loaded domain.
    pub const fn new(domain: &'d Domain) -> Self {
        Self { domain }
    }

    /// Compute every ground next-state value from the committed snapshot
    /// and stage them in the store.
    ///
    /// Nothing is staged if any computation fails.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if a CPF fails to evaluate or a value cannot be
    /// staged.
    pub fn stage_all(
        &self,
        store: &mut FluentStore,
        actions: &ActionAssignment,
        sampler: &mut dyn SampleSource,
        step: u64,
    ) -> Result<TransitionStats, EvalError> {
        let (next, stats) = self.compute(store, actions, sampler, step)?;

        for (ground, value) in next {
            if let Err(source) = store.stage(ground, value) {
                store.discard_staged();
                return Err(source.into());
            }
        }

        debug!(
            step,
            ground_instances = stats.ground_instances,
            bernoulli_draws = stats.bernoulli_draws,
            "Transitions staged"
        );
        Ok(stats)
    }

    /// Read-only pass over the committed snapshot.
    fn compute(
        &self,
        store: &FluentStore,
        actions: &ActionAssignment,
        sampler: &mut dyn SampleSource,
        step: u64,
    ) -> Result<(Vec<(GroundVariable, Value)>, TransitionStats), EvalError> {
        let ctx = EvalContext::new(store, actions);
        let mut next = Vec::new();
        let mut stats = TransitionStats::default();

        for cpf in self.domain.cpfs() {
            let decl = store.schema().get(&cpf.variable)?;
            for args in store.registry().all_groundings(&decl.params)? {
                let mut bindings = Bindings::from_pairs(&cpf.params, &args);
                let ground = GroundVariable::new(cpf.variable.clone(), args);

                let value = match resolve_outcome(&ctx, &cpf.body, &mut bindings)? {
                    Outcome::Deterministic(value) => value,
                    Outcome::Bernoulli(p) => {
                        stats.bernoulli_draws = stats.bernoulli_draws.saturating_add(1);
                        Value::Bool(sampler.uniform(step, &ground) < p)
                    }
                };
                stats.ground_instances = stats.ground_instances.saturating_add(1);
                next.push((ground, value));
            }
        }
        Ok((next, stats))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use recon_types::{ObjectRef, VarName};

    use super::*;
    use crate::domain::{Cpf, DomainDef, InstanceDef};
    use crate::sampling::SeededStreams;
    use recon_types::{TypeName, VariableDecl, VariableKind};

    /// Always returns the same draw.
    struct Fixed(f64);

    impl SampleSource for Fixed {
        fn uniform(&mut self, _step: u64, _ground: &GroundVariable) -> f64 {
            self.0
        }
    }

    fn coin_domain(p: f64) -> (Domain, FluentStore) {
        let def = DomainDef {
            name: "coins".to_owned(),
            types: vec![TypeName::from("coin")],
            variables: vec![
                VariableDecl::real("P", VariableKind::NonFluent, [], p),
                VariableDecl::boolean("heads", VariableKind::StateFluent, [TypeName::from("coin")]),
                VariableDecl::boolean("flip", VariableKind::ActionFluent, [TypeName::from("coin")]),
            ],
            cpfs: vec![Cpf::new(
                "heads",
                ["?c"],
                Formula::case(
                    vec![
                        (
                            Formula::fluent("flip", ["?c"]),
                            Formula::bernoulli(Formula::constant_ref("P")),
                        ),
                        (Formula::truth(true), Formula::kron(true)),
                    ],
                    Formula::kron(false),
                ),
            )],
            reward: Formula::real(0.0),
        };
        let instance = InstanceDef::new("two-coins").with_objects("coin", ["c1", "c2"]);
        Domain::load(def, instance).unwrap()
    }

    fn coin(name: &str) -> GroundVariable {
        GroundVariable::new("heads", vec![ObjectRef::new("coin", name)])
    }

    fn flip(name: &str) -> GroundVariable {
        GroundVariable::new("flip", vec![ObjectRef::new("coin", name)])
    }

    #[test]
    fn stages_every_instance_and_counts_draws() {
        let (domain, mut store) = coin_domain(0.5);
        let actions = ActionAssignment::with_true([flip("c1")]);
        let stats = TransitionEngine::new(&domain)
            .stage_all(&mut store, &actions, &mut Fixed(0.25), 0)
            .unwrap();
        assert_eq!(stats.ground_instances, 2);
        assert_eq!(stats.bernoulli_draws, 1);
        assert_eq!(store.staged_len(), 2);

        // Not visible before commit.
        assert_eq!(store.get(&coin("c2")).unwrap(), Value::FALSE);
        store.commit();
        assert_eq!(store.get(&coin("c1")).unwrap(), Value::TRUE);
        assert_eq!(store.get(&coin("c2")).unwrap(), Value::TRUE);
    }

    #[test]
    fn draw_is_true_iff_below_probability() {
        let (domain, mut store) = coin_domain(0.5);
        let actions = ActionAssignment::with_true([flip("c1")]);
        TransitionEngine::new(&domain)
            .stage_all(&mut store, &actions, &mut Fixed(0.5), 0)
            .unwrap();
        store.commit();
        assert_eq!(store.get(&coin("c1")).unwrap(), Value::FALSE);
    }

    #[test]
    fn resolve_outcome_follows_first_match() {
        let (domain, store) = coin_domain(0.3);
        let actions = ActionAssignment::with_true([flip("c1")]);
        let ctx = EvalContext::new(&store, &actions);
        let body = &domain.cpfs().first().unwrap().body;

        let mut flipped = Bindings::from_pairs(&[VarName::from("?c")], &[ObjectRef::new("coin", "c1")]);
        assert_eq!(
            resolve_outcome(&ctx, body, &mut flipped).unwrap(),
            Outcome::Bernoulli(0.3)
        );

        let mut idle = Bindings::from_pairs(&[VarName::from("?c")], &[ObjectRef::new("coin", "c2")]);
        assert_eq!(
            resolve_outcome(&ctx, body, &mut idle).unwrap(),
            Outcome::Deterministic(Value::TRUE)
        );
    }

    #[test]
    fn first_match_holds_across_seeds() {
        // A zero-probability first branch must shadow the later `true` branch
        // whatever the draw.
        for seed in [0, 1, 2, 3, 42, 1_000_003] {
            let (domain, mut store) = coin_domain(0.0);
            let actions = ActionAssignment::with_true([flip("c1")]);
            let mut sampler = SeededStreams::new(seed);
            for step in 0..4 {
                let stats = TransitionEngine::new(&domain)
                    .stage_all(&mut store, &actions, &mut sampler, step)
                    .unwrap();
                assert_eq!(stats.bernoulli_draws, 1);
                store.commit();
                assert_eq!(store.get(&coin("c1")).unwrap(), Value::FALSE, "seed {seed}");
                assert_eq!(store.get(&coin("c2")).unwrap(), Value::TRUE, "seed {seed}");
            }
        }
    }

    #[test]
    fn dynamic_probabilities_are_clamped() {
        assert!((clamp_probability(1.5) - 1.0).abs() < f64::EPSILON);
        assert!(clamp_probability(-0.5).abs() < f64::EPSILON);
        assert!(clamp_probability(f64::NAN).abs() < f64::EPSILON);
    }

    #[test]
    fn seeded_transitions_are_reproducible() {
        let run = |seed: u64| {
            let (domain, mut store) = coin_domain(0.5);
            let actions = ActionAssignment::with_true([flip("c1"), flip("c2")]);
            let mut sampler = SeededStreams::new(seed);
            TransitionEngine::new(&domain)
                .stage_all(&mut store, &actions, &mut sampler, 1)
                .unwrap();
            store.commit();
            store.snapshot().unwrap()
        };
        assert_eq!(run(9), run(9));
    }
}
