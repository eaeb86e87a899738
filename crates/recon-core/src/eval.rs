//! Formula evaluation over a committed snapshot and an action assignment.
//!
//! [`EvalContext`] interprets [`Formula`] trees. Evaluation is pure: it
//! reads the fluent store's committed values and the step's actions and
//! never writes anything. Quantified variables live in an explicit
//! [`Bindings`] scope that quantifiers extend and then truncate back.
//!
//! # Semantics
//!
//! - `And`/`Or` short-circuit left to right; every value is a fully known
//!   boolean.
//! - `Exists` enumerates the registry's cross product lazily and stops at
//!   the first satisfying binding; an empty product is `false`.
//! - `Sum` adds the body's real value over every binding (booleans count
//!   as 0/1).
//! - `Case` selects the first branch whose guard holds, in declared order,
//!   falling back to the default. Overlapping guards are resolved by
//!   position alone.
//! - `Bernoulli` cannot be evaluated to a single value; the transition
//!   engine handles it in outcome position.

use recon_types::{ActionAssignment, GroundVariable, ObjectRef, Value, VarName, VariableKind};
use recon_world::{FluentStore, WorldError};

use crate::formula::{ArithOp, Branch, CmpOp, Formula, Param, Term};

/// Errors that can occur while evaluating a formula.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// A variable term is not bound by any enclosing quantifier or CPF
    /// parameter.
    #[error("unbound variable: {0}")]
    UnboundVariable(VarName),

    /// A boolean was required but a real was produced.
    #[error("expected a boolean, got {0}")]
    ExpectedBool(Value),

    /// No case branch matched and there is no default.
    #[error("no case branch matched and no default was given")]
    IncompleteCase,

    /// A distribution node appeared where a single value is required.
    #[error("stochastic expression in deterministic context")]
    StochasticInDeterministicContext,

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A fluent lookup failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// Active substitution for quantified variables.
///
/// A stack: inner quantifiers push on top, shadowing outer bindings of the
/// same name, and truncate back to their mark when done.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    /// Variable/object pairs, innermost last.
    entries: Vec<(VarName, ObjectRef)>,
}

impl Bindings {
    /// Create an empty scope.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Bind each variable to the object at the same position.
    pub fn from_pairs(vars: &[VarName], objects: &[ObjectRef]) -> Self {
        Self {
            entries: vars.iter().cloned().zip(objects.iter().cloned()).collect(),
        }
    }

    /// Push a binding.
    pub fn push(&mut self, var: VarName, object: ObjectRef) {
        self.entries.push((var, object));
    }

    /// Innermost object bound to `var`.
    pub fn lookup(&self, var: &VarName) -> Option<&ObjectRef> {
        self.entries
            .iter()
            .rev()
            .find(|(name, _)| name == var)
            .map(|(_, object)| object)
    }

    /// Current depth, used as a mark for [`Bindings::truncate`].
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every binding above `mark`.
    pub fn truncate(&mut self, mark: usize) {
        self.entries.truncate(mark);
    }
}

/// Read-only evaluation context: the committed store and the step's actions.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Non-fluents, committed state-fluents, registry, and schema.
    store: &'a FluentStore,
    /// Action-fluent values for this step.
    actions: &'a ActionAssignment,
}

impl<'a> EvalContext<'a> {
    /// Create a context over a store and an action assignment.
    pub const fn new(store: &'a FluentStore, actions: &'a ActionAssignment) -> Self {
        Self { store, actions }
    }

    /// The store this context reads from.
    pub const fn store(&self) -> &'a FluentStore {
        self.store
    }

    /// Evaluate a formula to a value.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] for unbound variables, type errors, invalid
    /// fluent references, unmatched cases without a default, division by
    /// zero, or a distribution node.
    pub fn evaluate(&self, formula: &Formula, bindings: &mut Bindings) -> Result<Value, EvalError> {
        match formula {
            Formula::Const(value) => Ok(*value),
            Formula::Fluent { name, args } => self.lookup_fluent(name, args, bindings),
            Formula::Not(inner) => Ok(Value::Bool(!self.evaluate_bool(inner, bindings)?)),
            Formula::And(parts) => {
                for part in parts {
                    if !self.evaluate_bool(part, bindings)? {
                        return Ok(Value::FALSE);
                    }
                }
                Ok(Value::TRUE)
            }
            Formula::Or(parts) => {
                for part in parts {
                    if self.evaluate_bool(part, bindings)? {
                        return Ok(Value::TRUE);
                    }
                }
                Ok(Value::FALSE)
            }
            Formula::Equals(a, b) => {
                let left = resolve_term(a, bindings)?;
                let right = resolve_term(b, bindings)?;
                Ok(Value::Bool(left == right))
            }
            Formula::Compare { op, lhs, rhs } => {
                let left = self.evaluate(lhs, bindings)?;
                let right = self.evaluate(rhs, bindings)?;
                Ok(Value::Bool(compare(*op, left, right)))
            }
            Formula::Arith { op, lhs, rhs } => {
                let left = self.evaluate_real(lhs, bindings)?;
                let right = self.evaluate_real(rhs, bindings)?;
                arithmetic(*op, left, right).map(Value::Real)
            }
            Formula::Exists { params, body } => self.exists(params, body, bindings).map(Value::Bool),
            Formula::Sum { params, body } => self.sum(params, body, bindings).map(Value::Real),
            Formula::Case { branches, default } => {
                let selected = self.select_branch(branches, default.as_deref(), bindings)?;
                self.evaluate(selected, bindings)
            }
            Formula::KronDelta(inner) => self.evaluate(inner, bindings),
            Formula::Bernoulli(_) => Err(EvalError::StochasticInDeterministicContext),
        }
    }

    /// Evaluate a formula that must produce a boolean.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::ExpectedBool`] for real results, or any error
    /// from [`EvalContext::evaluate`].
    pub fn evaluate_bool(&self, formula: &Formula, bindings: &mut Bindings) -> Result<bool, EvalError> {
        let value = self.evaluate(formula, bindings)?;
        value.as_bool().ok_or(EvalError::ExpectedBool(value))
    }

    /// Evaluate a formula as a real (booleans coerce to 0/1).
    ///
    /// # Errors
    ///
    /// Returns any error from [`EvalContext::evaluate`].
    pub fn evaluate_real(&self, formula: &Formula, bindings: &mut Bindings) -> Result<f64, EvalError> {
        self.evaluate(formula, bindings).map(Value::as_real)
    }

    /// Return the outcome of the first branch whose guard holds, in
    /// declared order, or the default.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::IncompleteCase`] if nothing matches and there is
    /// no default, or any error from evaluating a guard.
    pub fn select_branch<'f>(
        &self,
        branches: &'f [Branch],
        default: Option<&'f Formula>,
        bindings: &mut Bindings,
    ) -> Result<&'f Formula, EvalError> {
        for branch in branches {
            if self.evaluate_bool(&branch.condition, bindings)? {
                return Ok(&branch.outcome);
            }
        }
        default.ok_or(EvalError::IncompleteCase)
    }

    /// Substitute bindings into the argument terms and read the ground
    /// variable from the actions (action-fluents) or the store (everything
    /// else).
    fn lookup_fluent(
        &self,
        name: &VarName,
        args: &[Term],
        bindings: &Bindings,
    ) -> Result<Value, EvalError> {
        let ground = GroundVariable::new(
            name.clone(),
            args.iter()
                .map(|t| resolve_term(t, bindings))
                .collect::<Result<Vec<_>, _>>()?,
        );

        let schema = self.store.schema();
        let decl = schema.get(name)?;
        if decl.kind == VariableKind::ActionFluent {
            schema.check_ground(&ground, self.store.registry())?;
            return Ok(Value::Bool(self.actions.get(&ground)));
        }
        Ok(self.store.get(&ground)?)
    }

    /// Existential quantification with short-circuit on the first
    /// satisfying binding.
    fn exists(&self, params: &[Param], body: &Formula, bindings: &mut Bindings) -> Result<bool, EvalError> {
        let types: Vec<_> = params.iter().map(|p| p.type_name.clone()).collect();
        let mark = bindings.len();
        let mut found = Ok(false);

        for tuple in self.store.registry().all_groundings(&types)? {
            for (param, object) in params.iter().zip(tuple) {
                bindings.push(param.var.clone(), object);
            }
            let holds = self.evaluate_bool(body, bindings);
            bindings.truncate(mark);
            match holds {
                Ok(false) => {}
                other => {
                    found = other;
                    break;
                }
            }
        }
        found
    }

    /// Sum of the body over every binding.
    fn sum(&self, params: &[Param], body: &Formula, bindings: &mut Bindings) -> Result<f64, EvalError> {
        let types: Vec<_> = params.iter().map(|p| p.type_name.clone()).collect();
        let mark = bindings.len();
        let mut total = 0.0;

        for tuple in self.store.registry().all_groundings(&types)? {
            for (param, object) in params.iter().zip(tuple) {
                bindings.push(param.var.clone(), object);
            }
            let term = self.evaluate_real(body, bindings);
            bindings.truncate(mark);
            total += term?;
        }
        Ok(total)
    }
}

/// Resolve a term to an object under the current bindings.
fn resolve_term(term: &Term, bindings: &Bindings) -> Result<ObjectRef, EvalError> {
    match term {
        Term::Object(object) => Ok(object.clone()),
        Term::Var(var) => bindings
            .lookup(var)
            .cloned()
            .ok_or_else(|| EvalError::UnboundVariable(var.clone())),
    }
}

/// Numeric comparison. Two booleans compare as booleans for `Eq`/`Ne`;
/// everything else compares as reals.
fn compare(op: CmpOp, left: Value, right: Value) -> bool {
    if let (Some(a), Some(b)) = (left.as_bool(), right.as_bool()) {
        match op {
            CmpOp::Eq => return a == b,
            CmpOp::Ne => return a != b,
            CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {}
        }
    }
    let (a, b) = (left.as_real(), right.as_real());
    match op {
        CmpOp::Lt => a < b,
        CmpOp::Le => a <= b,
        CmpOp::Gt => a > b,
        CmpOp::Ge => a >= b,
        CmpOp::Eq => (a - b).abs() <= f64::EPSILON,
        CmpOp::Ne => (a - b).abs() > f64::EPSILON,
    }
}

/// Real arithmetic.
fn arithmetic(op: ArithOp, left: f64, right: f64) -> Result<f64, EvalError> {
    match op {
        ArithOp::Add => Ok(left + right),
        ArithOp::Sub => Ok(left - right),
        ArithOp::Mul => Ok(left * right),
        ArithOp::Div => {
            if right.abs() < f64::MIN_POSITIVE {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(left / right)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use recon_types::{ObjectName, TypeName, VariableDecl};
    use recon_world::{ObjectRegistry, Schema};

    use super::*;
    use crate::formula::params;

    fn store() -> FluentStore {
        let mut registry = ObjectRegistry::new();
        registry
            .register_type(
                TypeName::from("x_pos"),
                ["x0", "x1", "x2"].map(ObjectName::from),
            )
            .unwrap();
        registry
            .register_type(TypeName::from("obj"), ["o1", "o2"].map(ObjectName::from))
            .unwrap();
        registry.register_type(TypeName::from("tool"), []).unwrap();

        let mut schema = Schema::new();
        for decl in [
            VariableDecl::boolean("HAZARD", VariableKind::NonFluent, [TypeName::from("x_pos")]),
            VariableDecl::real("W", VariableKind::NonFluent, [], 2.0),
            VariableDecl::boolean("seen", VariableKind::StateFluent, [TypeName::from("obj")]),
            VariableDecl::boolean("look", VariableKind::ActionFluent, [TypeName::from("obj")]),
        ] {
            schema.declare(decl, &registry).unwrap();
        }

        FluentStore::new(
            registry,
            schema,
            [(
                GroundVariable::new("HAZARD", vec![ObjectRef::new("x_pos", "x2")]),
                Value::TRUE,
            )],
            [(
                GroundVariable::new("seen", vec![ObjectRef::new("obj", "o1")]),
                Value::TRUE,
            )],
        )
        .unwrap()
    }

    fn eval(store: &FluentStore, actions: &ActionAssignment, f: &Formula) -> Result<Value, EvalError> {
        EvalContext::new(store, actions).evaluate(f, &mut Bindings::new())
    }

    #[test]
    fn exists_finds_a_hazard() {
        let store = store();
        let actions = ActionAssignment::new();
        let f = Formula::exists(params(&[("?x", "x_pos")]), Formula::fluent("HAZARD", ["?x"]));
        assert_eq!(eval(&store, &actions, &f).unwrap(), Value::TRUE);
    }

    #[test]
    fn exists_over_empty_domain_is_false() {
        let store = store();
        let actions = ActionAssignment::new();
        let f = Formula::exists(params(&[("?t", "tool")]), Formula::truth(true));
        assert_eq!(eval(&store, &actions, &f).unwrap(), Value::FALSE);
    }

    #[test]
    fn exists_short_circuits_before_bad_bindings() {
        // The body errors on every binding after x0; short-circuit means
        // the error is never reached.
        let store = store();
        let actions = ActionAssignment::new();
        let body = Formula::or([
            Formula::Equals(Term::var("?x"), Term::object("x_pos", "x0")),
            Formula::fluent("undeclared", ["?x"]),
        ]);
        let f = Formula::exists(params(&[("?x", "x_pos")]), body);
        assert_eq!(eval(&store, &actions, &f).unwrap(), Value::TRUE);
    }

    #[test]
    fn bindings_are_restored_after_quantifiers() {
        let store = store();
        let actions = ActionAssignment::new();
        let ctx = EvalContext::new(&store, &actions);
        let mut bindings = Bindings::new();
        bindings.push(VarName::from("?o"), ObjectRef::new("obj", "o2"));

        let f = Formula::exists(params(&[("?o", "obj")]), Formula::fluent("seen", ["?o"]));
        assert_eq!(ctx.evaluate(&f, &mut bindings).unwrap(), Value::TRUE);
        assert_eq!(bindings.len(), 1);
        // The outer ?o is visible again, and o2 is unseen.
        let outer = Formula::fluent("seen", ["?o"]);
        assert_eq!(ctx.evaluate(&outer, &mut bindings).unwrap(), Value::FALSE);
    }

    #[test]
    fn sum_weights_indicators() {
        let store = store();
        let actions = ActionAssignment::new();
        // W * sum_o seen(o) = 2.0 * 1
        let f = Formula::product(
            Formula::constant_ref("W"),
            Formula::sum(params(&[("?o", "obj")]), Formula::fluent("seen", ["?o"])),
        );
        let value = eval(&store, &actions, &f).unwrap().as_real();
        assert!((value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn actions_default_to_false() {
        let store = store();
        let actions = ActionAssignment::with_true([GroundVariable::new(
            "look",
            vec![ObjectRef::new("obj", "o2")],
        )]);
        let look = |o: &str| Formula::fluent_terms("look", vec![Term::object("obj", o)]);
        assert_eq!(eval(&store, &actions, &look("o2")).unwrap(), Value::TRUE);
        assert_eq!(eval(&store, &actions, &look("o1")).unwrap(), Value::FALSE);
    }

    #[test]
    fn case_takes_first_true_branch() {
        let store = store();
        let actions = ActionAssignment::new();
        let f = Formula::case(
            vec![
                (Formula::truth(false), Formula::real(1.0)),
                (Formula::truth(true), Formula::real(2.0)),
                (Formula::truth(true), Formula::real(3.0)),
            ],
            Formula::real(4.0),
        );
        assert_eq!(eval(&store, &actions, &f).unwrap(), Value::Real(2.0));
    }

    #[test]
    fn case_without_match_or_default_errors() {
        let store = store();
        let actions = ActionAssignment::new();
        let f = Formula::case_without_default(vec![(Formula::truth(false), Formula::real(1.0))]);
        assert!(matches!(
            eval(&store, &actions, &f),
            Err(EvalError::IncompleteCase)
        ));
    }

    #[test]
    fn errors_are_reported() {
        let store = store();
        let actions = ActionAssignment::new();

        let unbound = Formula::fluent("seen", ["?o"]);
        assert!(matches!(
            eval(&store, &actions, &unbound),
            Err(EvalError::UnboundVariable(_))
        ));

        let arity = Formula::constant_ref("seen");
        assert!(matches!(
            eval(&store, &actions, &arity),
            Err(EvalError::World {
                source: WorldError::ArityMismatch { .. }
            })
        ));

        let not_bool = Formula::negate(Formula::real(0.5));
        assert!(matches!(
            eval(&store, &actions, &not_bool),
            Err(EvalError::ExpectedBool(_))
        ));

        let stochastic = Formula::bernoulli(Formula::real(0.5));
        assert!(matches!(
            eval(&store, &actions, &stochastic),
            Err(EvalError::StochasticInDeterministicContext)
        ));

        let div = Formula::quotient(Formula::real(1.0), Formula::real(0.0));
        assert!(matches!(
            eval(&store, &actions, &div),
            Err(EvalError::DivisionByZero)
        ));
    }

    #[test]
    fn comparisons_and_arithmetic() {
        let store = store();
        let actions = ActionAssignment::new();
        let half = Formula::quotient(Formula::constant_ref("W"), Formula::real(4.0));
        let f = Formula::compare(CmpOp::Eq, half, Formula::real(0.5));
        assert_eq!(eval(&store, &actions, &f).unwrap(), Value::TRUE);
        let g = Formula::compare(CmpOp::Ne, Formula::truth(true), Formula::truth(false));
        assert_eq!(eval(&store, &actions, &g).unwrap(), Value::TRUE);
    }
}
