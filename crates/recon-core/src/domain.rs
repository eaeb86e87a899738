//! Domain and instance definitions, and load-time validation.
//!
//! A [`DomainDef`] declares types, variables, one CPF per state-fluent, and
//! the reward formula. An [`InstanceDef`] supplies the objects of each
//! type, non-fluent values, and initial state overrides. [`Domain::load`]
//! combines the two, validates everything that can be checked before the
//! first step, and returns the loaded [`Domain`] with its [`FluentStore`].
//!
//! # Load-time checks
//!
//! - every type and object referenced is registered;
//! - every fluent reference names a declared variable with matching arity
//!   and argument types, and every variable term is bound;
//! - every state-fluent has exactly one CPF and only state-fluents have one;
//! - every case expression inside a CPF or the reward has a default, so no
//!   ground instance can be left without a next value;
//! - distributions appear only in outcome position of a CPF;
//! - Bernoulli probabilities that read only constants and non-fluents are
//!   evaluated for every grounding and must lie in `[0, 1]`.

use std::collections::{BTreeMap, BTreeSet};

use recon_types::{
    ActionAssignment, GroundVariable, ObjectName, TypeName, Value, VarName, VariableDecl,
    VariableKind,
};
use recon_world::schema::check_arity;
use recon_world::{FluentStore, ObjectRegistry, Schema, WorldError};
use tracing::info;

use crate::eval::{Bindings, EvalContext, EvalError};
use crate::formula::{Formula, Term};

/// Errors that can occur while loading a domain and instance.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A registry, schema, or store check failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// Evaluating a static probability failed.
    #[error("evaluation error: {source}")]
    Eval {
        /// The underlying evaluation error.
        #[from]
        source: EvalError,
    },

    /// A variable term is used outside the scope of any binder.
    #[error("unbound variable {var} in {location}")]
    UnboundVariable {
        /// The variable term.
        var: VarName,
        /// Where it was found.
        location: String,
    },

    /// The two sides of an equality have different object types.
    #[error("cannot compare {left} with {right} in {location}")]
    TermTypeMismatch {
        /// Type of the left term.
        left: TypeName,
        /// Type of the right term.
        right: TypeName,
        /// Where the comparison was found.
        location: String,
    },

    /// A state-fluent cannot be given a next value for every instance.
    #[error("incomplete transition for {variable}: {reason}")]
    IncompleteTransition {
        /// The state-fluent.
        variable: VarName,
        /// What is missing.
        reason: String,
    },

    /// The reward contains a case expression without a default.
    #[error("reward contains a case expression without a default")]
    IncompleteReward,

    /// Two CPFs were given for the same state-fluent.
    #[error("duplicate transition for {0}")]
    DuplicateTransition(VarName),

    /// A CPF was given for a variable that is not a state-fluent.
    #[error("{variable} is a {kind} and cannot have a transition")]
    TransitionForNonState {
        /// The variable.
        variable: VarName,
        /// Its declared kind.
        kind: VariableKind,
    },

    /// A distribution node appears outside outcome position.
    #[error("distribution outside outcome position in {location}")]
    MisplacedDistribution {
        /// Where it was found.
        location: String,
    },

    /// A static Bernoulli probability lies outside `[0, 1]`.
    #[error("probability {value} for {variable} is outside [0, 1]")]
    InvalidProbability {
        /// The ground instance whose transition uses the probability.
        variable: GroundVariable,
        /// The evaluated probability.
        value: f64,
    },
}

/// The transition function of one state-fluent.
#[derive(Debug, Clone, PartialEq)]
pub struct Cpf {
    /// The state-fluent this CPF updates.
    pub variable: VarName,
    /// Parameter variables bound to each ground instance's arguments.
    pub params: Vec<VarName>,
    /// Next-value expression; distributions allowed in outcome position.
    pub body: Formula,
}

impl Cpf {
    /// Create a CPF, e.g. `Cpf::new("damaged", ["?t"], body)`.
    pub fn new<'a>(
        variable: &str,
        params: impl IntoIterator<Item = &'a str>,
        body: Formula,
    ) -> Self {
        Self {
            variable: VarName::from(variable),
            params: params.into_iter().map(VarName::from).collect(),
            body,
        }
    }
}

/// Declarations of a relational MDP, independent of any instance.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainDef {
    /// Domain name.
    pub name: String,
    /// Declared object types.
    pub types: Vec<TypeName>,
    /// Non-fluent, state-fluent, and action-fluent declarations.
    pub variables: Vec<VariableDecl>,
    /// One transition per state-fluent.
    pub cpfs: Vec<Cpf>,
    /// Reward formula, evaluated on the pre-transition state.
    pub reward: Formula,
}

/// Objects and values for one concrete problem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceDef {
    /// Instance name.
    pub name: String,
    /// Objects of each type, in declaration order.
    pub objects: Vec<(TypeName, Vec<ObjectName>)>,
    /// Non-fluent values that differ from the declared default.
    pub non_fluents: Vec<(GroundVariable, Value)>,
    /// Initial state-fluent values that differ from the declared default.
    pub initial_state: Vec<(GroundVariable, Value)>,
}

impl InstanceDef {
    /// Create an empty instance.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add objects of a type.
    #[must_use]
    pub fn with_objects<'a>(
        mut self,
        type_name: &str,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.objects.push((
            TypeName::from(type_name),
            names.into_iter().map(ObjectName::from).collect(),
        ));
        self
    }

    /// Set a non-fluent value.
    #[must_use]
    pub fn with_non_fluent(mut self, ground: GroundVariable, value: impl Into<Value>) -> Self {
        self.non_fluents.push((ground, value.into()));
        self
    }

    /// Set an initial state-fluent value.
    #[must_use]
    pub fn with_initial(mut self, ground: GroundVariable, value: impl Into<Value>) -> Self {
        self.initial_state.push((ground, value.into()));
        self
    }
}

/// A validated domain: its CPFs and reward, ready to simulate.
#[derive(Debug, Clone)]
pub struct Domain {
    /// Domain name.
    name: String,
    /// Instance name.
    instance: String,
    /// CPFs in state-fluent declaration order.
    cpfs: Vec<Cpf>,
    /// Reward formula.
    reward: Formula,
}

impl Domain {
    /// Validate a domain against an instance and build the fluent store.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] for the first check that fails; see the module
    /// documentation for the list of checks.
    pub fn load(def: DomainDef, instance: InstanceDef) -> Result<(Self, FluentStore), LoadError> {
        let registry = build_registry(&def.types, instance.objects)?;

        let mut schema = Schema::new();
        for decl in def.variables {
            schema.declare(decl, &registry)?;
        }

        let cpfs = order_cpfs(def.cpfs, &schema)?;
        let checker = Checker {
            registry: &registry,
            schema: &schema,
        };
        for cpf in &cpfs {
            let decl = schema.get(&cpf.variable)?;
            let mut scope: Vec<(VarName, TypeName)> = cpf
                .params
                .iter()
                .cloned()
                .zip(decl.params.iter().cloned())
                .collect();
            let site = Site::Transition(&cpf.variable);
            checker.check(&cpf.body, &mut scope, Position::Outcome, &site)?;
        }
        checker.check(&def.reward, &mut Vec::new(), Position::Value, &Site::Reward)?;

        let store = FluentStore::new(registry, schema, instance.non_fluents, instance.initial_state)?;
        check_static_probabilities(&cpfs, &store)?;

        info!(
            domain = %def.name,
            instance = %instance.name,
            types = store.registry().type_names().len(),
            variables = store.schema().len(),
            cpfs = cpfs.len(),
            "Domain loaded"
        );

        Ok((
            Self {
                name: def.name,
                instance: instance.name,
                cpfs,
                reward: def.reward,
            },
            store,
        ))
    }

    /// Domain name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance name.
    pub fn instance_name(&self) -> &str {
        &self.instance
    }

    /// CPFs in state-fluent declaration order.
    pub fn cpfs(&self) -> &[Cpf] {
        &self.cpfs
    }

    /// The CPF of a state-fluent.
    pub fn cpf_for(&self, variable: &VarName) -> Option<&Cpf> {
        self.cpfs.iter().find(|cpf| &cpf.variable == variable)
    }

    /// Reward formula.
    pub const fn reward(&self) -> &Formula {
        &self.reward
    }
}

/// Register every declared type with the instance's objects.
fn build_registry(
    types: &[TypeName],
    objects: Vec<(TypeName, Vec<ObjectName>)>,
) -> Result<ObjectRegistry, LoadError> {
    let declared: BTreeSet<&TypeName> = types.iter().collect();
    let mut by_type: BTreeMap<TypeName, Vec<ObjectName>> = BTreeMap::new();
    for (type_name, names) in objects {
        if !declared.contains(&type_name) {
            return Err(WorldError::UnknownType(type_name).into());
        }
        by_type.entry(type_name).or_default().extend(names);
    }

    let mut registry = ObjectRegistry::new();
    for type_name in types {
        let names = by_type.remove(type_name).unwrap_or_default();
        registry.register_type(type_name.clone(), names)?;
    }
    Ok(registry)
}

/// Check CPF coverage and return the CPFs in state-fluent declaration order.
fn order_cpfs(cpfs: Vec<Cpf>, schema: &Schema) -> Result<Vec<Cpf>, LoadError> {
    let mut by_name: BTreeMap<VarName, Cpf> = BTreeMap::new();
    for cpf in cpfs {
        let decl = schema.get(&cpf.variable)?;
        if decl.kind != VariableKind::StateFluent {
            return Err(LoadError::TransitionForNonState {
                variable: cpf.variable,
                kind: decl.kind,
            });
        }
        check_arity(&decl.name, &decl.params, cpf.params.len())?;
        if by_name.contains_key(&cpf.variable) {
            return Err(LoadError::DuplicateTransition(cpf.variable));
        }
        by_name.insert(cpf.variable.clone(), cpf);
    }

    schema
        .of_kind(VariableKind::StateFluent)
        .map(|decl| {
            by_name
                .remove(&decl.name)
                .ok_or_else(|| LoadError::IncompleteTransition {
                    variable: decl.name.clone(),
                    reason: "no transition defined".to_owned(),
                })
        })
        .collect()
}

/// Where a formula lives, for error reporting.
enum Site<'a> {
    /// The CPF of a state-fluent.
    Transition(&'a VarName),
    /// The reward.
    Reward,
}

impl Site<'_> {
    fn describe(&self) -> String {
        match self {
            Self::Transition(variable) => format!("transition for {variable}"),
            Self::Reward => "reward".to_owned(),
        }
    }

    fn incomplete_case(&self) -> LoadError {
        match self {
            Self::Transition(variable) => LoadError::IncompleteTransition {
                variable: (*variable).clone(),
                reason: "case expression without a default".to_owned(),
            },
            Self::Reward => LoadError::IncompleteReward,
        }
    }
}

/// Whether distribution nodes are allowed at this point of a formula.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Position {
    /// The root of a CPF or a case outcome reached from it.
    Outcome,
    /// Anywhere a single value is required.
    Value,
}

/// Static scope and signature checker.
struct Checker<'a> {
    registry: &'a ObjectRegistry,
    schema: &'a Schema,
}

impl Checker<'_> {
    fn check(
        &self,
        formula: &Formula,
        scope: &mut Vec<(VarName, TypeName)>,
        position: Position,
        site: &Site<'_>,
    ) -> Result<(), LoadError> {
        match formula {
            Formula::Const(_) => Ok(()),
            Formula::Fluent { name, args } => self.check_fluent(name, args, scope, site),
            Formula::Not(inner) => self.check(inner, scope, Position::Value, site),
            Formula::And(parts) | Formula::Or(parts) => parts
                .iter()
                .try_for_each(|p| self.check(p, scope, Position::Value, site)),
            Formula::Equals(a, b) => {
                let left = self.term_type(a, scope, site)?;
                let right = self.term_type(b, scope, site)?;
                if left == right {
                    Ok(())
                } else {
                    Err(LoadError::TermTypeMismatch {
                        left,
                        right,
                        location: site.describe(),
                    })
                }
            }
            Formula::Compare { lhs, rhs, .. } | Formula::Arith { lhs, rhs, .. } => {
                self.check(lhs, scope, Position::Value, site)?;
                self.check(rhs, scope, Position::Value, site)
            }
            Formula::Exists { params, body } | Formula::Sum { params, body } => {
                let mark = scope.len();
                for param in params {
                    if !self.registry.has_type(&param.type_name) {
                        return Err(WorldError::UnknownType(param.type_name.clone()).into());
                    }
                    scope.push((param.var.clone(), param.type_name.clone()));
                }
                let result = self.check(body, scope, Position::Value, site);
                scope.truncate(mark);
                result
            }
            Formula::Case { branches, default } => {
                for branch in branches {
                    self.check(&branch.condition, scope, Position::Value, site)?;
                    self.check(&branch.outcome, scope, position, site)?;
                }
                match default {
                    Some(default) => self.check(default, scope, position, site),
                    None => Err(site.incomplete_case()),
                }
            }
            Formula::Bernoulli(inner) | Formula::KronDelta(inner) => {
                if position != Position::Outcome {
                    return Err(LoadError::MisplacedDistribution {
                        location: site.describe(),
                    });
                }
                self.check(inner, scope, Position::Value, site)
            }
        }
    }

    fn check_fluent(
        &self,
        name: &VarName,
        args: &[Term],
        scope: &[(VarName, TypeName)],
        site: &Site<'_>,
    ) -> Result<(), LoadError> {
        let decl = self.schema.get(name)?;
        check_arity(name, &decl.params, args.len())?;
        for (position, (arg, expected)) in args.iter().zip(&decl.params).enumerate() {
            let actual = self.term_type(arg, scope, site)?;
            if &actual != expected {
                return Err(WorldError::ArgumentTypeMismatch {
                    variable: name.clone(),
                    position,
                    expected: expected.clone(),
                    actual,
                }
                .into());
            }
        }
        Ok(())
    }

    fn term_type(
        &self,
        term: &Term,
        scope: &[(VarName, TypeName)],
        site: &Site<'_>,
    ) -> Result<TypeName, LoadError> {
        match term {
            Term::Var(var) => scope
                .iter()
                .rev()
                .find(|(name, _)| name == var)
                .map(|(_, type_name)| type_name.clone())
                .ok_or_else(|| LoadError::UnboundVariable {
                    var: var.clone(),
                    location: site.describe(),
                }),
            Term::Object(object) => {
                if self.registry.contains(object) {
                    Ok(object.type_name.clone())
                } else {
                    Err(WorldError::unknown_object(object).into())
                }
            }
        }
    }
}

/// Evaluate every static Bernoulli probability of every CPF grounding.
fn check_static_probabilities(cpfs: &[Cpf], store: &FluentStore) -> Result<(), LoadError> {
    let schema = store.schema();
    let is_dynamic = |name: &VarName| {
        !schema
            .get(name)
            .is_ok_and(|decl| decl.kind == VariableKind::NonFluent)
    };
    let no_actions = ActionAssignment::new();
    let ctx = EvalContext::new(store, &no_actions);

    for cpf in cpfs {
        let mut probabilities = Vec::new();
        collect_bernoulli(&cpf.body, &mut probabilities);
        probabilities.retain(|p| p.is_static_under(&is_dynamic));
        if probabilities.is_empty() {
            continue;
        }

        let decl = schema.get(&cpf.variable)?;
        for args in store.registry().all_groundings(&decl.params)? {
            let mut bindings = Bindings::from_pairs(&cpf.params, &args);
            for p in &probabilities {
                let value = ctx.evaluate_real(p, &mut bindings)?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(LoadError::InvalidProbability {
                        variable: GroundVariable::new(cpf.variable.clone(), args),
                        value,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Probability expressions of Bernoulli nodes in outcome position.
fn collect_bernoulli<'f>(formula: &'f Formula, out: &mut Vec<&'f Formula>) {
    match formula {
        Formula::Bernoulli(p) => out.push(p),
        Formula::Case { branches, default } => {
            for branch in branches {
                collect_bernoulli(&branch.outcome, out);
            }
            if let Some(default) = default {
                collect_bernoulli(default, out);
            }
        }
        _ => {}
    }
}
