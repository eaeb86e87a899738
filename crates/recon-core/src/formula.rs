//! Already-parsed formula trees.
//!
//! Transition functions (CPFs) and the reward are expressed as [`Formula`]
//! trees: a tagged expression enum interpreted by the evaluator. There is
//! no parser here; domain builders assemble trees with the constructor
//! helpers on [`Formula`] and [`Term`].
//!
//! Distribution nodes ([`Formula::Bernoulli`], [`Formula::KronDelta`]) only
//! make sense in the outcome position of a transition: at the root of a CPF
//! or as the outcome of a [`Formula::Case`] branch. Domain loading rejects
//! them anywhere else.

use recon_types::{ObjectRef, TypeName, Value, VarName};

/// A term in argument position: a variable bound by a quantifier or CPF
/// parameter, or a concrete object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A bound variable such as `?x`.
    Var(VarName),
    /// A concrete object.
    Object(ObjectRef),
}

impl Term {
    /// Shorthand for [`Term::Var`].
    pub fn var(name: impl Into<VarName>) -> Self {
        Self::Var(name.into())
    }

    /// Shorthand for [`Term::Object`].
    pub fn object(type_name: impl Into<TypeName>, name: &str) -> Self {
        Self::Object(ObjectRef::new(type_name, name))
    }
}

/// A typed variable introduced by a quantifier, e.g. `?x : x_pos`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// The variable name (conventionally prefixed with `?`).
    pub var: VarName,
    /// The type whose domain the variable ranges over.
    pub type_name: TypeName,
}

impl Param {
    /// Create a typed parameter.
    pub fn new(var: impl Into<VarName>, type_name: impl Into<TypeName>) -> Self {
        Self {
            var: var.into(),
            type_name: type_name.into(),
        }
    }
}

/// Numeric comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `~=`
    Ne,
}

/// Arithmetic operators over reals (booleans coerce to 0/1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

/// One `if condition then outcome` arm of a case expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// Boolean guard.
    pub condition: Formula,
    /// Value or distribution selected when the guard is the first to hold.
    pub outcome: Formula,
}

/// A boolean/real expression or a next-value distribution.
#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    /// A constant value.
    Const(Value),

    /// A reference to a fluent, non-fluent, or action-fluent.
    Fluent {
        /// The variable symbol.
        name: VarName,
        /// Argument terms, substituted from the active bindings.
        args: Vec<Term>,
    },

    /// Boolean negation.
    Not(Box<Formula>),

    /// Boolean conjunction; empty is `true`.
    And(Vec<Formula>),

    /// Boolean disjunction; empty is `false`.
    Or(Vec<Formula>),

    /// Object identity of two terms (`?x == ?x2`).
    Equals(Term, Term),

    /// Numeric comparison.
    Compare {
        /// Operator.
        op: CmpOp,
        /// Left operand.
        lhs: Box<Formula>,
        /// Right operand.
        rhs: Box<Formula>,
    },

    /// Arithmetic.
    Arith {
        /// Operator.
        op: ArithOp,
        /// Left operand.
        lhs: Box<Formula>,
        /// Right operand.
        rhs: Box<Formula>,
    },

    /// Existential quantification over the cross product of typed domains.
    Exists {
        /// Quantified variables.
        params: Vec<Param>,
        /// Body evaluated under each binding.
        body: Box<Formula>,
    },

    /// Sum of the body's real value over the cross product of typed domains.
    Sum {
        /// Summed variables.
        params: Vec<Param>,
        /// Body evaluated under each binding.
        body: Box<Formula>,
    },

    /// Ordered first-match case expression.
    Case {
        /// Branches tried in declared order.
        branches: Vec<Branch>,
        /// Outcome when no branch matches.
        default: Option<Box<Formula>>,
    },

    /// Bernoulli distribution with the given success probability.
    Bernoulli(Box<Formula>),

    /// Deterministic (Kronecker-delta) outcome.
    KronDelta(Box<Formula>),
}

impl Formula {
    /// Boolean constant.
    pub const fn truth(b: bool) -> Self {
        Self::Const(Value::Bool(b))
    }

    /// Real constant.
    pub const fn real(r: f64) -> Self {
        Self::Const(Value::Real(r))
    }

    /// Fluent reference with variable arguments, e.g.
    /// `Formula::fluent("agentAt", ["?a", "?x", "?y"])`.
    pub fn fluent<'a>(name: &str, vars: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Fluent {
            name: VarName::from(name),
            args: vars.into_iter().map(Term::var).collect(),
        }
    }

    /// Fluent reference with arbitrary argument terms.
    pub fn fluent_terms(name: &str, args: Vec<Term>) -> Self {
        Self::Fluent {
            name: VarName::from(name),
            args,
        }
    }

    /// Nullary fluent reference, e.g. `DETECT_PROB`.
    pub fn constant_ref(name: &str) -> Self {
        Self::Fluent {
            name: VarName::from(name),
            args: Vec::new(),
        }
    }

    /// Negation.
    pub fn negate(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Conjunction.
    pub fn and(parts: impl IntoIterator<Item = Self>) -> Self {
        Self::And(parts.into_iter().collect())
    }

    /// Disjunction.
    pub fn or(parts: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(parts.into_iter().collect())
    }

    /// Object identity of two bound variables.
    pub fn same(a: &str, b: &str) -> Self {
        Self::Equals(Term::var(a), Term::var(b))
    }

    /// Numeric comparison.
    pub fn compare(op: CmpOp, lhs: Self, rhs: Self) -> Self {
        Self::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Arithmetic.
    pub fn arith(op: ArithOp, lhs: Self, rhs: Self) -> Self {
        Self::Arith {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `lhs * rhs`.
    pub fn product(lhs: Self, rhs: Self) -> Self {
        Self::arith(ArithOp::Mul, lhs, rhs)
    }

    /// `lhs / rhs`.
    pub fn quotient(lhs: Self, rhs: Self) -> Self {
        Self::arith(ArithOp::Div, lhs, rhs)
    }

    /// `lhs - rhs`.
    pub fn difference(lhs: Self, rhs: Self) -> Self {
        Self::arith(ArithOp::Sub, lhs, rhs)
    }

    /// Existential quantifier.
    pub fn exists(params: Vec<Param>, body: Self) -> Self {
        Self::Exists {
            params,
            body: Box::new(body),
        }
    }

    /// Sum aggregation.
    pub fn sum(params: Vec<Param>, body: Self) -> Self {
        Self::Sum {
            params,
            body: Box::new(body),
        }
    }

    /// Case expression with a default outcome.
    pub fn case(branches: Vec<(Self, Self)>, default: Self) -> Self {
        Self::Case {
            branches: branches
                .into_iter()
                .map(|(condition, outcome)| Branch { condition, outcome })
                .collect(),
            default: Some(Box::new(default)),
        }
    }

    /// Case expression without a default. Only valid where some branch is
    /// guaranteed to match, which domain loading cannot prove, so loading
    /// rejects it inside transitions and rewards.
    pub fn case_without_default(branches: Vec<(Self, Self)>) -> Self {
        Self::Case {
            branches: branches
                .into_iter()
                .map(|(condition, outcome)| Branch { condition, outcome })
                .collect(),
            default: None,
        }
    }

    /// `if cond then a else b`.
    pub fn if_then_else(cond: Self, then: Self, otherwise: Self) -> Self {
        Self::case(vec![(cond, then)], otherwise)
    }

    /// Bernoulli outcome.
    pub fn bernoulli(p: Self) -> Self {
        Self::Bernoulli(Box::new(p))
    }

    /// Deterministic outcome.
    pub fn kron_delta(value: Self) -> Self {
        Self::KronDelta(Box::new(value))
    }

    /// Deterministic boolean outcome.
    pub fn kron(b: bool) -> Self {
        Self::kron_delta(Self::truth(b))
    }

    /// Return `true` if the formula reads no state-fluent or action-fluent,
    /// as decided by `is_dynamic` for each referenced variable name.
    pub fn is_static_under(&self, is_dynamic: &dyn Fn(&VarName) -> bool) -> bool {
        match self {
            Self::Const(_) | Self::Equals(..) => true,
            Self::Fluent { name, .. } => !is_dynamic(name),
            Self::Not(inner) | Self::Bernoulli(inner) | Self::KronDelta(inner) => {
                inner.is_static_under(is_dynamic)
            }
            Self::And(parts) | Self::Or(parts) => {
                parts.iter().all(|p| p.is_static_under(is_dynamic))
            }
            Self::Compare { lhs, rhs, .. } | Self::Arith { lhs, rhs, .. } => {
                lhs.is_static_under(is_dynamic) && rhs.is_static_under(is_dynamic)
            }
            Self::Exists { body, .. } | Self::Sum { body, .. } => body.is_static_under(is_dynamic),
            Self::Case { branches, default } => {
                branches.iter().all(|b| {
                    b.condition.is_static_under(is_dynamic) && b.outcome.is_static_under(is_dynamic)
                }) && default
                    .as_deref()
                    .is_none_or(|d| d.is_static_under(is_dynamic))
            }
        }
    }
}

/// Shorthand for a list of typed quantifier parameters:
/// `params(&[("?x", "x_pos"), ("?y", "y_pos")])`.
pub fn params(items: &[(&str, &str)]) -> Vec<Param> {
    items.iter().map(|&(var, ty)| Param::new(var, ty)).collect()
}
