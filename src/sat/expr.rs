//! The formula language the puzzle encoders build constraints in.
//!
//! Atoms are boolean variables and comparisons of an integer variable with a constant; on top of
//! those sit negation, n-ary conjunction and disjunction, and implication. Variables are plain
//! handles handed out by [`crate::sat::store::ConstraintStore`], which also keeps their names.

use crate::sat::model::Model;
use std::ops::Not;

/// Handle of an integer variable declared in a constraint store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVar(pub(crate) u32);

/// Handle of a boolean variable declared in a constraint store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(pub(crate) u32);

impl IntVar {
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// `self == value`
    #[must_use]
    pub const fn equals(self, value: i64) -> Formula {
        Formula::Cmp(self, CmpOp::Eq, value)
    }

    /// `self != value`, as `self < value or self > value`.
    #[must_use]
    pub fn differs_from(self, value: i64) -> Formula {
        Formula::or([self.less_than(value), self.greater_than(value)])
    }

    /// `self < value`
    #[must_use]
    pub const fn less_than(self, value: i64) -> Formula {
        Formula::Cmp(self, CmpOp::Lt, value)
    }

    /// `self <= value`
    #[must_use]
    pub const fn at_most(self, value: i64) -> Formula {
        Formula::Cmp(self, CmpOp::Le, value)
    }

    /// `self > value`
    #[must_use]
    pub const fn greater_than(self, value: i64) -> Formula {
        Formula::Cmp(self, CmpOp::Gt, value)
    }

    /// `self >= value`
    #[must_use]
    pub const fn at_least(self, value: i64) -> Formula {
        Formula::Cmp(self, CmpOp::Ge, value)
    }

    /// `lo <= self and self <= hi`
    #[must_use]
    pub fn within(self, lo: i64, hi: i64) -> Formula {
        Formula::and([self.at_least(lo), self.at_most(hi)])
    }
}

impl BoolVar {
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// The variable as an atom.
    #[must_use]
    pub const fn lit(self) -> Formula {
        Formula::Bool(self)
    }
}

/// Comparison of an integer variable with a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CmpOp {
    /// SMT-LIB operator symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Whether `lhs op rhs` is true.
    #[must_use]
    pub const fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

/// A constraint over the variables of one store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    /// A truth constant.
    Const(bool),
    /// A boolean variable.
    Bool(BoolVar),
    /// An integer variable compared with a constant.
    Cmp(IntVar, CmpOp, i64),
    /// Negation.
    Not(Box<Formula>),
    /// Conjunction; empty is `true`.
    And(Vec<Formula>),
    /// Disjunction; empty is `false`.
    Or(Vec<Formula>),
    /// Implication.
    Implies(Box<Formula>, Box<Formula>),
}

impl Formula {
    /// The constant `true`.
    pub const TRUE: Self = Self::Const(true);
    /// The constant `false`.
    pub const FALSE: Self = Self::Const(false);

    /// Conjunction of all `items`; `true` when there are none.
    pub fn and<I: IntoIterator<Item = Self>>(items: I) -> Self {
        Self::And(items.into_iter().collect())
    }

    /// Disjunction of all `items`; `false` when there are none.
    pub fn or<I: IntoIterator<Item = Self>>(items: I) -> Self {
        Self::Or(items.into_iter().collect())
    }

    /// `self -> consequent`
    #[must_use]
    pub fn implies(self, consequent: Self) -> Self {
        Self::Implies(Box::new(self), Box::new(consequent))
    }

    /// Evaluates the formula under `model`.
    #[must_use]
    pub fn eval(&self, model: &Model) -> bool {
        match self {
            Self::Const(b) => *b,
            Self::Bool(v) => model.bool(*v),
            Self::Cmp(var, op, value) => op.holds(model.int(*var), *value),
            Self::Not(inner) => !inner.eval(model),
            Self::And(items) => items.iter().all(|f| f.eval(model)),
            Self::Or(items) => items.iter().any(|f| f.eval(model)),
            Self::Implies(lhs, rhs) => !lhs.eval(model) || rhs.eval(model),
        }
    }

    /// Calls `visit` for every comparison atom in the formula.
    pub fn for_each_comparison<F: FnMut(IntVar, CmpOp, i64)>(&self, visit: &mut F) {
        match self {
            Self::Const(_) | Self::Bool(_) => {}
            Self::Cmp(var, op, value) => visit(*var, *op, *value),
            Self::Not(inner) => inner.for_each_comparison(visit),
            Self::And(items) | Self::Or(items) => {
                for item in items {
                    item.for_each_comparison(visit);
                }
            }
            Self::Implies(lhs, rhs) => {
                lhs.for_each_comparison(visit);
                rhs.for_each_comparison(visit);
            }
        }
    }
}

impl Not for Formula {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

impl From<bool> for Formula {
    fn from(value: bool) -> Self {
        Self::Const(value)
    }
}

impl From<BoolVar> for Formula {
    fn from(var: BoolVar) -> Self {
        Self::Bool(var)
    }
}
