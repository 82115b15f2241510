use crate::sat::expr::{BoolVar, IntVar};
use bit_vec::BitVec;

/// A satisfying assignment for the variables of a constraint store.
///
/// Integer variables that no constraint mentions are reported as 0, and boolean variables that
/// no constraint mentions as `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    ints: Vec<i64>,
    bools: BitVec,
}

impl Model {
    /// Builds a model from per-variable values, indexed by declaration order.
    #[must_use]
    pub const fn new(ints: Vec<i64>, bools: BitVec) -> Self {
        Self { ints, bools }
    }

    /// The value of an integer variable.
    #[must_use]
    pub fn int(&self, var: IntVar) -> i64 {
        self.ints.get(var.index()).copied().unwrap_or(0)
    }

    /// The value of a boolean variable.
    #[must_use]
    pub fn bool(&self, var: BoolVar) -> bool {
        self.bools.get(var.index()).unwrap_or(false)
    }

    /// All integer values in declaration order.
    #[must_use]
    pub fn ints(&self) -> &[i64] {
        &self.ints
    }

    /// All boolean values in declaration order.
    #[must_use]
    pub const fn bools(&self) -> &BitVec {
        &self.bools
    }
}
