#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use core::fmt;
use core::num::NonZeroI32;
use core::ops::{Neg, Not};

/// A propositional variable, numbered from 1 as in DIMACS.
pub type Variable = u32;

/// A literal in DIMACS convention: a positive or negative non-zero integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(NonZeroI32);

impl Lit {
    /// Creates the literal of `var` with the given polarity.
    ///
    /// # Panics
    ///
    /// If `var` is 0 or does not fit a DIMACS literal.
    #[must_use]
    pub fn new(var: Variable, polarity: bool) -> Self {
        let value = i32::try_from(var).expect("variable out of DIMACS range");
        let value = if polarity { value } else { -value };
        Self(NonZeroI32::new(value).expect("variables are numbered from 1"))
    }

    /// Shorthand for the positive literal of `var`.
    #[must_use]
    pub fn positive(var: Variable) -> Self {
        Self::new(var, true)
    }

    /// Parses a DIMACS literal. Returns `None` for 0, the clause terminator.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match NonZeroI32::new(value) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// The variable this literal is over.
    #[must_use]
    pub const fn variable(self) -> Variable {
        self.0.get().unsigned_abs()
    }

    /// `true` for the positive literal.
    #[must_use]
    pub const fn polarity(self) -> bool {
        self.0.get() > 0
    }

    /// The complementary literal.
    #[must_use]
    pub const fn negated(self) -> Self {
        Self(self.0.wrapping_neg())
    }

    /// The DIMACS integer for this literal.
    #[must_use]
    pub const fn to_i32(self) -> i32 {
        self.0.get()
    }
}

impl Not for Lit {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Neg for Lit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let lit = Lit::new(7, false);
        assert_eq!(lit.variable(), 7);
        assert!(!lit.polarity());
        assert_eq!(lit.to_i32(), -7);
    }

    #[test]
    fn test_negation_is_involutive() {
        let lit = Lit::positive(3);
        assert_eq!(!lit, Lit::new(3, false));
        assert_eq!(-(-lit), lit);
    }

    #[test]
    fn test_from_i32_rejects_terminator() {
        assert_eq!(Lit::from_i32(0), None);
        assert_eq!(Lit::from_i32(-4), Some(Lit::new(4, false)));
    }

    #[test]
    #[should_panic(expected = "variables are numbered from 1")]
    fn test_variable_zero_panics() {
        let _ = Lit::new(0, true);
    }
}
