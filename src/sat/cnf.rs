#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Clause sets in conjunctive normal form.
//!
//! A [`Cnf`] is what the encoder produces and what the external solver consumes. It renders as
//! DIMACS through its `Display` implementation, which is also the text written by the
//! `--export-dimacs` and pigeonhole dump options.

use crate::sat::literal::{Lit, Variable};
use bit_vec::BitVec;
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt;

/// A disjunction of literals. Most clauses produced by the encoders are short.
pub type Clause = SmallVec<[Lit; 8]>;

/// A formula in conjunctive normal form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cnf {
    /// Highest variable index in use. Variables run from 1 to `num_vars`.
    pub num_vars: Variable,
    /// The clauses, in insertion order.
    pub clauses: Vec<Clause>,
}

impl Cnf {
    /// The empty formula, without variables.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            num_vars: 0,
            clauses: Vec::new(),
        }
    }

    /// Allocates a fresh variable.
    pub const fn new_var(&mut self) -> Variable {
        self.num_vars += 1;
        self.num_vars
    }

    /// Adds a clause after sorting it and removing duplicate literals.
    ///
    /// Tautologies (clauses containing both `l` and `-l`) are dropped; the return value tells
    /// whether the clause was kept. An empty iterator adds the empty clause, which makes the
    /// formula unsatisfiable.
    pub fn add_clause<I: IntoIterator<Item = Lit>>(&mut self, lits: I) -> bool {
        let mut clause: Clause = lits.into_iter().collect();
        clause.sort_unstable_by_key(|l| (l.variable(), l.polarity()));
        clause.dedup();

        if clause
            .iter()
            .tuple_windows()
            .any(|(a, b)| a.variable() == b.variable())
        {
            return false;
        }

        if let Some(max) = clause.iter().map(|l| l.variable()).max() {
            self.num_vars = self.num_vars.max(max);
        }
        self.clauses.push(clause);
        true
    }

    /// Total number of literal occurrences.
    #[must_use]
    pub fn num_literals(&self) -> usize {
        self.clauses.iter().map(SmallVec::len).sum()
    }

    /// Whether the formula contains the empty clause.
    #[must_use]
    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(SmallVec::is_empty)
    }

    /// Checks a total assignment, indexed by variable, against every clause.
    /// Variables beyond the end of `assignment` count as false.
    #[must_use]
    pub fn verify(&self, assignment: &BitVec) -> bool {
        self.clauses.iter().all(|clause| {
            clause.iter().any(|lit| {
                let value = assignment
                    .get(lit.variable() as usize)
                    .unwrap_or(false);
                value == lit.polarity()
            })
        })
    }

    /// The clauses as plain DIMACS integers, the shape the external solver takes.
    #[must_use]
    pub fn to_dimacs_clauses(&self) -> Vec<Vec<i32>> {
        self.clauses
            .iter()
            .map(|clause| clause.iter().map(|l| l.to_i32()).collect())
            .collect()
    }
}

impl From<Vec<Vec<i32>>> for Cnf {
    fn from(clauses: Vec<Vec<i32>>) -> Self {
        let mut cnf = Self::new();
        for clause in clauses {
            cnf.add_clause(clause.into_iter().filter_map(Lit::from_i32));
        }
        cnf
    }
}

impl fmt::Display for Cnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            for lit in clause {
                write!(f, "{lit} ")?;
            }
            writeln!(f, "0")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(values: &[i32]) -> Vec<Lit> {
        values.iter().filter_map(|&v| Lit::from_i32(v)).collect()
    }

    #[test]
    fn test_add_clause_sorts_and_dedups() {
        let mut cnf = Cnf::new();
        assert!(cnf.add_clause(lits(&[3, -1, 3, 2])));
        let stored: Vec<i32> = cnf.clauses[0].iter().map(|l| l.to_i32()).collect();
        assert_eq!(stored, vec![-1, 2, 3]);
        assert_eq!(cnf.num_vars, 3);
    }

    #[test]
    fn test_tautology_is_dropped() {
        let mut cnf = Cnf::new();
        assert!(!cnf.add_clause(lits(&[1, 2, -1])));
        assert!(cnf.clauses.is_empty());
    }

    #[test]
    fn test_empty_clause_is_kept() {
        let mut cnf = Cnf::new();
        assert!(cnf.add_clause(Vec::new()));
        assert!(cnf.has_empty_clause());
    }

    #[test]
    fn test_new_var_after_clauses() {
        let mut cnf = Cnf::from(vec![vec![1, -5]]);
        assert_eq!(cnf.new_var(), 6);
    }

    #[test]
    fn test_display_is_dimacs() {
        let cnf = Cnf::from(vec![vec![1, -2], vec![2]]);
        assert_eq!(cnf.to_string(), "p cnf 2 2\n1 -2 0\n2 0\n");
    }

    #[test]
    fn test_verify() {
        let cnf = Cnf::from(vec![vec![1, -2], vec![2]]);
        let mut assignment = BitVec::from_elem(3, false);
        assert!(!cnf.verify(&assignment));
        assignment.set(1, true);
        assignment.set(2, true);
        assert!(cnf.verify(&assignment));
    }

    #[test]
    fn test_num_literals() {
        let cnf = Cnf::from(vec![vec![1, -2, 3], vec![2]]);
        assert_eq!(cnf.num_literals(), 4);
    }
}
