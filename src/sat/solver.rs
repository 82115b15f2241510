use crate::sat::cnf::Cnf;
use bit_vec::BitVec;
use splr::{Certificate, SolverError};

/// What a SAT solver answers for a clause set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatAnswer {
    /// A satisfying assignment indexed by variable; index 0 is unused.
    Sat(BitVec),
    /// The clauses have no model.
    Unsat,
    /// The solver gave up; the string says why.
    Unknown(String),
}

/// Anything that can decide a clause set.
pub trait Solver {
    /// Name used in log output.
    fn name(&self) -> &'static str;
    /// Decides `cnf`.
    fn solve(&mut self, cnf: &Cnf) -> SatAnswer;
}

/// The `splr` CDCL solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct Splr;

impl Solver for Splr {
    fn name(&self) -> &'static str {
        "splr"
    }

    fn solve(&mut self, cnf: &Cnf) -> SatAnswer {
        match Certificate::try_from(cnf.to_dimacs_clauses()) {
            Ok(Certificate::SAT(values)) => {
                let mut assignment = BitVec::from_elem(cnf.num_vars as usize + 1, false);
                for value in values.into_iter().filter(|&v| v > 0) {
                    let index = value.unsigned_abs() as usize;
                    if index < assignment.len() {
                        assignment.set(index, true);
                    }
                }
                SatAnswer::Sat(assignment)
            }
            Ok(Certificate::UNSAT)
            | Err(
                SolverError::EmptyClause
                | SolverError::Inconsistent
                | SolverError::RootLevelConflict(..),
            ) => SatAnswer::Unsat,
            Err(e) => SatAnswer::Unknown(e.to_string()),
        }
    }
}
