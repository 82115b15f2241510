#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The shape every puzzle encoder shares, and one driver that solves any of them.
//!
//! An encoder declares its variables in a [`ConstraintStore`], asserts its rules, and later reads
//! its own solution back out of the [`Model`] the solver produced. [`solve`] does the rest:
//! encoding, the optional textual dump, the solver call, verification and timing.

use crate::error::{Error, Result};
use crate::sat::model::Model;
use crate::sat::solver::{Solver, Splr};
use crate::sat::store::{ConstraintStore, SolveResult};
use clap::ValueEnum;
use log::{debug, info};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A constraint problem that can be written into a [`ConstraintStore`].
pub trait Problem {
    /// Handles to the variables `encode` declared, in whatever shape decoding needs.
    type Vars;
    /// What a satisfying model means for this problem.
    type Solution;

    /// Short human-readable description, used in log output.
    fn name(&self) -> String;

    /// Declares the variables and asserts every constraint.
    fn encode(&self, store: &mut ConstraintStore) -> Self::Vars;

    /// Reads a solution out of a model of the store `encode` filled.
    fn decode(&self, vars: &Self::Vars, model: &Model) -> Self::Solution;
}

/// How a problem is expressed to the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Encoding {
    /// One integer variable per position, with comparison constraints.
    #[default]
    Integer,
    /// One boolean per position and value, with clause-shaped constraints.
    Boolean,
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// Textual formats a store can be dumped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum DumpFormat {
    /// The clauses handed to the solver.
    #[default]
    Dimacs,
    /// The formulas themselves, as an SMT-LIB 2 script.
    Smt2,
}

impl DumpFormat {
    /// The fixed file name a dump of this format is written to.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Dimacs => "problem.cnf",
            Self::Smt2 => "problem.smt2",
        }
    }
}

impl Display for DumpFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dimacs => write!(f, "dimacs"),
            Self::Smt2 => write!(f, "smt2"),
        }
    }
}

/// Where and how to dump the store before solving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump {
    /// The file to write; an existing one is overwritten.
    pub path: PathBuf,
    /// What to write into it.
    pub format: DumpFormat,
}

impl Dump {
    /// A dump to the format's fixed file name inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>, format: DumpFormat) -> Self {
        Self {
            path: dir.as_ref().join(format.file_name()),
            format,
        }
    }
}

/// Settings of one [`solve`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveOptions {
    /// Dump the store here before solving; an existing file is overwritten.
    pub dump: Option<Dump>,
    /// Evaluate every asserted formula against the returned model.
    pub verify: bool,
}

/// The answer to a problem, in the problem's own terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<S> {
    /// A solution, decoded from the solver's model.
    Solved(S),
    /// No solution exists.
    Unsatisfiable,
    /// The solver gave up; the string is its reason.
    Unknown(String),
}

impl<S> Outcome<S> {
    /// The solver's verdict: `sat`, `unsat` or `unknown`.
    #[must_use]
    pub const fn verdict(&self) -> &'static str {
        match self {
            Self::Solved(_) => "sat",
            Self::Unsatisfiable => "unsat",
            Self::Unknown(_) => "unknown",
        }
    }

    /// One word for what became of the solution: `found`, `nonexistent` or `error`.
    #[must_use]
    pub const fn summary(&self) -> &'static str {
        match self {
            Self::Solved(_) => "found",
            Self::Unsatisfiable => "nonexistent",
            Self::Unknown(_) => "error",
        }
    }

    /// The solution, if one was found.
    #[must_use]
    pub const fn solution(&self) -> Option<&S> {
        match self {
            Self::Solved(s) => Some(s),
            _ => None,
        }
    }

    /// Consumes the outcome, keeping only the solution.
    #[must_use]
    pub fn into_solution(self) -> Option<S> {
        match self {
            Self::Solved(s) => Some(s),
            _ => None,
        }
    }
}

/// Size and timing figures of one solve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Formulas asserted in the store.
    pub constraints: usize,
    /// CNF variables, auxiliary ones included.
    pub variables: usize,
    /// CNF clauses.
    pub clauses: usize,
    /// Literal occurrences over all clauses.
    pub literals: usize,
    /// Time spent translating the store to CNF.
    pub encode_time: Duration,
    /// Time spent in the solver.
    pub solve_time: Duration,
    /// `Some(true)` when a model was checked against every constraint.
    pub verified: Option<bool>,
}

impl SolveStats {
    /// Encoding plus solving time.
    #[must_use]
    pub fn total_time(&self) -> Duration {
        self.encode_time + self.solve_time
    }
}

/// Everything [`solve`] found out.
#[derive(Debug, Clone)]
pub struct Report<S> {
    /// The answer.
    pub outcome: Outcome<S>,
    /// The model rendered with the store's variable names, when there is one.
    pub model: Option<String>,
    /// Sizes and timings.
    pub stats: SolveStats,
}

/// Solves `problem` with the default solver.
///
/// # Errors
///
/// If the dump cannot be written, or verification finds a violated constraint.
pub fn solve<P: Problem>(problem: &P, options: &SolveOptions) -> Result<Report<P::Solution>> {
    solve_with(problem, options, &mut Splr)
}

/// Solves `problem` with `solver`.
///
/// # Errors
///
/// See [`solve`].
pub fn solve_with<P: Problem, S: Solver>(
    problem: &P,
    options: &SolveOptions,
    solver: &mut S,
) -> Result<Report<P::Solution>> {
    info!("Solving {}", problem.name());

    let start = Instant::now();
    let mut store = ConstraintStore::new();
    let vars = problem.encode(&mut store);
    let encoded = store.encode();
    let encode_time = start.elapsed();

    let mut stats = SolveStats {
        constraints: store.len(),
        variables: encoded.cnf.num_vars as usize,
        clauses: encoded.cnf.clauses.len(),
        literals: encoded.cnf.num_literals(),
        encode_time,
        ..SolveStats::default()
    };
    debug!(
        "{} constraints became {} variables and {} clauses in {:?}",
        stats.constraints, stats.variables, stats.clauses, encode_time
    );

    if let Some(dump) = &options.dump {
        let text = match dump.format {
            DumpFormat::Dimacs => encoded.cnf.to_string(),
            DumpFormat::Smt2 => store.to_smt2(),
        };
        std::fs::write(&dump.path, text).map_err(|e| Error::io(&dump.path, e))?;
        info!("Wrote {} dump to {}", dump.format, dump.path.display());
    }

    let start = Instant::now();
    let result = store.check_encoded(&encoded, solver);
    stats.solve_time = start.elapsed();
    debug!("{} says {} after {:?}", solver.name(), result.verdict(), stats.solve_time);

    let (outcome, model) = match result {
        SolveResult::Sat(model) => {
            if options.verify {
                let violated = store.violated(&model);
                if !violated.is_empty() {
                    return Err(Error::Verification {
                        violated: violated.len(),
                        total: store.len(),
                    });
                }
                stats.verified = Some(true);
            }
            let rendered = store.render_model(&model);
            (Outcome::Solved(problem.decode(&vars, &model)), Some(rendered))
        }
        SolveResult::Unsat => (Outcome::Unsatisfiable, None),
        SolveResult::Unknown(reason) => (Outcome::Unknown(reason), None),
    };

    Ok(Report {
        outcome,
        model,
        stats,
    })
}
