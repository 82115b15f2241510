#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The constraint store: declared variables plus the list of asserted formulas.
//!
//! A store is filled once by a puzzle encoder, optionally serialised (SMT-LIB or DIMACS), checked
//! once and then dropped. Checking encodes the formulas with [`crate::sat::encoding`], hands the
//! clauses to a [`Solver`] and reads the answer back as a [`Model`].

use crate::sat::encoding::{self, Encoded};
use crate::sat::expr::{BoolVar, Formula, IntVar};
use crate::sat::model::Model;
use crate::sat::solver::{SatAnswer, Solver, Splr};
use itertools::Itertools;
use log::debug;
use rustc_hash::FxHashMap;
use std::fmt::Write as _;

/// The tri-state answer of a satisfiability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveResult {
    /// Satisfiable, with one witnessing model.
    Sat(Model),
    /// No model exists.
    Unsat,
    /// The solver could not decide; the string is its reason.
    Unknown(String),
}

impl SolveResult {
    /// `sat`, `unsat` or `unknown`, as SMT solvers print it.
    #[must_use]
    pub const fn verdict(&self) -> &'static str {
        match self {
            Self::Sat(_) => "sat",
            Self::Unsat => "unsat",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Variables and constraints of one problem instance.
#[derive(Debug, Clone, Default)]
pub struct ConstraintStore {
    int_names: Vec<String>,
    bool_names: Vec<String>,
    by_name: FxHashMap<String, Declared>,
    formulas: Vec<Formula>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declared {
    Int(IntVar),
    Bool(BoolVar),
}

impl ConstraintStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an integer variable, or returns the existing one of that name.
    ///
    /// # Panics
    ///
    /// If `name` is already a boolean variable.
    pub fn int_var(&mut self, name: impl Into<String>) -> IntVar {
        let name = name.into();
        if let Some(declared) = self.by_name.get(&name) {
            match declared {
                Declared::Int(var) => return *var,
                Declared::Bool(_) => panic!("'{name}' is already declared as a boolean"),
            }
        }
        let var = IntVar(u32::try_from(self.int_names.len()).expect("too many variables"));
        self.int_names.push(name.clone());
        self.by_name.insert(name, Declared::Int(var));
        var
    }

    /// Declares a boolean variable, or returns the existing one of that name.
    ///
    /// # Panics
    ///
    /// If `name` is already an integer variable.
    pub fn bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        let name = name.into();
        if let Some(declared) = self.by_name.get(&name) {
            match declared {
                Declared::Bool(var) => return *var,
                Declared::Int(_) => panic!("'{name}' is already declared as an integer"),
            }
        }
        let var = BoolVar(u32::try_from(self.bool_names.len()).expect("too many variables"));
        self.bool_names.push(name.clone());
        self.by_name.insert(name, Declared::Bool(var));
        var
    }

    /// Asserts one formula.
    pub fn add(&mut self, formula: Formula) {
        self.formulas.push(formula);
    }

    /// Asserts every formula of `formulas`, in order.
    pub fn extend<I: IntoIterator<Item = Formula>>(&mut self, formulas: I) {
        self.formulas.extend(formulas);
    }

    /// Number of asserted formulas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    /// Whether nothing has been asserted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// The asserted formulas, in order.
    #[must_use]
    pub fn formulas(&self) -> &[Formula] {
        &self.formulas
    }

    /// Number of declared integer variables.
    #[must_use]
    pub fn num_ints(&self) -> usize {
        self.int_names.len()
    }

    /// Number of declared boolean variables.
    #[must_use]
    pub fn num_bools(&self) -> usize {
        self.bool_names.len()
    }

    /// The name `var` was declared with.
    #[must_use]
    pub fn int_name(&self, var: IntVar) -> &str {
        &self.int_names[var.index()]
    }

    /// The name `var` was declared with.
    #[must_use]
    pub fn bool_name(&self, var: BoolVar) -> &str {
        &self.bool_names[var.index()]
    }

    /// Translates the store into clauses.
    #[must_use]
    pub fn encode(&self) -> Encoded {
        encoding::encode(self.num_ints(), self.num_bools(), &self.formulas)
    }

    /// Decides the store with the default solver.
    #[must_use]
    pub fn check(&self) -> SolveResult {
        self.check_with(&mut Splr)
    }

    /// Decides the store with `solver`.
    pub fn check_with<S: Solver>(&self, solver: &mut S) -> SolveResult {
        let encoded = self.encode();
        self.check_encoded(&encoded, solver)
    }

    /// Decides an encoding previously produced by [`Self::encode`].
    pub fn check_encoded<S: Solver>(&self, encoded: &Encoded, solver: &mut S) -> SolveResult {
        debug!(
            "handing {} variables and {} clauses to {}",
            encoded.cnf.num_vars,
            encoded.cnf.clauses.len(),
            solver.name()
        );
        match solver.solve(&encoded.cnf) {
            SatAnswer::Sat(assignment) => SolveResult::Sat(encoded.decode(&assignment)),
            SatAnswer::Unsat => SolveResult::Unsat,
            SatAnswer::Unknown(reason) => SolveResult::Unknown(reason),
        }
    }

    /// Indices of the formulas `model` falsifies. Empty for a correct model.
    #[must_use]
    pub fn violated(&self, model: &Model) -> Vec<usize> {
        self.formulas
            .iter()
            .positions(|f| !f.eval(model))
            .collect()
    }

    /// Renders the store as an SMT-LIB 2 script over integers and booleans.
    #[must_use]
    pub fn to_smt2(&self) -> String {
        let mut out = String::new();
        for name in &self.int_names {
            let _ = writeln!(out, "(declare-fun {name} () Int)");
        }
        for name in &self.bool_names {
            let _ = writeln!(out, "(declare-fun {name} () Bool)");
        }
        for formula in &self.formulas {
            out.push_str("(assert ");
            self.write_smt2(&mut out, formula);
            out.push_str(")\n");
        }
        out.push_str("(check-sat)\n");
        out
    }

    fn write_smt2(&self, out: &mut String, formula: &Formula) {
        match formula {
            Formula::Const(b) => out.push_str(if *b { "true" } else { "false" }),
            Formula::Bool(var) => out.push_str(self.bool_name(*var)),
            Formula::Cmp(var, op, value) => {
                let _ = write!(out, "({} {} ", op.symbol(), self.int_name(*var));
                if *value < 0 {
                    let _ = write!(out, "(- {}))", value.unsigned_abs());
                } else {
                    let _ = write!(out, "{value})");
                }
            }
            Formula::Not(inner) => {
                out.push_str("(not ");
                self.write_smt2(out, inner);
                out.push(')');
            }
            Formula::And(items) if items.is_empty() => out.push_str("true"),
            Formula::Or(items) if items.is_empty() => out.push_str("false"),
            Formula::And(items) | Formula::Or(items) => {
                out.push_str(if matches!(formula, Formula::And(_)) {
                    "(and"
                } else {
                    "(or"
                });
                for item in items {
                    out.push(' ');
                    self.write_smt2(out, item);
                }
                out.push(')');
            }
            Formula::Implies(lhs, rhs) => {
                out.push_str("(=> ");
                self.write_smt2(out, lhs);
                out.push(' ');
                self.write_smt2(out, rhs);
                out.push(')');
            }
        }
    }

    /// Renders a model the way SMT solvers print one: `[x_0 = 1, x_1 = 2]`.
    #[must_use]
    pub fn render_model(&self, model: &Model) -> String {
        let ints = self
            .int_names
            .iter()
            .zip(model.ints())
            .map(|(name, value)| format!("{name} = {value}"));
        let bools = self
            .bool_names
            .iter()
            .zip(model.bools().iter())
            .map(|(name, value)| format!("{name} = {value}"));
        format!("[{}]", ints.chain(bools).join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::cnf::Cnf;

    struct GivingUp;

    impl Solver for GivingUp {
        fn name(&self) -> &'static str {
            "giving-up"
        }

        fn solve(&mut self, _cnf: &Cnf) -> SatAnswer {
            SatAnswer::Unknown("TimeOut".to_string())
        }
    }

    #[test]
    fn test_declaring_twice_returns_same_variable() {
        let mut store = ConstraintStore::new();
        let a = store.int_var("x_0");
        let b = store.int_var("x_0");
        assert_eq!(a, b);
        assert_eq!(store.num_ints(), 1);
    }

    #[test]
    #[should_panic(expected = "already declared as an integer")]
    fn test_kind_clash_panics() {
        let mut store = ConstraintStore::new();
        let _ = store.int_var("p");
        let _ = store.bool_var("p");
    }

    #[test]
    fn test_check_sat_returns_model() {
        let mut store = ConstraintStore::new();
        let x = store.int_var("x");
        let y = store.int_var("y");
        store.add(x.within(1, 3));
        store.add(y.within(1, 3));
        store.add(x.greater_than(2));
        store.add(x.equals(3).implies(y.less_than(2)));

        match store.check() {
            SolveResult::Sat(model) => {
                assert_eq!(model.int(x), 3);
                assert_eq!(model.int(y), 1);
                assert!(store.violated(&model).is_empty());
                assert_eq!(store.render_model(&model), "[x = 3, y = 1]");
            }
            other => panic!("expected sat, got {other:?}"),
        }
    }

    #[test]
    fn test_check_unsat() {
        let mut store = ConstraintStore::new();
        let x = store.int_var("x");
        store.add(x.within(1, 2));
        store.add(x.differs_from(1));
        store.add(x.differs_from(2));
        assert_eq!(store.check(), SolveResult::Unsat);
    }

    #[test]
    fn test_unknown_is_reported_with_reason() {
        let mut store = ConstraintStore::new();
        let p = store.bool_var("p");
        store.add(p.lit());
        let result = store.check_with(&mut GivingUp);
        assert_eq!(result, SolveResult::Unknown("TimeOut".to_string()));
        assert_eq!(result.verdict(), "unknown");
    }

    #[test]
    fn test_smt2_rendering() {
        let mut store = ConstraintStore::new();
        let x = store.int_var("x_1");
        let p = store.bool_var("p");
        store.add(x.within(-1, 9));
        store.add(x.equals(3).implies(!p.lit()));
        store.add(Formula::TRUE);

        assert_eq!(
            store.to_smt2(),
            "(declare-fun x_1 () Int)\n\
             (declare-fun p () Bool)\n\
             (assert (and (>= x_1 (- 1)) (<= x_1 9)))\n\
             (assert (=> (= x_1 3) (not p)))\n\
             (assert true)\n\
             (check-sat)\n"
        );
    }

    #[test]
    fn test_violated_lists_falsified_formulas() {
        let mut store = ConstraintStore::new();
        let x = store.int_var("x");
        store.add(x.at_least(1));
        store.add(x.at_most(0));
        let model = Model::new(vec![5], bit_vec::BitVec::new());
        assert_eq!(store.violated(&model), vec![1]);
    }
}
