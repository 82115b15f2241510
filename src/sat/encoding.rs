#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Translation of formulas into CNF.
//!
//! Boolean variables map one-to-one onto CNF variables, allocated first and in declaration
//! order. Integer variables use an order encoding: for every threshold `c` in the variable's
//! range there is one CNF variable standing for `x <= c`, and consecutive thresholds are chained
//! by `[x <= c] -> [x <= c + 1]`.
//!
//! The range of an integer variable is inferred from the constants it is compared with. Every
//! atom `x op k` is equivalent to `[x <= t]` or its negation for some threshold `t`, so the
//! truth of every atom only depends on where `x` falls between the smallest and largest
//! threshold. Encoding the values `min(t) ..= max(t) + 1` is therefore exact for formulas that
//! only compare variables with constants, which is the only kind of comparison the formula
//! language has. A variable compared with constants that lie far apart gets one CNF variable per
//! value in between.
//!
//! Formulas are first brought into negation normal form with the comparison atoms already
//! replaced by order literals. Conjunctions then simply contribute their clauses; disjunctions
//! multiply out their operands as long as the result stays small, and otherwise name an
//! operand by a fresh literal `t` with the one-sided definition `t -> operand`. Since the NNF
//! only has positive occurrences, that definition preserves satisfiability and models.

use crate::sat::cnf::{Clause, Cnf};
use crate::sat::expr::{CmpOp, Formula, IntVar};
use crate::sat::literal::{Lit, Variable};
use crate::sat::model::Model;
use bit_vec::BitVec;
use smallvec::smallvec;

/// Largest number of clauses a disjunction may expand to before an operand is named.
const DISTRIBUTION_LIMIT: usize = 32;

/// Where the order literals of one integer variable live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLayout {
    lo: i64,
    hi: i64,
    first: Variable,
}

impl OrderLayout {
    /// Smallest value the variable can take in the encoding.
    #[must_use]
    pub const fn lo(&self) -> i64 {
        self.lo
    }

    /// Largest value the variable can take in the encoding.
    #[must_use]
    pub const fn hi(&self) -> i64 {
        self.hi
    }

    /// Number of order literals, one less than the number of encoded values.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn width(&self) -> usize {
        (self.hi - self.lo) as usize
    }

    /// The CNF variable standing for `x <= c`, for `lo <= c < hi`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    const fn var_for(&self, c: i64) -> Variable {
        self.first + (c - self.lo) as Variable
    }

    fn le(&self, c: i64) -> Nnf {
        if c < self.lo {
            Nnf::Const(false)
        } else if c >= self.hi {
            Nnf::Const(true)
        } else {
            Nnf::Lit(Lit::positive(self.var_for(c)))
        }
    }

    fn decode(&self, assignment: &BitVec) -> i64 {
        (self.lo..self.hi)
            .find(|&c| assignment.get(self.var_for(c) as usize).unwrap_or(false))
            .unwrap_or(self.hi)
    }
}

/// A formula in negation normal form over CNF literals.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Nnf {
    Const(bool),
    Lit(Lit),
    And(Vec<Nnf>),
    Or(Vec<Nnf>),
}

impl Nnf {
    fn and<I: IntoIterator<Item = Self>>(items: I) -> Self {
        let mut out = Vec::new();
        for item in items {
            match item {
                Self::Const(true) => {}
                Self::Const(false) => return Self::Const(false),
                Self::And(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match <[Self; 1]>::try_from(out) {
            Ok([single]) => single,
            Err(out) if out.is_empty() => Self::Const(true),
            Err(out) => Self::And(out),
        }
    }

    fn or<I: IntoIterator<Item = Self>>(items: I) -> Self {
        let mut out = Vec::new();
        for item in items {
            match item {
                Self::Const(false) => {}
                Self::Const(true) => return Self::Const(true),
                Self::Or(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match <[Self; 1]>::try_from(out) {
            Ok([single]) => single,
            Err(out) if out.is_empty() => Self::Const(false),
            Err(out) => Self::Or(out),
        }
    }

    fn negate(self) -> Self {
        match self {
            Self::Const(b) => Self::Const(!b),
            Self::Lit(lit) => Self::Lit(!lit),
            Self::And(items) => Self::or(items.into_iter().map(Self::negate)),
            Self::Or(items) => Self::and(items.into_iter().map(Self::negate)),
        }
    }
}

/// The CNF of a constraint store together with what is needed to read a model back.
#[derive(Debug, Clone)]
pub struct Encoded {
    /// The clauses handed to the solver.
    pub cnf: Cnf,
    layouts: Vec<OrderLayout>,
    bool_vars: Vec<Variable>,
}

impl Encoded {
    /// The order layout of an integer variable.
    #[must_use]
    pub fn layout(&self, var: IntVar) -> OrderLayout {
        self.layouts[var.index()]
    }

    /// Reads integer and boolean values off a CNF assignment indexed by variable.
    #[must_use]
    pub fn decode(&self, assignment: &BitVec) -> Model {
        let ints = self.layouts.iter().map(|l| l.decode(assignment)).collect();
        let bools = self
            .bool_vars
            .iter()
            .map(|&v| assignment.get(v as usize).unwrap_or(false))
            .collect();
        Model::new(ints, bools)
    }
}

/// Encodes `formulas` over `num_ints` integer and `num_bools` boolean variables.
///
/// # Panics
///
/// If an integer variable is compared with constants spanning more than `u32::MAX` values.
#[must_use]
pub fn encode(num_ints: usize, num_bools: usize, formulas: &[Formula]) -> Encoded {
    let mut encoded = Encoded::new(num_ints, num_bools, formulas);
    for formula in formulas {
        encoded.assert(formula);
    }
    encoded
}

/// The thresholds `t` such that the atom is `[x <= t]` or its negation.
const fn thresholds(op: CmpOp, value: i64) -> (i64, i64) {
    match op {
        CmpOp::Le | CmpOp::Gt => (value, value),
        CmpOp::Lt | CmpOp::Ge => (value.saturating_sub(1), value.saturating_sub(1)),
        CmpOp::Eq => (value.saturating_sub(1), value),
    }
}

impl Encoded {
    fn new(num_ints: usize, num_bools: usize, formulas: &[Formula]) -> Self {
        let mut cnf = Cnf::new();
        let bool_vars = (0..num_bools).map(|_| cnf.new_var()).collect();

        let mut bounds: Vec<Option<(i64, i64)>> = vec![None; num_ints];
        for formula in formulas {
            formula.for_each_comparison(&mut |var, op, value| {
                let (low, high) = thresholds(op, value);
                let entry = &mut bounds[var.index()];
                *entry = Some(match *entry {
                    None => (low, high),
                    Some((lo, hi)) => (lo.min(low), hi.max(high)),
                });
            });
        }

        let layouts = bounds
            .into_iter()
            .map(|bound| match bound {
                None => OrderLayout {
                    lo: 0,
                    hi: 0,
                    first: 1,
                },
                Some((lo, max_threshold)) => {
                    let layout = OrderLayout {
                        lo,
                        hi: max_threshold.saturating_add(1),
                        first: cnf.num_vars + 1,
                    };
                    let width =
                        Variable::try_from(layout.width()).expect("integer range too wide");
                    cnf.num_vars += width;
                    for c in lo..max_threshold {
                        cnf.add_clause([
                            !Lit::positive(layout.var_for(c)),
                            Lit::positive(layout.var_for(c + 1)),
                        ]);
                    }
                    layout
                }
            })
            .collect();

        Self {
            cnf,
            layouts,
            bool_vars,
        }
    }

    /// Adds the clauses of one more formula over the same variables.
    ///
    /// The integer ranges stay as they were inferred, so a comparison with a constant outside a
    /// variable's range is decided against that range.
    pub fn assert(&mut self, formula: &Formula) {
        let nnf = self.to_nnf(formula, true);
        for clause in self.clauses_of(nnf) {
            self.cnf.add_clause(clause);
        }
    }

    fn to_nnf(&self, formula: &Formula, positive: bool) -> Nnf {
        match formula {
            Formula::Const(b) => Nnf::Const(*b == positive),
            Formula::Bool(var) => Nnf::Lit(Lit::new(self.bool_vars[var.index()], positive)),
            Formula::Cmp(var, op, value) => {
                let atom = self.comparison(*var, *op, *value);
                if positive { atom } else { atom.negate() }
            }
            Formula::Not(inner) => self.to_nnf(inner, !positive),
            Formula::And(items) if positive => {
                Nnf::and(items.iter().map(|f| self.to_nnf(f, true)))
            }
            Formula::And(items) => Nnf::or(items.iter().map(|f| self.to_nnf(f, false))),
            Formula::Or(items) if positive => Nnf::or(items.iter().map(|f| self.to_nnf(f, true))),
            Formula::Or(items) => Nnf::and(items.iter().map(|f| self.to_nnf(f, false))),
            Formula::Implies(lhs, rhs) if positive => {
                Nnf::or([self.to_nnf(lhs, false), self.to_nnf(rhs, true)])
            }
            Formula::Implies(lhs, rhs) => {
                Nnf::and([self.to_nnf(lhs, true), self.to_nnf(rhs, false)])
            }
        }
    }

    fn comparison(&self, var: IntVar, op: CmpOp, value: i64) -> Nnf {
        let layout = self.layouts[var.index()];
        let below = value.saturating_sub(1);
        match op {
            CmpOp::Le => layout.le(value),
            CmpOp::Lt => layout.le(below),
            CmpOp::Gt => layout.le(value).negate(),
            CmpOp::Ge => layout.le(below).negate(),
            CmpOp::Eq => Nnf::and([layout.le(value), layout.le(below).negate()]),
        }
    }

    fn clauses_of(&mut self, nnf: Nnf) -> Vec<Clause> {
        match nnf {
            Nnf::Const(true) => Vec::new(),
            Nnf::Const(false) => vec![Clause::new()],
            Nnf::Lit(lit) => vec![smallvec![lit]],
            Nnf::And(items) => {
                let mut clauses = Vec::new();
                for item in items {
                    clauses.extend(self.clauses_of(item));
                }
                clauses
            }
            Nnf::Or(items) => {
                let mut product = vec![Clause::new()];
                for item in items {
                    let mut part = self.clauses_of(item);
                    if part.len() > 1 && product.len() * part.len() > DISTRIBUTION_LIMIT {
                        part = vec![smallvec![self.name(part)]];
                    }
                    product = product
                        .iter()
                        .flat_map(|left| {
                            part.iter()
                                .map(move |right| left.iter().chain(right).copied().collect::<Clause>())
                        })
                        .collect();
                }
                product
            }
        }
    }

    /// Introduces `t` with `t -> clauses` and returns `t`.
    fn name(&mut self, clauses: Vec<Clause>) -> Lit {
        let t = Lit::positive(self.cnf.new_var());
        for clause in clauses {
            self.cnf.add_clause(std::iter::once(!t).chain(clause));
        }
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::expr::BoolVar;

    /// The assignment an integer value induces on the order literals of `var`.
    fn set_value(encoded: &Encoded, assignment: &mut BitVec, var: IntVar, value: i64) {
        let layout = encoded.layout(var);
        for c in layout.lo()..layout.hi() {
            assignment.set(layout.var_for(c) as usize, value <= c);
        }
    }

    fn blank(encoded: &Encoded) -> BitVec {
        BitVec::from_elem(encoded.cnf.num_vars as usize + 1, false)
    }

    #[test]
    fn test_layout_covers_thresholds() {
        let x = IntVar(0);
        let formulas = vec![x.within(1, 9)];
        let encoded = encode(1, 0, &formulas);
        let layout = encoded.layout(x);
        assert_eq!(layout.lo(), 0);
        assert_eq!(layout.hi(), 10);
        assert_eq!(layout.width(), 10);
        // 9 chain clauses plus the two bound units
        assert_eq!(encoded.cnf.clauses.len(), 11);
    }

    #[test]
    fn test_unconstrained_variable_has_no_literals() {
        let encoded = encode(2, 0, &[IntVar(1).equals(3)]);
        assert_eq!(encoded.layout(IntVar(0)).width(), 0);
        let model = encoded.decode(&blank(&encoded));
        assert_eq!(model.int(IntVar(0)), 0);
    }

    #[test]
    fn test_bool_vars_come_first() {
        let p = BoolVar(0);
        let q = BoolVar(1);
        let encoded = encode(0, 2, &[Formula::or([p.lit(), !q.lit()])]);
        assert_eq!(encoded.cnf.to_string(), "p cnf 2 1\n1 -2 0\n");
    }

    #[test]
    fn test_order_encoding_is_exact() {
        let x = IntVar(0);
        let formulas = [
            x.equals(3),
            !x.equals(3),
            x.less_than(2),
            x.at_most(2),
            x.greater_than(4),
            x.at_least(4),
            x.differs_from(3),
            x.within(2, 4),
            x.equals(2).implies(Formula::FALSE),
        ];

        for formula in &formulas {
            // A wide atom keeps the layout identical across formulas.
            let wide = Formula::or([x.at_most(-10), x.at_least(20), Formula::TRUE]);
            let store = [formula.clone(), wide];
            let encoded = encode(1, 0, &store);
            assert_eq!(encoded.cnf.num_vars as usize, encoded.layout(x).width());

            for value in -12..=22 {
                let mut assignment = blank(&encoded);
                set_value(&encoded, &mut assignment, x, value);
                let model = encoded.decode(&assignment);
                let expected = formula.eval(&model);
                assert_eq!(
                    encoded.cnf.verify(&assignment),
                    expected,
                    "{formula:?} at x = {value}"
                );
            }
        }
    }

    #[test]
    fn test_assert_extends_existing_encoding() {
        let x = IntVar(0);
        let mut encoded = encode(1, 0, &[x.within(1, 3)]);
        let vars = encoded.cnf.num_vars;
        let clauses = encoded.cnf.clauses.len();

        encoded.assert(&x.differs_from(2));
        assert_eq!(encoded.cnf.num_vars, vars);
        assert_eq!(encoded.cnf.clauses.len(), clauses + 1);
        assert_eq!(encoded.layout(x).lo(), 0);

        for value in 0..=4 {
            let mut assignment = blank(&encoded);
            set_value(&encoded, &mut assignment, x, value);
            assert_eq!(
                encoded.cnf.verify(&assignment),
                (1..=3).contains(&value) && value != 2,
                "x = {value}"
            );
        }
    }

    #[test]
    fn test_decode_reads_smallest_true_threshold() {
        let x = IntVar(0);
        let encoded = encode(1, 0, &[x.within(1, 9)]);
        let mut assignment = blank(&encoded);
        set_value(&encoded, &mut assignment, x, 7);
        assert_eq!(encoded.decode(&assignment).int(x), 7);
    }

    #[test]
    fn test_constant_false_gives_empty_clause() {
        let encoded = encode(0, 0, &[Formula::FALSE]);
        assert!(encoded.cnf.has_empty_clause());
    }

    #[test]
    fn test_implication_of_conjunction_distributes() {
        let x = IntVar(0);
        let y = IntVar(1);
        let z = IntVar(2);
        let f = x
            .equals(1)
            .implies(Formula::and([y.differs_from(1), z.differs_from(1)]));
        let encoded = encode(3, 0, &[f]);
        let chains: usize = (0..3).map(|i| encoded.layout(IntVar(i)).width() - 1).sum();
        // one clause per conjunct, no auxiliary variable
        assert_eq!(encoded.cnf.clauses.len(), chains + 2);
        let widths: usize = (0..3).map(|i| encoded.layout(IntVar(i)).width()).sum();
        assert_eq!(encoded.cnf.num_vars as usize, widths);
    }

    #[test]
    fn test_large_disjunction_names_operands() {
        let vars: Vec<BoolVar> = (0..12).map(BoolVar).collect();
        let pairs = vars
            .chunks(2)
            .map(|pair| Formula::and([pair[0].lit(), pair[1].lit()]));
        let encoded = encode(0, 12, &[Formula::or(pairs)]);
        assert!(encoded.cnf.num_vars > 12);

        let mut assignment = blank(&encoded);
        assignment.set(11, true);
        assignment.set(12, true);
        let names: Vec<Variable> = (13..=encoded.cnf.num_vars).collect();
        // with the last pair true, making only its name true must satisfy everything
        let satisfied = names.iter().any(|&name| {
            let mut candidate = assignment.clone();
            candidate.set(name as usize, true);
            encoded.cnf.verify(&candidate)
        });
        assert!(satisfied);
    }
}
