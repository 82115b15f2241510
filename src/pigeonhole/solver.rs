use crate::problem::{Encoding, Problem};
use crate::sat::expr::{BoolVar, Formula, IntVar};
use crate::sat::model::Model;
use crate::sat::store::ConstraintStore;
use itertools::Itertools;

/// One integer variable per pigeon, named `x_0`, `x_1`, ...; its value is the pigeon's hole.
pub fn pigeon_vars(store: &mut ConstraintStore, pigeons: usize) -> Vec<IntVar> {
    (0..pigeons).map(|p| store.int_var(format!("x_{p}"))).collect()
}

/// Every pigeon sits in one of the holes `1..=holes`.
#[must_use]
pub fn pigeon_in_hole(vars: &[IntVar], holes: usize) -> Vec<Formula> {
    vars.iter().map(|x| x.within(1, hole_value(holes))).collect()
}

/// For every hole `h` and pigeon `p`: if `p` sits in `h`, every other pigeon sits elsewhere.
#[must_use]
pub fn one_pigeon_only(vars: &[IntVar], holes: usize) -> Vec<Formula> {
    let mut constraints = Vec::with_capacity(holes * vars.len());
    for h in (1..=holes).map(hole_value) {
        for (p, x) in vars.iter().enumerate() {
            let others = vars
                .iter()
                .enumerate()
                .filter(|&(r, _)| r != p)
                .map(|(_, other)| other.differs_from(h));
            constraints.push(x.equals(h).implies(Formula::and(others)));
        }
    }
    constraints
}

/// One boolean per pigeon and hole, `p_<pigeon>_<hole>`, true when the pigeon sits in the hole.
pub fn placement_vars(
    store: &mut ConstraintStore,
    pigeons: usize,
    holes: usize,
) -> Vec<Vec<BoolVar>> {
    (0..pigeons)
        .map(|p| {
            (1..=holes)
                .map(|h| store.bool_var(format!("p_{p}_{h}")))
                .collect()
        })
        .collect()
}

/// Every pigeon sits in at least one hole.
#[must_use]
pub fn at_least_one_hole(vars: &[Vec<BoolVar>]) -> Vec<Formula> {
    vars.iter()
        .map(|row| Formula::or(row.iter().map(|v| v.lit())))
        .collect()
}

/// No two pigeons share a hole: one binary clause per hole and pair of pigeons.
#[must_use]
pub fn at_most_one_per_hole(vars: &[Vec<BoolVar>]) -> Vec<Formula> {
    let holes = vars.first().map_or(0, Vec::len);
    let mut constraints = Vec::new();
    for h in 0..holes {
        for (a, b) in (0..vars.len()).tuple_combinations() {
            constraints.push(Formula::or([!vars[a][h].lit(), !vars[b][h].lit()]));
        }
    }
    constraints
}

fn hole_value(hole: usize) -> i64 {
    i64::try_from(hole).expect("hole count fits in i64")
}

/// Placing `pigeons` pigeons in `holes` holes, at most one per hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pigeonhole {
    /// Number of holes, numbered from 1.
    pub holes: usize,
    /// Number of pigeons, numbered from 0.
    pub pigeons: usize,
    /// How the instance is turned into constraints.
    pub encoding: Encoding,
}

/// The variables of either encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PigeonholeVars {
    /// [`pigeon_vars`], one per pigeon.
    Integer(Vec<IntVar>),
    /// [`placement_vars`], by pigeon and hole.
    Boolean(Vec<Vec<BoolVar>>),
}

impl Pigeonhole {
    /// The classic unsatisfiable instance: `holes + 1` pigeons.
    #[must_use]
    pub const fn new(holes: usize) -> Self {
        Self {
            holes,
            pigeons: holes + 1,
            encoding: Encoding::Integer,
        }
    }

    /// The same instance with another number of pigeons.
    #[must_use]
    pub const fn with_pigeons(mut self, pigeons: usize) -> Self {
        self.pigeons = pigeons;
        self
    }

    /// The same instance in another encoding.
    #[must_use]
    pub const fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

impl Problem for Pigeonhole {
    type Vars = PigeonholeVars;
    /// The hole (1-based) of every pigeon.
    type Solution = Vec<usize>;

    fn name(&self) -> String {
        format!(
            "PHP for {} pigeons and {} holes ({} encoding)",
            self.pigeons, self.holes, self.encoding
        )
    }

    fn encode(&self, store: &mut ConstraintStore) -> PigeonholeVars {
        match self.encoding {
            Encoding::Integer => {
                let vars = pigeon_vars(store, self.pigeons);
                store.extend(pigeon_in_hole(&vars, self.holes));
                store.extend(one_pigeon_only(&vars, self.holes));
                PigeonholeVars::Integer(vars)
            }
            Encoding::Boolean => {
                let vars = placement_vars(store, self.pigeons, self.holes);
                store.extend(at_least_one_hole(&vars));
                store.extend(at_most_one_per_hole(&vars));
                PigeonholeVars::Boolean(vars)
            }
        }
    }

    fn decode(&self, vars: &PigeonholeVars, model: &Model) -> Vec<usize> {
        match vars {
            PigeonholeVars::Integer(vars) => vars
                .iter()
                .map(|&x| usize::try_from(model.int(x)).unwrap_or(0))
                .collect(),
            PigeonholeVars::Boolean(vars) => vars
                .iter()
                .map(|row| row.iter().position(|&v| model.bool(v)).map_or(0, |h| h + 1))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Outcome, SolveOptions, solve};

    fn outcome(php: &Pigeonhole) -> Outcome<Vec<usize>> {
        let options = SolveOptions {
            verify: true,
            ..SolveOptions::default()
        };
        solve(php, &options).unwrap().outcome
    }

    #[test]
    fn test_more_pigeons_than_holes_is_unsat() {
        for holes in 1..=4 {
            for encoding in [Encoding::Integer, Encoding::Boolean] {
                let php = Pigeonhole::new(holes).with_encoding(encoding);
                assert_eq!(outcome(&php), Outcome::Unsatisfiable, "{}", php.name());
            }
        }
    }

    #[test]
    fn test_enough_holes_is_sat() {
        for encoding in [Encoding::Integer, Encoding::Boolean] {
            let php = Pigeonhole::new(4).with_pigeons(4).with_encoding(encoding);
            let Outcome::Solved(holes) = outcome(&php) else {
                panic!("{} should be satisfiable", php.name());
            };
            let mut sorted = holes.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_constraint_counts() {
        let mut store = ConstraintStore::new();
        let vars = pigeon_vars(&mut store, 4);
        assert_eq!(store.int_name(vars[3]), "x_3");
        assert_eq!(pigeon_in_hole(&vars, 3).len(), 4);
        assert_eq!(one_pigeon_only(&vars, 3).len(), 12);

        let placements = placement_vars(&mut store, 4, 3);
        assert_eq!(store.bool_name(placements[0][0]), "p_0_1");
        assert_eq!(at_least_one_hole(&placements).len(), 4);
        assert_eq!(at_most_one_per_hole(&placements).len(), 3 * 6);
    }

    #[test]
    fn test_uniqueness_shape() {
        let mut store = ConstraintStore::new();
        let vars = pigeon_vars(&mut store, 2);
        let constraints = one_pigeon_only(&vars, 1);
        assert_eq!(
            constraints[0],
            vars[0]
                .equals(1)
                .implies(Formula::and([vars[1].differs_from(1)]))
        );
    }
}
