#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Formulas over integer and boolean variables, their translation to CNF, and the bridge to the
//! external SAT solver.

/// Clause sets and their DIMACS rendering.
pub mod cnf;
/// DIMACS parsing.
pub mod dimacs;
/// Translation of formulas into clauses.
pub mod encoding;
/// The formula language.
pub mod expr;
/// Boolean literals.
pub mod literal;
/// Satisfying assignments at the level of the formula language.
pub mod model;
/// The external solver seam.
pub mod solver;
/// The constraint store that collects variables and formulas.
pub mod store;
