#![deny(missing_docs)]
//! This crate encodes classic combinatorial puzzles as constraint problems and hands them to a
//! SAT solver.

/// The `coloring` module encodes graph k-colouring, including enumeration of every colouring.
pub mod coloring;

/// The error type shared by the parsers and drivers.
pub mod error;

/// The `pigeonhole` module encodes the pigeonhole principle, which is unsatisfiable whenever
/// there are more pigeons than holes.
pub mod pigeonhole;

/// The `problem` module holds the trait every puzzle encoder implements and the driver that
/// solves any of them.
pub mod problem;

/// The `sat` module implements formulas, their encoding to CNF and the bridge to the external
/// SAT solver.
pub mod sat;

/// The `sudoku` module implements the Sudoku encoder, which fills a 9x9 grid based on Sudoku rules.
pub mod sudoku;

pub use error::{Error, Result};
