#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! This module provides Sudoku boards and their encoding as a constraint problem.

/// The `solver` module contains the Sudoku constraint generators, board I/O and validation.
pub mod solver;
