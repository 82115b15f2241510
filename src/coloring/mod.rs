#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! This module provides graph k-colouring as a constraint problem.

/// The `solver` module contains the graph type, its parser and the colouring encoder.
pub mod solver;
