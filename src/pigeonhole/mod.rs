#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! This module provides the pigeonhole principle as a constraint problem.

/// The `solver` module contains the pigeonhole encoders and their constraint generators.
pub mod solver;
