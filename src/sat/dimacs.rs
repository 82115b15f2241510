#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A parser for the DIMACS CNF (Conjunctive Normal Form) file format.
//!
//! The DIMACS CNF format is a standard text-based format for representing
//! boolean satisfiability problems. This module parses such documents into a [`Cnf`], which is
//! how a dumped constraint store is read back for the round-trip check and how the `dimacs`
//! command loads existing files.
//!
//! The format typically includes:
//! - Comment lines starting with 'c'.
//! - A problem line starting with 'p cnf <`num_variables`> <`num_clauses`>'.
//!   The declared variable count is honoured when it exceeds the highest variable used; the
//!   clause count is not checked.
//! - Clause lines. Literals are integers (positive for the variable, negative for its negation)
//!   and every clause is terminated by a '0'. A clause may span several lines.
//! - An optional '%' line to indicate end-of-data (often used in competitions).

use crate::error::{Error, Result};
use crate::sat::cnf::Cnf;
use crate::sat::literal::{Lit, Variable};
use std::io::BufRead;
use std::path::Path;

/// Parses DIMACS formatted data from a `BufRead` source.
///
/// A lone `0` is kept as the empty clause.
///
/// # Errors
///
/// - [`Error::Io`] if reading from `reader` fails.
/// - [`Error::Dimacs`] on a malformed problem line or a token that is not an integer.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Cnf> {
    let mut cnf = Cnf::new();
    let mut declared_vars: Variable = 0;
    let mut pending: Vec<Lit> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| Error::io("<dimacs input>", e))?;
        let mut parts = line.split_whitespace().peekable();

        match parts.peek() {
            Some(&"%") => break,
            None | Some(&"c") => {}
            Some(&"p") => declared_vars = parse_problem_line(&line, line_no)?,
            Some(_) => {
                for token in parts {
                    let value = token.parse::<i32>().map_err(|e| Error::Dimacs {
                        line: line_no,
                        reason: format!("failed to parse literal '{token}': {e}"),
                    })?;
                    match Lit::from_i32(value) {
                        Some(lit) => pending.push(lit),
                        None => {
                            cnf.add_clause(pending.drain(..));
                        }
                    }
                }
            }
        }
    }

    if !pending.is_empty() {
        cnf.add_clause(pending);
    }
    cnf.num_vars = cnf.num_vars.max(declared_vars);
    Ok(cnf)
}

fn parse_problem_line(line: &str, line_no: usize) -> Result<Variable> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        ["p", "cnf", vars, clauses] => {
            let invalid = |what: &str| Error::Dimacs {
                line: line_no,
                reason: format!("invalid {what} count in problem line '{line}'"),
            };
            let vars = vars.parse::<Variable>().map_err(|_| invalid("variable"))?;
            clauses.parse::<usize>().map_err(|_| invalid("clause"))?;
            Ok(vars)
        }
        _ => Err(Error::Dimacs {
            line: line_no,
            reason: format!("expected 'p cnf <vars> <clauses>', found '{line}'"),
        }),
    }
}

/// Parses a DIMACS CNF file specified by its path.
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be opened, otherwise as [`parse_dimacs`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<Cnf> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
    parse_dimacs(std::io::BufReader::new(file))
}
