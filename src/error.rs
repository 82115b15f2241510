use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong outside the solver itself.
///
/// A solver answering "unknown" is not an error; see [`crate::problem::Outcome`].
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a file failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// The file that was being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A DIMACS document could not be parsed.
    #[error("invalid DIMACS input on line {line}: {reason}")]
    Dimacs {
        /// One-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A Sudoku file could not be parsed.
    #[error("invalid sudoku on line {line}: {reason}")]
    SudokuParse {
        /// One-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The board is not one of the supported square sizes.
    #[error("unsupported sudoku size {0}, expected 4, 9, 16 or 25")]
    InvalidSize(usize),

    /// A graph file could not be parsed.
    #[error("invalid graph on line {line}: {reason}")]
    GraphParse {
        /// One-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The solver returned a model that falsifies asserted constraints.
    #[error("model violates {violated} of {total} constraints")]
    Verification {
        /// Number of falsified constraints.
        violated: usize,
        /// Number of asserted constraints.
        total: usize,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
