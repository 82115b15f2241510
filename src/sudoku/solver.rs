use crate::error::{Error, Result};
use crate::problem::{Encoding, Problem};
use crate::sat::expr::{BoolVar, Formula, IntVar};
use crate::sat::model::Model;
use crate::sat::store::ConstraintStore;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A square grid of digits; 0 marks an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board(Vec<Vec<usize>>);

impl Board {
    /// Wraps a grid given row by row.
    #[must_use]
    pub const fn new(board: Vec<Vec<usize>>) -> Self {
        Self(board)
    }

    /// Number of rows.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// The grid, row by row.
    #[must_use]
    pub fn rows(&self) -> &[Vec<usize>] {
        &self.0
    }

    /// The digit at a zero-based position.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> usize {
        self.0[row][col]
    }

    /// Whether every cell holds a digit.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.0.iter().flatten().all(|&d| d != 0)
    }

    /// Whether the board is a finished Sudoku: every row, column and block holds each digit
    /// `1..=size` exactly once.
    #[must_use]
    pub fn is_valid_solution(&self) -> bool {
        let Ok(size) = Size::try_from(self.size()) else {
            return false;
        };
        let n = self.size();
        if self.0.iter().any(|row| row.len() != n) {
            return false;
        }

        let is_permutation = |cells: Vec<usize>| {
            let mut seen = vec![false; n + 1];
            cells
                .into_iter()
                .all(|d| (1..=n).contains(&d) && !std::mem::replace(&mut seen[d], true))
        };

        let b = size.block_size();
        (0..n).all(|r| is_permutation(self.0[r].clone()))
            && (0..n).all(|c| is_permutation((0..n).map(|r| self.0[r][c]).collect()))
            && (0..n).all(|k| {
                let (br, bc) = ((k / b) * b, (k % b) * b);
                is_permutation(
                    (br..br + b)
                        .cartesian_product(bc..bc + b)
                        .map(|(r, c)| self.0[r][c])
                        .collect(),
                )
            })
    }

    /// Whether this board keeps every given (non-zero) digit of `puzzle`.
    #[must_use]
    pub fn agrees_with(&self, puzzle: &Self) -> bool {
        self.size() == puzzle.size()
            && self.0.iter().zip(&puzzle.0).all(|(mine, theirs)| {
                mine.len() == theirs.len()
                    && mine.iter().zip(theirs).all(|(&a, &b)| b == 0 || a == b)
            })
    }

    /// A puzzle made from this board by emptying `holes` randomly chosen cells.
    #[must_use]
    pub fn derive_puzzle(&self, holes: usize, rng: &mut fastrand::Rng) -> Self {
        let n = self.size();
        let mut cells = (0..n).cartesian_product(0..n).collect_vec();
        rng.shuffle(&mut cells);

        let mut puzzle = self.clone();
        for &(r, c) in cells.iter().take(holes) {
            puzzle.0[r][c] = 0;
        }
        puzzle
    }
}

impl From<Vec<Vec<usize>>> for Board {
    fn from(board: Vec<Vec<usize>>) -> Self {
        Self::new(board)
    }
}

impl From<Board> for Vec<Vec<usize>> {
    fn from(board: Board) -> Self {
        board.0
    }
}

impl<const N: usize> From<[[usize; N]; N]> for Board {
    fn from(board: [[usize; N]; N]) -> Self {
        Self::new(board.iter().map(|r| r.to_vec()).collect())
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let n = self.size();
        let b = Size::try_from(n).map_or(n.max(1), Size::block_size);
        let width = n.to_string().len();

        let lines = self
            .0
            .iter()
            .map(|row| {
                row.chunks(b)
                    .map(|chunk| {
                        chunk
                            .iter()
                            .map(|&d| {
                                if d == 0 {
                                    format!("{:>width$}", ".")
                                } else {
                                    format!("{d:>width$}")
                                }
                            })
                            .join(" ")
                    })
                    .join(" | ")
            })
            .collect_vec();

        let rule = "-".repeat(lines.first().map_or(0, String::len));
        for (r, line) in lines.iter().enumerate() {
            if r > 0 && r % b == 0 {
                writeln!(f, "{rule}")?;
            }
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// A valid 4x4 puzzle.
pub const EXAMPLE_FOUR: [[usize; 4]; 4] = [[1, 0, 0, 4], [0, 4, 1, 0], [0, 1, 4, 0], [4, 0, 0, 1]];

/// A 9x9 puzzle with a unique solution.
pub const EXAMPLE_NINE: [[usize; 9]; 9] = [
    [5, 3, 0, 0, 7, 0, 0, 0, 0],
    [6, 0, 0, 1, 9, 5, 0, 0, 0],
    [0, 9, 8, 0, 0, 0, 0, 6, 0],
    [8, 0, 0, 0, 6, 0, 0, 0, 3],
    [4, 0, 0, 8, 0, 3, 0, 0, 1],
    [7, 0, 0, 0, 2, 0, 0, 0, 6],
    [0, 6, 0, 0, 0, 0, 2, 8, 0],
    [0, 0, 0, 4, 1, 9, 0, 0, 5],
    [0, 0, 0, 0, 8, 0, 0, 7, 9],
];

/// The unique solution of [`EXAMPLE_NINE`].
pub const SOLVED_NINE: [[usize; 9]; 9] = [
    [5, 3, 4, 6, 7, 8, 9, 1, 2],
    [6, 7, 2, 1, 9, 5, 3, 4, 8],
    [1, 9, 8, 3, 4, 2, 5, 6, 7],
    [8, 5, 9, 7, 6, 1, 4, 2, 3],
    [4, 2, 6, 8, 5, 3, 7, 9, 1],
    [7, 1, 3, 9, 2, 4, 8, 5, 6],
    [9, 6, 1, 5, 3, 7, 2, 8, 4],
    [2, 8, 7, 4, 1, 9, 6, 3, 5],
    [3, 4, 5, 2, 8, 6, 1, 7, 9],
];

/// A 16x16 puzzle.
pub const EXAMPLE_SIXTEEN: [[usize; 16]; 16] = [
    [0, 11, 0, 0, 0, 2, 3, 14, 0, 0, 9, 12, 0, 0, 0, 16],
    [15, 12, 0, 0, 0, 11, 0, 1, 13, 10, 0, 0, 0, 0, 7, 2],
    [0, 0, 10, 0, 0, 0, 0, 0, 16, 11, 0, 1, 6, 4, 12, 3],
    [0, 16, 14, 1, 0, 4, 0, 6, 0, 3, 0, 15, 0, 8, 0, 0],
    [1, 6, 5, 12, 0, 0, 11, 0, 0, 9, 8, 0, 0, 0, 0, 0],
    [0, 0, 0, 7, 14, 1, 8, 0, 0, 15, 6, 0, 13, 5, 0, 4],
    [4, 15, 8, 0, 9, 13, 0, 0, 0, 0, 7, 16, 3, 0, 0, 0],
    [0, 9, 13, 0, 0, 0, 0, 15, 10, 0, 0, 0, 7, 6, 0, 11],
    [14, 0, 6, 11, 0, 0, 0, 12, 7, 0, 0, 0, 0, 3, 13, 0],
    [0, 0, 0, 5, 8, 14, 0, 0, 0, 0, 13, 11, 0, 1, 2, 6],
    [13, 0, 16, 4, 0, 15, 5, 0, 0, 1, 12, 6, 8, 0, 0, 0],
    [0, 0, 0, 0, 0, 16, 10, 0, 0, 8, 0, 0, 11, 9, 4, 5],
    [0, 0, 11, 0, 1, 0, 14, 0, 5, 0, 3, 0, 15, 7, 16, 0],
    [5, 13, 15, 3, 16, 0, 4, 7, 0, 0, 0, 0, 0, 2, 0, 0],
    [16, 1, 0, 0, 0, 0, 12, 2, 14, 0, 15, 0, 0, 0, 3, 8],
    [9, 0, 0, 0, 13, 5, 0, 0, 8, 6, 16, 0, 0, 0, 10, 0],
];

/// The supported board sizes.
#[derive(Debug, Clone, PartialEq, Eq, Copy, PartialOrd, Ord, Hash)]
pub enum Size {
    /// 4x4
    Four = 4,
    /// 9x9
    Nine = 9,
    /// 16x16
    Sixteen = 16,
    /// 25x25
    TwentyFive = 25,
}

impl TryFrom<usize> for Size {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            4 => Ok(Self::Four),
            9 => Ok(Self::Nine),
            16 => Ok(Self::Sixteen),
            25 => Ok(Self::TwentyFive),
            _ => Err(Error::InvalidSize(value)),
        }
    }
}

impl From<Size> for usize {
    fn from(size: Size) -> Self {
        size as Self
    }
}

impl Size {
    /// Side length of one block.
    #[must_use]
    pub const fn block_size(self) -> usize {
        match self {
            Self::Four => 2,
            Self::Nine => 3,
            Self::Sixteen => 4,
            Self::TwentyFive => 5,
        }
    }

    /// Zero-based positions of the cells in the same block as `(row, col)`, itself included.
    pub fn block_of(self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
        let b = self.block_size();
        let (br, bc) = ((row / b) * b, (col / b) * b);
        (br..br + b).cartesian_product(bc..bc + b)
    }
}

fn digit(d: usize) -> i64 {
    i64::try_from(d).expect("digit fits in i64")
}

/// One integer variable per cell, named `x_<row>_<col>` with 1-based indices.
pub fn cell_vars(store: &mut ConstraintStore, size: Size) -> Vec<Vec<IntVar>> {
    let n = usize::from(size);
    (1..=n)
        .map(|i| (1..=n).map(|j| store.int_var(format!("x_{i}_{j}"))).collect())
        .collect()
}

/// Every cell holds a digit in `1..=size`.
#[must_use]
pub fn cell_constraints(vars: &[Vec<IntVar>]) -> Vec<Formula> {
    let n = digit(vars.len());
    vars.iter().flatten().map(|x| x.within(1, n)).collect()
}

/// `cell == d` forces every cell of `others` to differ from `d`.
fn unique_digit(cell: IntVar, d: i64, others: impl Iterator<Item = IntVar>) -> Formula {
    cell.equals(d)
        .implies(Formula::and(others.map(|other| other.differs_from(d))))
}

/// Each row contains a digit at most once: one implication per cell and digit.
#[must_use]
pub fn row_constraints(vars: &[Vec<IntVar>]) -> Vec<Formula> {
    let n = vars.len();
    let mut constraints = Vec::with_capacity(n * n * n);
    for row in 0..n {
        for col in 0..n {
            for d in (1..=n).map(digit) {
                let others = (0..n).filter(|&c| c != col).map(|c| vars[row][c]);
                constraints.push(unique_digit(vars[row][col], d, others));
            }
        }
    }
    constraints
}

/// Each column contains a digit at most once: one implication per cell and digit.
#[must_use]
pub fn column_constraints(vars: &[Vec<IntVar>]) -> Vec<Formula> {
    let n = vars.len();
    let mut constraints = Vec::with_capacity(n * n * n);
    for col in 0..n {
        for row in 0..n {
            for d in (1..=n).map(digit) {
                let others = (0..n).filter(|&r| r != row).map(|r| vars[r][col]);
                constraints.push(unique_digit(vars[row][col], d, others));
            }
        }
    }
    constraints
}

/// Each block contains a digit at most once: one implication per cell and digit.
#[must_use]
pub fn block_constraints(vars: &[Vec<IntVar>], size: Size) -> Vec<Formula> {
    let n = vars.len();
    let mut constraints = Vec::with_capacity(n * n * n);
    for (row, col) in (0..n).cartesian_product(0..n) {
        for d in (1..=n).map(digit) {
            let others = size
                .block_of(row, col)
                .filter(|&cell| cell != (row, col))
                .map(|(r, c)| vars[r][c]);
            constraints.push(unique_digit(vars[row][col], d, others));
        }
    }
    constraints
}

/// One constraint per cell: `true` for an empty cell, `x == digit` for a given one.
#[must_use]
pub fn instance_constraints(vars: &[Vec<IntVar>], board: &Board) -> Vec<Formula> {
    vars.iter()
        .zip(board.rows())
        .flat_map(|(xs, ds)| xs.iter().zip(ds))
        .map(|(x, &d)| {
            if d == 0 {
                Formula::TRUE
            } else {
                x.equals(digit(d))
            }
        })
        .collect()
}

/// One boolean per cell and digit, `x_<row>_<col>_<digit>`, true when the cell holds the digit.
pub fn digit_vars(store: &mut ConstraintStore, size: Size) -> Vec<Vec<Vec<BoolVar>>> {
    let n = usize::from(size);
    (1..=n)
        .map(|i| {
            (1..=n)
                .map(|j| {
                    (1..=n)
                        .map(|d| store.bool_var(format!("x_{i}_{j}_{d}")))
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// `not a or not b` for every pair of `cells`.
fn at_most_one(cells: &[BoolVar]) -> impl Iterator<Item = Formula> + '_ {
    cells
        .iter()
        .tuple_combinations()
        .map(|(a, b)| Formula::or([!a.lit(), !b.lit()]))
}

/// Clause-shaped Sudoku rules over [`digit_vars`]: every cell holds exactly one digit, no digit
/// repeats in a row, column or block, and the givens of `board` hold.
#[must_use]
pub fn digit_constraints(vars: &[Vec<Vec<BoolVar>>], size: Size, board: &Board) -> Vec<Formula> {
    let n = vars.len();
    let mut constraints = Vec::new();

    for cell in vars.iter().flatten() {
        constraints.push(Formula::or(cell.iter().map(|v| v.lit())));
        constraints.extend(at_most_one(cell));
    }

    for d in 0..n {
        for row in 0..n {
            let cells = (0..n).map(|c| vars[row][c][d]).collect_vec();
            constraints.extend(at_most_one(&cells).collect_vec());
        }
        for col in 0..n {
            let cells = (0..n).map(|r| vars[r][col][d]).collect_vec();
            constraints.extend(at_most_one(&cells).collect_vec());
        }
        let b = size.block_size();
        for (br, bc) in (0..n).step_by(b).cartesian_product((0..n).step_by(b)) {
            let cells = size.block_of(br, bc).map(|(r, c)| vars[r][c][d]).collect_vec();
            constraints.extend(at_most_one(&cells).collect_vec());
        }
    }

    for (r, row) in board.rows().iter().enumerate() {
        for (c, &d) in row.iter().enumerate() {
            if d != 0 {
                constraints.push(vars[r][c][d - 1].lit());
            }
        }
    }

    constraints
}

/// A Sudoku instance together with the encoding to solve it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sudoku {
    /// The givens; 0 marks an empty cell.
    pub board: Board,
    /// The size of `board`.
    pub size: Size,
    /// How the puzzle is turned into constraints.
    pub encoding: Encoding,
}

/// The variables of either encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SudokuVars {
    /// [`cell_vars`], by row and column.
    Integer(Vec<Vec<IntVar>>),
    /// [`digit_vars`], by row, column and digit.
    Boolean(Vec<Vec<Vec<BoolVar>>>),
}

impl Sudoku {
    /// A puzzle for `board`, in the integer encoding.
    ///
    /// # Errors
    ///
    /// If the board is not square, not one of the supported sizes, or holds a digit larger than
    /// its size. The error names the offending row.
    pub fn new(board: Board) -> Result<Self> {
        let size = Size::try_from(board.size())?;
        let n = board.size();
        for (r, row) in board.rows().iter().enumerate() {
            if row.len() != n {
                return Err(Error::SudokuParse {
                    line: r + 1,
                    reason: format!("row has {} cells, expected {n}", row.len()),
                });
            }
            if let Some(d) = row.iter().find(|&&d| d > n) {
                return Err(Error::SudokuParse {
                    line: r + 1,
                    reason: format!("digit {d} is larger than {n}"),
                });
            }
        }
        Ok(Self {
            board,
            size,
            encoding: Encoding::Integer,
        })
    }

    /// The same puzzle in another encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

impl Display for Sudoku {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board)
    }
}

impl Problem for Sudoku {
    type Vars = SudokuVars;
    type Solution = Board;

    fn name(&self) -> String {
        let n = usize::from(self.size);
        format!("{n}x{n} sudoku ({} encoding)", self.encoding)
    }

    fn encode(&self, store: &mut ConstraintStore) -> SudokuVars {
        match self.encoding {
            Encoding::Integer => {
                let vars = cell_vars(store, self.size);
                store.extend(instance_constraints(&vars, &self.board));
                store.extend(cell_constraints(&vars));
                store.extend(row_constraints(&vars));
                store.extend(column_constraints(&vars));
                store.extend(block_constraints(&vars, self.size));
                SudokuVars::Integer(vars)
            }
            Encoding::Boolean => {
                let vars = digit_vars(store, self.size);
                store.extend(digit_constraints(&vars, self.size, &self.board));
                SudokuVars::Boolean(vars)
            }
        }
    }

    fn decode(&self, vars: &SudokuVars, model: &Model) -> Board {
        let grid = match vars {
            SudokuVars::Integer(vars) => vars
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|&x| usize::try_from(model.int(x)).unwrap_or(0))
                        .collect()
                })
                .collect(),
            SudokuVars::Boolean(vars) => vars
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| cell.iter().position(|&v| model.bool(v)).map_or(0, |d| d + 1))
                        .collect()
                })
                .collect(),
        };
        Board::new(grid)
    }
}

/// Parses a Sudoku from text.
///
/// One row per line. Cells are separated by whitespace, or written without separators when every
/// digit is a single character. `0` and `.` mark empty cells, `|` tokens and lines made of `-` and
/// `+` are ignored, as are blank lines and lines starting with `#` or `c`.
///
/// # Errors
///
/// If a line cannot be read or holds something other than a digit, if the rows differ in length,
/// or if [`Sudoku::new`] rejects the grid.
pub fn parse_sudoku<R: BufRead>(reader: R) -> Result<Sudoku> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| Error::SudokuParse {
            line: line_no,
            reason: e.to_string(),
        })?;
        let line = line.trim();

        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with('c')
            || line.chars().all(|ch| matches!(ch, '-' | '+' | ' '))
        {
            continue;
        }

        let tokens = line.split_whitespace().filter(|t| *t != "|").collect_vec();
        let row = match tokens.as_slice() {
            [compact] if compact.len() > 1 => compact
                .chars()
                .filter(|&ch| ch != '|')
                .map(|ch| parse_cell(&ch.to_string(), line_no))
                .collect::<Result<Vec<_>>>()?,
            _ => tokens
                .iter()
                .map(|t| parse_cell(t, line_no))
                .collect::<Result<Vec<_>>>()?,
        };
        rows.push((line_no, row));
    }

    let n = rows.len();
    Size::try_from(n)?;
    for (line, row) in &rows {
        if row.len() != n {
            return Err(Error::SudokuParse {
                line: *line,
                reason: format!("row has {} cells, expected {n}", row.len()),
            });
        }
    }

    Sudoku::new(Board::new(rows.into_iter().map(|(_, row)| row).collect()))
}

fn parse_cell(token: &str, line: usize) -> Result<usize> {
    if token == "." {
        return Ok(0);
    }
    token.parse().map_err(|e| Error::SudokuParse {
        line,
        reason: format!("failed to parse cell '{token}': {e}"),
    })
}

/// Reads a Sudoku file; see [`parse_sudoku`] for the format.
///
/// # Errors
///
/// If the file cannot be opened, or see [`parse_sudoku`].
pub fn parse_sudoku_file(path: impl AsRef<Path>) -> Result<Sudoku> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    parse_sudoku(BufReader::new(file))
}
