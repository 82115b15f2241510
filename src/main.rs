//! # sat-puzzles
//!
//! `sat-puzzles` encodes classic combinatorial problems as constraint problems over integer and
//! boolean variables, translates them to CNF and hands them to the `splr` SAT solver.
//!
//! ## Usage
//!
//! ```sh
//! sat-puzzles [SUBCOMMAND] [OPTIONS]
//! ```
//!
//! ### Subcommands
//!
//! 1.  **`pigeonhole`**: Place `n + 1` pigeons into `n` holes, which is always unsatisfiable.
//!     The constraint store is written to `problem.smt2` (or `problem.cnf`) before solving.
//!     ```sh
//!     sat-puzzles pigeonhole 5 [--pigeons P] [--encoding integer|boolean] [--dump-format dimacs|smt2] [--no-dump]
//!     ```
//!
//! 2.  **`sudoku`**: Solve a Sudoku puzzle, or the built-in example when no path is given.
//!     ```sh
//!     sat-puzzles sudoku --path puzzle.sudoku --export-dimacs
//!     ```
//!
//! 3.  **`coloring`**: Decide whether a graph in the DIMACS edge format is k-colourable, or list
//!     every colouring.
//!     ```sh
//!     sat-puzzles coloring --path graph.col --colors 3 --all
//!     ```
//!
//! 4.  **`batch`**: Solve every `.sudoku` and `.cnf` file below a directory.
//!
//! 5.  **`dimacs`**: Solve a CNF file in DIMACS format.
//!
//! 6.  **`completions`**: Print a shell completion script.
//!
//! ### Common Options
//!
//! -   `-d, --debug`: Enable debug logging. `RUST_LOG` is honoured as well.
//! -   `-v, --verify`: Check the model against every asserted constraint.
//! -   `-s, --stats`: Print problem and timing statistics.
//! -   `-p, --print-solution`: Print the model with its variable names.

use crate::command_line::cli::{
    Cli, Commands, init_logging, solve_coloring, solve_dimacs, solve_dir, solve_pigeonhole,
    solve_sudoku,
};
use clap::{CommandFactory, Parser};
use log::error;

mod command_line;

/// Global allocator using `tikv-jemallocator`, which also backs the memory statistics.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() {
    if let Err(e) = run() {
        error!("Execution failed, error: {e}");
        std::process::exit(1);
    }
}

fn run() -> sat_puzzles::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.command.common().is_some_and(|c| c.debug));

    match cli.command {
        Commands::Pigeonhole {
            holes,
            pigeons,
            encoding,
            dump_format,
            no_dump,
            common,
        } => solve_pigeonhole(
            holes,
            pigeons,
            encoding,
            (!no_dump).then_some(dump_format),
            &common,
        ),
        Commands::Sudoku {
            path,
            encoding,
            export_dimacs,
            common,
        } => solve_sudoku(path.as_deref(), encoding, export_dimacs, &common),
        Commands::Coloring {
            path,
            colors,
            all,
            common,
        } => solve_coloring(path.as_deref(), colors, all, &common),
        Commands::Batch {
            dir,
            encoding,
            common,
        } => solve_dir(&dir, encoding, &common),
        Commands::Dimacs { path, common } => solve_dimacs(&path, &common),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}
