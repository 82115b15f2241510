#![allow(clippy::cast_precision_loss)]

use clap::{Args, Parser, Subcommand};
use log::{debug, info, warn};
use sat_puzzles::coloring::solver::{Coloring, Graph, parse_graph_file};
use sat_puzzles::pigeonhole::solver::Pigeonhole;
use sat_puzzles::problem::{
    Dump, DumpFormat, Encoding, Outcome, Report, SolveOptions, SolveStats, solve,
};
use sat_puzzles::sat::dimacs::parse_file;
use sat_puzzles::sat::solver::{SatAnswer, Solver, Splr};
use sat_puzzles::sudoku::solver::{Board, EXAMPLE_NINE, Sudoku, parse_sudoku_file};
use sat_puzzles::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tikv_jemalloc_ctl::{epoch, stats};

/// Defines the command-line interface of the puzzle encoder.
#[derive(Parser, Debug)]
#[command(
    name = "sat-puzzles",
    version,
    about = "Encodes combinatorial puzzles as constraint problems and solves them with a SAT solver"
)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Place pigeons in holes, at most one per hole. Unsatisfiable with more pigeons than holes.
    Pigeonhole {
        /// Number of holes.
        holes: usize,

        /// Number of pigeons; one more than the holes when omitted.
        #[arg(long)]
        pigeons: Option<usize>,

        #[arg(short, long, default_value_t = Encoding::Integer)]
        encoding: Encoding,

        /// Format of the dump written before solving (`problem.cnf` or `problem.smt2`).
        ///
        /// Only the DIMACS dump can be read back, by the `dimacs` command; the SMT-LIB dump is
        /// meant for an external SMT solver.
        #[arg(long, default_value_t = DumpFormat::Smt2)]
        dump_format: DumpFormat,

        /// Do not write the dump.
        #[arg(long, default_value_t = false)]
        no_dump: bool,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a Sudoku puzzle. The built-in 9x9 example is used when no path is given.
    Sudoku {
        /// Path to the Sudoku file. See `sudoku::solver::parse_sudoku` for the format.
        #[arg(long)]
        path: Option<PathBuf>,

        #[arg(short, long, default_value_t = Encoding::Integer)]
        encoding: Encoding,

        /// Write the generated CNF next to the puzzle as `<path>.cnf`.
        #[arg(short = 'x', long, default_value_t = false)]
        export_dimacs: bool,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Colour the nodes of a graph so that no edge joins two nodes of the same colour.
    Coloring {
        /// Path to a graph in the DIMACS edge format. A triangle is used when omitted.
        #[arg(long)]
        path: Option<PathBuf>,

        /// Number of colours.
        #[arg(short = 'k', long, default_value_t = 3)]
        colors: usize,

        /// Enumerate every colouring instead of finding one.
        #[arg(long, default_value_t = false)]
        all: bool,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve every `.sudoku` and `.cnf` file below a directory.
    Batch {
        dir: PathBuf,

        #[arg(short, long, default_value_t = Encoding::Integer)]
        encoding: Encoding,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a CNF file in DIMACS format.
    Dimacs {
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    pub(crate) const fn common(&self) -> Option<&CommonOptions> {
        match self {
            Self::Pigeonhole { common, .. }
            | Self::Sudoku { common, .. }
            | Self::Coloring { common, .. }
            | Self::Batch { common, .. }
            | Self::Dimacs { common, .. } => Some(common),
            Self::Completions { .. } => None,
        }
    }
}

/// Defines common command-line options shared across different subcommands.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Enable debug logging.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Check the model against every asserted constraint.
    #[arg(short, long, default_value_t = false)]
    pub(crate) verify: bool,

    /// Print problem and timing statistics after solving.
    #[arg(short, long, default_value_t = false)]
    pub(crate) stats: bool,

    /// Print the satisfying assignment with its variable names.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,
}

impl CommonOptions {
    fn solve_options(&self, dump: Option<Dump>) -> SolveOptions {
        SolveOptions {
            dump,
            verify: self.verify,
        }
    }
}

/// Sets up `env_logger`: `--debug` raises the level to `Debug`, and `RUST_LOG` still applies.
pub(crate) fn init_logging(debug: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .target(env_logger::Target::Stdout)
        .init();
}

/// Allocated and resident memory in MiB, as reported by jemalloc.
fn memory_usage() -> (f64, f64) {
    if let Err(e) = epoch::advance() {
        warn!("Could not refresh jemalloc statistics: {e}");
    }
    let to_mib = |bytes: usize| bytes as f64 / (1024.0 * 1024.0);
    (
        stats::allocated::read().map_or(0.0, to_mib),
        stats::resident::read().map_or(0.0, to_mib),
    )
}

/// Helper function to print a single statistic line in a formatted table row.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate (value/second).
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of problem and search statistics.
pub(crate) fn print_stats(stats: &SolveStats) {
    let (allocated, resident) = memory_usage();
    let solve_secs = stats.solve_time.as_secs_f64();

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Constraints", stats.constraints);
    stat_line("Variables", stats.variables);
    stat_line("Clauses", stats.clauses);
    stat_line("Literals", stats.literals);
    stat_line("Encode time (s)", format!("{:.3}", stats.encode_time.as_secs_f64()));
    println!("========================[ Search Statistics ]========================");
    stat_line_with_rate("Clauses", stats.clauses, solve_secs);
    stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
    stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    stat_line("Solve time (s)", format!("{solve_secs:.3}"));
    println!("=====================================================================");
}

/// Prints what every command prints after a solve: verification, statistics and the model.
fn print_report<S>(report: &Report<S>, common: &CommonOptions) {
    if let Some(verified) = report.stats.verified {
        println!("Verified: {verified:?}");
    }
    if common.stats {
        print_stats(&report.stats);
    }
    if common.print_solution {
        if let Some(model) = &report.model {
            println!("Model: {model}");
        }
    }
}

/// Prints the line solvers print when they give up.
fn print_unknown(reason: &str) {
    println!("\"unknown\" (with reason \"{reason}\") returned by the solver, aborting!");
}

/// Solves one pigeonhole instance, dumping the store to `problem.cnf` or `problem.smt2` first.
///
/// # Errors
///
/// If the dump cannot be written or verification fails.
pub(crate) fn solve_pigeonhole(
    holes: usize,
    pigeons: Option<usize>,
    encoding: Encoding,
    dump: Option<DumpFormat>,
    common: &CommonOptions,
) -> Result<()> {
    let php = Pigeonhole::new(holes)
        .with_pigeons(pigeons.unwrap_or(holes + 1))
        .with_encoding(encoding);

    println!("---");
    println!(
        "Solving PHP for {} pigeons and {} holes",
        php.pigeons, php.holes
    );

    let dump = dump.map(|format| Dump::in_dir(".", format));
    let report = solve(&php, &common.solve_options(dump))?;

    println!("The solver says: {}", report.outcome.verdict());
    match &report.outcome {
        Outcome::Solved(placement) => {
            for (pigeon, hole) in placement.iter().enumerate() {
                println!("pigeon {pigeon} -> hole {hole}");
            }
        }
        Outcome::Unsatisfiable => {}
        Outcome::Unknown(reason) => print_unknown(reason),
    }
    println!(
        "Time to solve = {:12.2}[s]",
        report.stats.total_time().as_secs_f64()
    );
    println!("Solution: {}", report.outcome.summary());

    print_report(&report, common);
    Ok(())
}

/// Solves a Sudoku file, or the built-in example when `path` is `None`.
///
/// # Errors
///
/// If the file cannot be read or parsed, the export cannot be written, or verification fails.
pub(crate) fn solve_sudoku(
    path: Option<&Path>,
    encoding: Encoding,
    export_dimacs: bool,
    common: &CommonOptions,
) -> Result<()> {
    let sudoku = match path {
        Some(path) => {
            info!("Solving: {}", path.display());
            parse_sudoku_file(path)?
        }
        None => Sudoku::new(Board::from(EXAMPLE_NINE))?,
    }
    .with_encoding(encoding);

    println!("Parsed Sudoku:\n{sudoku}");

    let dump = export_dimacs.then(|| {
        let target = path.map_or_else(
            || PathBuf::from("sudoku.cnf"),
            |p| PathBuf::from(format!("{}.cnf", p.display())),
        );
        Dump {
            path: target,
            format: DumpFormat::Dimacs,
        }
    });
    let written = dump.as_ref().map(|d| d.path.clone());

    let report = solve(&sudoku, &common.solve_options(dump))?;
    if let Some(path) = written {
        println!("DIMACS written to: {}", path.display());
    }
    match &report.outcome {
        Outcome::Solved(board) => {
            println!("Solution:\n{board}");
            if !board.agrees_with(&sudoku.board) || !board.is_valid_solution() {
                warn!("Decoded board is not a valid completion of the puzzle");
            }
        }
        Outcome::Unsatisfiable => println!("No solution found"),
        Outcome::Unknown(reason) => print_unknown(reason),
    }

    print_report(&report, common);
    Ok(())
}

/// Decides `colors`-colourability of a graph file, or of a triangle when `path` is `None`.
///
/// # Errors
///
/// If the graph cannot be read or parsed, or verification fails.
pub(crate) fn solve_coloring(
    path: Option<&Path>,
    colors: usize,
    all: bool,
    common: &CommonOptions,
) -> Result<()> {
    let graph = match path {
        Some(path) => parse_graph_file(path)?,
        None => Graph::triangle(),
    };
    let coloring = Coloring::new(graph, colors);

    println!("The {colors}-coloring problem");

    if all {
        let time = Instant::now();
        let colorings = coloring.all_colorings();
        for (i, colors) in colorings.found.iter().enumerate() {
            println!("coloring {}: {colors:?}", i + 1);
        }
        println!("Found {} colorings", colorings.found.len());
        if let Some(reason) = &colorings.interrupted {
            print_unknown(reason);
        }
        debug!("Enumeration took {:?}", time.elapsed());
        return Ok(());
    }

    let report = solve(&coloring, &common.solve_options(None))?;
    match &report.outcome {
        Outcome::Solved(assignment) => {
            println!("\tThe graph is {colors}-colorable.");
            for (node, color) in assignment.iter().enumerate() {
                println!("node {node} is color {color}");
            }
        }
        Outcome::Unsatisfiable => println!("\tNo {colors}-coloring is found!"),
        Outcome::Unknown(reason) => print_unknown(reason),
    }

    print_report(&report, common);
    Ok(())
}

/// Solves a DIMACS file directly.
///
/// # Errors
///
/// If the file cannot be read or parsed.
pub(crate) fn solve_dimacs(path: &Path, common: &CommonOptions) -> Result<()> {
    info!("Solving: {}", path.display());

    let time = Instant::now();
    let cnf = parse_file(path)?;
    let parse_time = time.elapsed();
    debug!(
        "Parsed {} variables and {} clauses in {parse_time:?}",
        cnf.num_vars,
        cnf.clauses.len()
    );

    let mut solver = Splr;
    let time = Instant::now();
    let answer = solver.solve(&cnf);
    let solve_time = time.elapsed();

    let mut stats = SolveStats {
        constraints: cnf.clauses.len(),
        variables: cnf.num_vars as usize,
        clauses: cnf.clauses.len(),
        literals: cnf.num_literals(),
        encode_time: parse_time,
        solve_time,
        verified: None,
    };

    match &answer {
        SatAnswer::Sat(assignment) => {
            if common.verify {
                let ok = cnf.verify(assignment);
                stats.verified = Some(ok);
                println!("Verified: {ok:?}");
            }
            if common.print_solution {
                let model = (1..assignment.len())
                    .map(|v| if assignment[v] { v.to_string() } else { format!("-{v}") })
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("Model: {model}");
            }
        }
        SatAnswer::Unsat => {}
        SatAnswer::Unknown(reason) => print_unknown(reason),
    }

    if common.stats {
        print_stats(&stats);
    }

    match answer {
        SatAnswer::Sat(_) => println!("\nSATISFIABLE"),
        SatAnswer::Unsat => println!("\nUNSATISFIABLE"),
        SatAnswer::Unknown(_) => println!("\nUNKNOWN"),
    }
    Ok(())
}

/// Solves every `.sudoku` and `.cnf` file below `dir`.
///
/// # Errors
///
/// If `dir` is not a directory, or any file fails to parse.
pub(crate) fn solve_dir(dir: &Path, encoding: Encoding, common: &CommonOptions) -> Result<()> {
    if !dir.is_dir() {
        return Err(Error::Io {
            path: dir.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotADirectory),
        });
    }

    for entry in walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("sudoku") => solve_sudoku(Some(path), encoding, false, common)?,
            Some("cnf") => solve_dimacs(path, common)?,
            _ => debug!("Skipping {}", path.display()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_pigeonhole() {
        let cli = Cli::try_parse_from([
            "sat-puzzles",
            "pigeonhole",
            "3",
            "--encoding",
            "boolean",
            "--dump-format",
            "dimacs",
            "--stats",
        ])
        .unwrap();
        match cli.command {
            Commands::Pigeonhole {
                holes,
                pigeons,
                encoding,
                dump_format,
                no_dump,
                common,
            } => {
                assert_eq!(holes, 3);
                assert_eq!(pigeons, None);
                assert_eq!(encoding, Encoding::Boolean);
                assert_eq!(dump_format, DumpFormat::Dimacs);
                assert!(!no_dump);
                assert!(common.stats);
                assert!(!common.debug);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_pigeonhole_dumps_smt2_by_default() {
        let cli = Cli::try_parse_from(["sat-puzzles", "pigeonhole", "3"]).unwrap();
        let Commands::Pigeonhole { dump_format, no_dump, .. } = cli.command else {
            panic!("expected the pigeonhole command");
        };
        assert_eq!(dump_format, DumpFormat::Smt2);
        assert!(!no_dump);

        let cmd = Cli::command();
        let help = cmd
            .find_subcommand("pigeonhole")
            .and_then(|sub| sub.get_arguments().find(|arg| arg.get_id() == "dump_format"))
            .and_then(|arg| arg.get_long_help())
            .map(ToString::to_string)
            .unwrap_or_default();
        assert!(help.contains("Only the DIMACS dump can be read back"));
    }

    #[test]
    fn test_parse_coloring_defaults() {
        let cli = Cli::try_parse_from(["sat-puzzles", "coloring", "--all"]).unwrap();
        match cli.command {
            Commands::Coloring {
                path, colors, all, ..
            } => {
                assert_eq!(path, None);
                assert_eq!(colors, 3);
                assert!(all);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_completions_has_no_common_options() {
        let cli = Cli::try_parse_from(["sat-puzzles", "completions", "bash"]).unwrap();
        assert!(cli.command.common().is_none());
    }

    #[test]
    fn test_solve_dir_rejects_files() {
        let err = solve_dir(Path::new("Cargo.toml"), Encoding::Integer, &CommonOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
