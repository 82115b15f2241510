use sat_puzzles::pigeonhole::solver::{Pigeonhole, one_pigeon_only, pigeon_in_hole, pigeon_vars};
use sat_puzzles::problem::{Dump, DumpFormat, Encoding, Outcome, Problem, SolveOptions, solve};
use sat_puzzles::sat::dimacs::{parse_dimacs, parse_file};
use sat_puzzles::sat::solver::{SatAnswer, Solver, Splr};
use sat_puzzles::sat::store::{ConstraintStore, SolveResult};
use sat_puzzles::sudoku::solver::{
    Board, SOLVED_NINE, Size, Sudoku, block_constraints, cell_vars, column_constraints,
    row_constraints,
};

fn verified() -> SolveOptions {
    SolveOptions {
        verify: true,
        ..SolveOptions::default()
    }
}

fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("sat-puzzles-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn pigeonhole_with_one_pigeon_too_many_is_unsat() {
    for holes in 1..=5 {
        for encoding in [Encoding::Integer, Encoding::Boolean] {
            let php = Pigeonhole::new(holes).with_encoding(encoding);
            let report = solve(&php, &verified()).unwrap();
            assert_eq!(report.outcome, Outcome::Unsatisfiable, "{}", php.name());
        }
    }
}

#[test]
fn pigeonhole_dimacs_dump_round_trips() {
    let dir = scratch_dir("php-dimacs");
    for holes in 1..=4 {
        let php = Pigeonhole::new(holes);
        let options = SolveOptions {
            dump: Some(Dump::in_dir(&dir, DumpFormat::Dimacs)),
            verify: false,
        };
        let report = solve(&php, &options).unwrap();

        let reparsed = parse_file(dir.join("problem.cnf")).unwrap();
        assert_eq!(reparsed.clauses.len(), report.stats.clauses);
        assert_eq!(Splr.solve(&reparsed), SatAnswer::Unsat);
        assert_eq!(report.outcome, Outcome::Unsatisfiable);
    }
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn satisfiable_dump_round_trips() {
    let php = Pigeonhole::new(3).with_pigeons(3);
    let mut store = ConstraintStore::new();
    php.encode(&mut store);
    let encoded = store.encode();

    let reparsed = parse_dimacs(encoded.cnf.to_string().as_bytes()).unwrap();
    assert_eq!(reparsed, encoded.cnf);
    let SatAnswer::Sat(assignment) = Splr.solve(&reparsed) else {
        panic!("three pigeons fit in three holes");
    };
    assert!(reparsed.verify(&assignment));
    assert!(store.violated(&encoded.decode(&assignment)).is_empty());
}

#[test]
fn pigeonhole_smt2_dump_declares_every_pigeon() {
    let mut store = ConstraintStore::new();
    let vars = pigeon_vars(&mut store, 3);
    store.extend(pigeon_in_hole(&vars, 2));
    store.extend(one_pigeon_only(&vars, 2));

    let text = store.to_smt2();
    for p in 0..3 {
        assert!(text.contains(&format!("(declare-fun x_{p} () Int)")));
    }
    assert_eq!(text.matches("(assert ").count(), 3 + 6);
    assert!(text.contains("(assert (=> (= x_0 1) (and (or (< x_1 1) (> x_1 1)) (or (< x_2 1) (> x_2 1)))))"));
    assert_eq!(store.check(), SolveResult::Unsat);
}

#[test]
fn complete_sudoku_solves_to_itself() {
    let grid = Board::from(SOLVED_NINE);
    for encoding in [Encoding::Integer, Encoding::Boolean] {
        let sudoku = Sudoku::new(grid.clone()).unwrap().with_encoding(encoding);
        let report = solve(&sudoku, &verified()).unwrap();
        assert!(grid.is_complete());
        assert_eq!(report.outcome, Outcome::Solved(grid.clone()));
    }
}

#[test]
fn derived_sudokus_keep_their_givens() {
    let grid = Board::from(SOLVED_NINE);
    for seed in 0..4 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let puzzle = grid.derive_puzzle(30 + 10 * usize::try_from(seed).unwrap(), &mut rng);
        let sudoku = Sudoku::new(puzzle.clone()).unwrap();

        let solution = solve(&sudoku, &verified())
            .unwrap()
            .outcome
            .into_solution()
            .unwrap_or_else(|| panic!("puzzle derived with seed {seed} must be solvable"));
        assert!(solution.is_complete());
        assert!(solution.agrees_with(&puzzle));
        assert!(solution.is_valid_solution());
    }
}

#[test]
fn repeated_digit_in_a_row_is_unsat() {
    let mut grid = [[0; 9]; 9];
    grid[4][1] = 7;
    grid[4][6] = 7;
    let sudoku = Sudoku::new(Board::from(grid)).unwrap();
    assert_eq!(solve(&sudoku, &verified()).unwrap().outcome, Outcome::Unsatisfiable);
}

#[test]
fn uniqueness_generators_emit_one_constraint_per_cell_and_digit() {
    let mut store = ConstraintStore::new();
    let vars = cell_vars(&mut store, Size::Nine);
    assert_eq!(row_constraints(&vars).len(), 9 * 9 * 9);
    assert_eq!(column_constraints(&vars).len(), 9 * 9 * 9);
    assert_eq!(block_constraints(&vars, Size::Nine).len(), 9 * 9 * 9);

    let mut store = ConstraintStore::new();
    let vars = cell_vars(&mut store, Size::Four);
    assert_eq!(row_constraints(&vars).len(), 64);
}
