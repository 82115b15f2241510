use crate::error::{Error, Result};
use crate::problem::Problem;
use crate::sat::expr::{Formula, IntVar};
use crate::sat::model::Model;
use crate::sat::solver::{Solver, Splr};
use crate::sat::store::{ConstraintStore, SolveResult};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// An undirected graph stored as adjacency lists; every edge is kept once, under its smaller
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Graph {
    adjacency: Vec<Vec<usize>>,
}

impl Graph {
    /// A graph with `nodes` nodes and no edges.
    #[must_use]
    pub fn new(nodes: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); nodes],
        }
    }

    /// Three nodes, all connected.
    #[must_use]
    pub fn triangle() -> Self {
        let mut graph = Self::new(3);
        graph.add_edge(0, 1);
        graph.add_edge(0, 2);
        graph.add_edge(1, 2);
        graph
    }

    /// Number of nodes.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of edges, duplicates included.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Adds the edge between two zero-based nodes. Duplicates are kept.
    ///
    /// # Panics
    ///
    /// If either node is out of range.
    pub fn add_edge(&mut self, a: usize, b: usize) {
        assert!(
            a < self.num_nodes() && b < self.num_nodes(),
            "edge ({a}, {b}) outside a graph of {} nodes",
            self.num_nodes()
        );
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.adjacency[lo].push(hi);
    }

    /// Neighbours of `node` that are not smaller than it.
    #[must_use]
    pub fn edges_of(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    /// Every edge as `(smaller, larger)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(a, ns)| ns.iter().map(move |&b| (a, b)))
    }
}

/// Parses a graph in the DIMACS edge format: `c` comment lines, one `p edge <nodes> <edges>`
/// line, then `e <a> <b>` lines with 1-based nodes.
///
/// # Errors
///
/// If a line cannot be read or parsed, an edge comes before the problem line, or an edge names a
/// node that does not exist.
pub fn parse_graph<R: BufRead>(reader: R) -> Result<Graph> {
    let mut graph: Option<Graph> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let err = |reason: String| Error::GraphParse {
            line: line_no,
            reason,
        };
        let line = line.map_err(|e| err(e.to_string()))?;
        let mut parts = line.split_whitespace();

        match parts.next() {
            None | Some("c") => {}
            Some("p") => {
                let nodes = match (parts.next(), parts.next()) {
                    (Some("edge" | "col"), Some(nodes)) => nodes
                        .parse::<usize>()
                        .map_err(|e| err(format!("invalid node count '{nodes}': {e}")))?,
                    _ => return Err(err(format!("malformed problem line '{line}'"))),
                };
                graph = Some(Graph::new(nodes));
            }
            Some("e") => {
                let graph = graph
                    .as_mut()
                    .ok_or_else(|| err("edge before the problem line".to_string()))?;
                let mut node = || -> Result<usize> {
                    let token = parts
                        .next()
                        .ok_or_else(|| err("edge needs two nodes".to_string()))?;
                    let n = token
                        .parse::<usize>()
                        .map_err(|e| err(format!("invalid node '{token}': {e}")))?;
                    if n == 0 || n > graph.num_nodes() {
                        return Err(err(format!("node {n} is not in 1..={}", graph.num_nodes())));
                    }
                    Ok(n - 1)
                };
                let a = node()?;
                let b = node()?;
                graph.add_edge(a, b);
            }
            Some(other) => return Err(err(format!("unexpected line type '{other}'"))),
        }
    }

    graph.ok_or_else(|| Error::GraphParse {
        line: 0,
        reason: "missing problem line".to_string(),
    })
}

/// Reads a graph file; see [`parse_graph`] for the format.
///
/// # Errors
///
/// If the file cannot be opened, or see [`parse_graph`].
pub fn parse_graph_file(path: impl AsRef<Path>) -> Result<Graph> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    parse_graph(BufReader::new(file))
}

/// One integer variable per node, `v_<node>`, holding its colour.
pub fn node_vars(store: &mut ConstraintStore, graph: &Graph) -> Vec<IntVar> {
    (0..graph.num_nodes())
        .map(|n| store.int_var(format!("v_{n}")))
        .collect()
}

/// Every node takes one of the colours `1..=colors`.
#[must_use]
pub fn color_constraints(vars: &[IntVar], colors: usize) -> Vec<Formula> {
    let k = i64::try_from(colors).unwrap_or(i64::MAX);
    vars.iter().map(|v| v.within(1, k)).collect()
}

/// The endpoints of every edge get different colours: for each edge and colour `c`,
/// `v_a == c -> v_b != c`.
#[must_use]
pub fn edge_constraints(graph: &Graph, vars: &[IntVar], colors: usize) -> Vec<Formula> {
    let k = i64::try_from(colors).unwrap_or(i64::MAX);
    graph
        .edges()
        .map(|(a, b)| {
            Formula::and((1..=k).map(|c| vars[a].equals(c).implies(vars[b].differs_from(c))))
        })
        .collect()
}

/// Excludes exactly the colouring `colors` from the solutions.
#[must_use]
pub fn blocking_constraint(vars: &[IntVar], colors: &[usize]) -> Formula {
    Formula::or(
        vars.iter()
            .zip(colors)
            .map(|(v, &c)| v.differs_from(i64::try_from(c).unwrap_or(i64::MAX))),
    )
}

/// Colouring the nodes of a graph with `colors` colours so that no edge joins equal colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coloring {
    /// The graph to colour.
    pub graph: Graph,
    /// Number of colours, numbered from 1.
    pub colors: usize,
}

/// The colourings [`Coloring::all_colorings`] found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Colorings {
    /// The colourings in the order the solver produced them.
    pub found: Vec<Vec<usize>>,
    /// Why the enumeration stopped early, if the solver gave up.
    pub interrupted: Option<String>,
}

impl Coloring {
    /// Colouring `graph` with `colors` colours.
    #[must_use]
    pub const fn new(graph: Graph, colors: usize) -> Self {
        Self { graph, colors }
    }

    /// Every valid colouring, found one at a time by forbidding each colouring once seen.
    #[must_use]
    pub fn all_colorings(&self) -> Colorings {
        self.all_colorings_with(&mut Splr)
    }

    /// [`Self::all_colorings`] with `solver`. The store is encoded once; each colouring found
    /// only adds the clauses of its blocking constraint.
    pub fn all_colorings_with<S: Solver>(&self, solver: &mut S) -> Colorings {
        let mut store = ConstraintStore::new();
        let vars = self.encode(&mut store);
        let mut encoded = store.encode();
        let mut colorings = Colorings::default();

        loop {
            match store.check_encoded(&encoded, solver) {
                SolveResult::Sat(model) => {
                    let colors = self.decode(&vars, &model);
                    debug!("colouring {}: {colors:?}", colorings.found.len() + 1);
                    encoded.assert(&blocking_constraint(&vars, &colors));
                    colorings.found.push(colors);
                }
                SolveResult::Unsat => return colorings,
                SolveResult::Unknown(reason) => {
                    colorings.interrupted = Some(reason);
                    return colorings;
                }
            }
        }
    }
}

impl Problem for Coloring {
    type Vars = Vec<IntVar>;
    /// The colour (1-based) of every node.
    type Solution = Vec<usize>;

    fn name(&self) -> String {
        format!(
            "{}-colouring of a graph with {} nodes and {} edges",
            self.colors,
            self.graph.num_nodes(),
            self.graph.num_edges()
        )
    }

    fn encode(&self, store: &mut ConstraintStore) -> Vec<IntVar> {
        let vars = node_vars(store, &self.graph);
        store.extend(color_constraints(&vars, self.colors));
        store.extend(edge_constraints(&self.graph, &vars, self.colors));
        vars
    }

    fn decode(&self, vars: &Vec<IntVar>, model: &Model) -> Vec<usize> {
        vars.iter()
            .map(|&v| usize::try_from(model.int(v)).unwrap_or(0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Outcome, SolveOptions, solve};
    use crate::sat::cnf::Cnf;
    use crate::sat::solver::SatAnswer;

    fn is_proper(graph: &Graph, colors: &[usize]) -> bool {
        graph.edges().all(|(a, b)| colors[a] != colors[b])
    }

    #[test]
    fn test_triangle_needs_three_colors() {
        let two = Coloring::new(Graph::triangle(), 2);
        assert_eq!(
            solve(&two, &SolveOptions::default()).unwrap().outcome,
            Outcome::Unsatisfiable
        );

        let three = Coloring::new(Graph::triangle(), 3);
        let Outcome::Solved(colors) = solve(&three, &SolveOptions::default()).unwrap().outcome
        else {
            panic!("a triangle is 3-colourable");
        };
        assert!(is_proper(&three.graph, &colors));
        assert!(colors.iter().all(|c| (1..=3).contains(c)));
    }

    #[test]
    fn test_triangle_has_six_colorings() {
        let colorings = Coloring::new(Graph::triangle(), 3).all_colorings();
        assert_eq!(colorings.interrupted, None);
        assert_eq!(colorings.found.len(), 6);

        let mut distinct = colorings.found.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), 6);
        assert!(distinct.iter().all(|c| is_proper(&Graph::triangle(), c)));
    }

    /// Splr, recording the size of every clause set it is given.
    #[derive(Default)]
    struct Recording {
        sizes: Vec<(u32, usize)>,
    }

    impl Solver for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn solve(&mut self, cnf: &Cnf) -> SatAnswer {
            self.sizes.push((cnf.num_vars, cnf.clauses.len()));
            Splr.solve(cnf)
        }
    }

    #[test]
    fn test_enumeration_adds_one_blocking_clause_per_coloring() {
        let mut solver = Recording::default();
        let colorings = Coloring::new(Graph::triangle(), 3).all_colorings_with(&mut solver);
        assert_eq!(colorings.found.len(), 6);
        assert_eq!(solver.sizes.len(), 7);

        let (vars, clauses) = solver.sizes[0];
        for (step, &(num_vars, num_clauses)) in solver.sizes.iter().enumerate() {
            assert_eq!(num_vars, vars);
            assert_eq!(num_clauses, clauses + step);
        }
    }

    #[test]
    fn test_no_two_coloring_to_enumerate() {
        let colorings = Coloring::new(Graph::triangle(), 2).all_colorings();
        assert!(colorings.found.is_empty());
    }

    #[test]
    fn test_edges_are_stored_under_smaller_node() {
        let mut graph = Graph::new(4);
        graph.add_edge(3, 1);
        graph.add_edge(0, 2);
        assert_eq!(graph.edges_of(1), &[3]);
        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn test_parse_graph() {
        let text = "c triangle\np edge 3 3\ne 1 2\ne 1 3\ne 2 3\n";
        assert_eq!(parse_graph(text.as_bytes()).unwrap(), Graph::triangle());
    }

    #[test]
    fn test_parse_graph_errors() {
        let err = parse_graph("e 1 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::GraphParse { line: 1, .. }));

        let err = parse_graph("p edge 2 1\ne 1 3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::GraphParse { line: 2, .. }));

        let err = parse_graph("c nothing\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::GraphParse { line: 0, .. }));
    }
}
