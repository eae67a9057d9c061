// Execution Graph
// Directed graph of runs (vertices) and "triggered" relationships (edges)

pub mod builder;
pub mod description;
pub mod paths;

pub use builder::{compute_graph, GraphBuilder};
pub use description::GraphDescription;
pub use paths::all_paths;

use crate::run::Run;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use std::collections::HashMap;

/// A run placed in the graph, plus the ordering coordinate the layout
/// oracle assigned to it.
#[derive(Debug, Clone)]
pub struct Vertex<R> {
    run: R,
    x: f64,
}

impl<R: Run> Vertex<R> {
    pub fn new(run: R) -> Self {
        Self { run, x: 0.0 }
    }

    pub fn run(&self) -> &R {
        &self.run
    }

    /// Left-to-right ordering coordinate among siblings
    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    pub fn label(&self) -> String {
        self.run.to_string()
    }
}

// Identity is the wrapped run's identity; the coordinate does not take part.
impl<R: Run> PartialEq for Vertex<R> {
    fn eq(&self, other: &Self) -> bool {
        self.run.id() == other.run.id()
    }
}

impl<R: Run> Eq for Vertex<R> {}

/// Execution graph of one pipeline instance.
///
/// Vertices are deduplicated by run id. Edges are simple: no self-loops
/// and no parallel edges. Outgoing edges are reported in insertion order.
#[derive(Debug, Clone)]
pub struct ExecutionGraph<R: Run> {
    graph: StableDiGraph<Vertex<R>, u64>,
    indices: HashMap<R::Id, NodeIndex>,
    root: Option<NodeIndex>,
    next_edge: u64,
}

impl<R: Run> ExecutionGraph<R> {
    /// An empty graph with no root
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            indices: HashMap::new(),
            root: None,
            next_edge: 0,
        }
    }

    /// A graph holding only `root`
    pub fn with_root(root: R) -> Self {
        let mut graph = Self::new();
        graph.set_root(root);
        graph
    }

    /// Add `run` (if needed) and make it the root
    pub fn set_root(&mut self, run: R) -> NodeIndex {
        let (idx, _) = self.add_vertex(run);
        self.root = Some(idx);
        idx
    }

    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    /// Add a vertex for `run` unless one already exists.
    ///
    /// Returns the vertex index and whether it was newly created.
    pub fn add_vertex(&mut self, run: R) -> (NodeIndex, bool) {
        let id = run.id();
        if let Some(&idx) = self.indices.get(&id) {
            return (idx, false);
        }
        let idx = self.graph.add_node(Vertex::new(run));
        self.indices.insert(id, idx);
        (idx, true)
    }

    pub fn index_of(&self, run: &R) -> Option<NodeIndex> {
        self.indices.get(&run.id()).copied()
    }

    pub fn contains(&self, run: &R) -> bool {
        self.indices.contains_key(&run.id())
    }

    /// Panics if `idx` is not a vertex of this graph
    pub fn vertex(&self, idx: NodeIndex) -> &Vertex<R> {
        &self.graph[idx]
    }

    pub fn vertex_mut(&mut self, idx: NodeIndex) -> &mut Vertex<R> {
        &mut self.graph[idx]
    }

    /// All vertices in creation order
    pub fn vertices(&self) -> impl Iterator<Item = (NodeIndex, &Vertex<R>)> {
        self.graph.node_indices().map(move |idx| (idx, &self.graph[idx]))
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Add the edge `from -> to`. Self-loops and duplicates are rejected.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        if from == to || self.contains_edge(from, to) {
            return false;
        }
        self.graph.add_edge(from, to, self.next_edge);
        self.next_edge += 1;
        true
    }

    pub fn contains_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.graph.find_edge(from, to).is_some()
    }

    /// Remove every edge `from -> to`, returning how many were removed
    pub fn remove_edges(&mut self, from: NodeIndex, to: NodeIndex) -> usize {
        let mut removed = 0;
        while let Some(edge) = self.graph.find_edge(from, to) {
            self.graph.remove_edge(edge);
            removed += 1;
        }
        removed
    }

    /// Direct successors of `idx`, in edge insertion order
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.ordered_neighbors(idx, Direction::Outgoing)
    }

    /// Direct predecessors of `idx`, in edge insertion order
    pub fn predecessors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.ordered_neighbors(idx, Direction::Incoming)
    }

    fn ordered_neighbors(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<(u64, NodeIndex)> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|other| {
                let edge = match direction {
                    Direction::Outgoing => self.graph.find_edge(idx, other),
                    Direction::Incoming => self.graph.find_edge(other, idx),
                }?;
                Some((self.graph[edge], other))
            })
            .collect();
        neighbors.sort_by_key(|(seq, _)| *seq);
        neighbors.into_iter().map(|(_, other)| other).collect()
    }

    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.graph.neighbors_directed(idx, Direction::Outgoing).count()
    }

    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph.neighbors_directed(idx, Direction::Incoming).count()
    }

    /// Every edge as `(source, target)`, in insertion order
    pub fn edges(&self) -> Vec<(NodeIndex, NodeIndex)> {
        let mut edges: Vec<(u64, NodeIndex, NodeIndex)> = self
            .graph
            .edge_indices()
            .filter_map(|edge| {
                let (from, to) = self.graph.edge_endpoints(edge)?;
                Some((self.graph[edge], from, to))
            })
            .collect();
        edges.sort_by_key(|(seq, _, _)| *seq);
        edges.into_iter().map(|(_, from, to)| (from, to)).collect()
    }

    /// Whether `to` is reachable from `from` (every vertex reaches itself)
    pub fn has_path(&self, from: NodeIndex, to: NodeIndex) -> bool {
        petgraph::algo::has_path_connecting(&self.graph, from, to, None)
    }

    /// Whether adding `from -> to` would close a cycle
    pub fn would_close_cycle(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.has_path(to, from)
    }

    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Labels and index edges, as handed to an ordering oracle
    pub fn describe(&self) -> GraphDescription {
        let mut positions = HashMap::with_capacity(self.graph.node_count());
        let mut labels = Vec::with_capacity(self.graph.node_count());
        for (pos, (idx, vertex)) in self.vertices().enumerate() {
            positions.insert(idx, pos);
            labels.push(vertex.label());
        }

        let edges = self
            .edges()
            .into_iter()
            .map(|(from, to)| (positions[&from], positions[&to]))
            .collect();

        GraphDescription { labels, edges }
    }

    /// Copy oracle coordinates onto vertices by label, returning how many matched
    pub fn apply_coordinates(&mut self, coordinates: &HashMap<String, f64>) -> usize {
        let mut matched = 0;
        let indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        for idx in indices {
            let vertex = &mut self.graph[idx];
            if let Some(&x) = coordinates.get(&vertex.label()) {
                vertex.set_x(x);
                matched += 1;
            }
        }
        matched
    }
}

impl<R: Run> Default for ExecutionGraph<R> {
    fn default() -> Self {
        Self::new()
    }
}
