// Graph Builder
// Discovers the downstream execution graph of a root run by querying declarers

use super::paths::{all_paths, path_ends};
use super::ExecutionGraph;
use crate::declarer::{DeclarerError, DeclarerRegistry, RelationKind};
use crate::run::Run;

use petgraph::stable_graph::NodeIndex;
use std::collections::HashSet;

/// Depth-first discovery of every run downstream of a root run.
///
/// Each vertex is expanded once: for every relationship kind the registry
/// knows, in priority order, the first declarer of that kind is asked for
/// the vertex's downstream runs. Fan-in kinds link a discovered run from
/// every current sink reachable from the root; flow links it from the
/// declaring vertex only. Edges that would close a cycle are never added.
pub struct GraphBuilder<'a, R: Run> {
    registry: &'a DeclarerRegistry<R>,
    kinds: Vec<RelationKind>,
    graph: ExecutionGraph<R>,
    root: NodeIndex,
    expanded: HashSet<NodeIndex>,
}

impl<'a, R: Run> GraphBuilder<'a, R> {
    pub fn new(registry: &'a DeclarerRegistry<R>, root: R) -> Self {
        let mut graph = ExecutionGraph::new();
        let root = graph.set_root(root);
        Self {
            registry,
            kinds: registry.kinds(),
            graph,
            root,
            expanded: HashSet::new(),
        }
    }

    /// Run discovery from the root.
    ///
    /// A declarer failure stops discovery; the graph built so far is returned
    /// together with the error.
    pub fn build(mut self) -> (ExecutionGraph<R>, Option<DeclarerError>) {
        let error = self.expand(self.root).err();
        (self.graph, error)
    }

    fn expand(&mut self, current: NodeIndex) -> Result<(), DeclarerError> {
        if !self.expanded.insert(current) {
            return Ok(());
        }

        for kind in self.kinds.clone() {
            let run = self.graph.vertex(current).run().clone();
            let downstream = self.registry.downstream(&run, kind)?;

            for next in downstream {
                let (next, _) = self.graph.add_vertex(next);
                if kind.fans_in() {
                    self.link_from_sinks(next);
                } else {
                    self.link(current, next);
                }
                self.expand(next)?;
            }
        }

        Ok(())
    }

    /// Link `target` from every sink currently reachable from the root
    fn link_from_sinks(&mut self, target: NodeIndex) {
        let paths = all_paths(&mut self.graph, self.root, self.root);
        for sink in path_ends(&paths) {
            self.link(sink, target);
        }
    }

    fn link(&mut self, from: NodeIndex, to: NodeIndex) {
        if from == to {
            return;
        }
        // Cycles are refused here, so no edge into the root ever exists
        if self.graph.would_close_cycle(from, to) {
            tracing::debug!(
                from = %self.graph.vertex(from).label(),
                to = %self.graph.vertex(to).label(),
                "skipping edge that would close a cycle"
            );
            return;
        }
        self.graph.add_edge(from, to);
    }
}

/// Build the execution graph downstream of `root`.
///
/// A missing root gives an empty graph. Declarer failures are logged and the
/// partial graph is returned.
pub fn compute_graph<R: Run>(registry: &DeclarerRegistry<R>, root: Option<R>) -> ExecutionGraph<R> {
    let Some(root) = root else {
        tracing::debug!("no root run, pipeline is empty");
        return ExecutionGraph::new();
    };

    let label = root.to_string();
    let (graph, error) = GraphBuilder::new(registry, root).build();
    if let Some(err) = error {
        tracing::error!(
            root = %label,
            vertices = graph.vertex_count(),
            error = %err,
            "downstream discovery failed, keeping partial graph"
        );
    }
    graph
}
