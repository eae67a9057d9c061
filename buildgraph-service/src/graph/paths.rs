// Path Enumeration
// All simple paths from a vertex to the graph's sinks, repairing cycles on the way

use super::ExecutionGraph;
use crate::run::Run;

use petgraph::stable_graph::NodeIndex;

/// Enumerate every path from `from` to a sink (a vertex with no outgoing edges).
///
/// This mutates `graph`. Before descending out of a vertex, any of its edges
/// pointing back to `origin`, or to a vertex already on the current path, is
/// deleted. A vertex left without outgoing edges by that repair counts as a
/// sink. Every returned path starts at `from` and ends at a sink.
pub fn all_paths<R: Run>(
    graph: &mut ExecutionGraph<R>,
    origin: NodeIndex,
    from: NodeIndex,
) -> Vec<Vec<NodeIndex>> {
    let mut on_path = Vec::new();
    walk(graph, origin, from, &mut on_path)
}

fn walk<R: Run>(
    graph: &mut ExecutionGraph<R>,
    origin: NodeIndex,
    current: NodeIndex,
    on_path: &mut Vec<NodeIndex>,
) -> Vec<Vec<NodeIndex>> {
    on_path.push(current);

    for target in graph.successors(current) {
        if target == origin || on_path.contains(&target) {
            let removed = graph.remove_edges(current, target);
            tracing::debug!(
                from = %graph.vertex(current).label(),
                to = %graph.vertex(target).label(),
                removed,
                "removed cycle-closing edge"
            );
        }
    }

    let targets = graph.successors(current);
    let paths = if targets.is_empty() {
        vec![vec![current]]
    } else {
        let mut paths = Vec::new();
        for target in targets {
            for mut path in walk(graph, origin, target, on_path) {
                path.insert(0, current);
                paths.push(path);
            }
        }
        paths
    };

    on_path.pop();
    paths
}

/// Distinct final vertices of `paths`, in first-seen order
pub fn path_ends(paths: &[Vec<NodeIndex>]) -> Vec<NodeIndex> {
    let mut ends = Vec::new();
    for end in paths.iter().filter_map(|path| path.last()) {
        if !ends.contains(end) {
            ends.push(*end);
        }
    }
    ends
}
