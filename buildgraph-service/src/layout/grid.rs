// Grid Transform
// Turns an ordered execution graph into (column, row) build-grid positions

use super::{Position, PositionMap};
use crate::graph::ExecutionGraph;
use crate::run::Run;

use petgraph::stable_graph::NodeIndex;

/// Place every vertex reachable from `root` on the grid.
///
/// Columns follow depth from the root, rows are lanes. Children are visited
/// in ascending oracle coordinate; a sink consumes a lane. A vertex reached
/// again at a deeper column is pushed to that column and its subtree is
/// walked again; reached at the same or a shallower column it keeps its
/// position and the branch ends, consuming a lane. Rows of a moved vertex
/// are never revised.
pub fn transform<R: Run>(graph: &ExecutionGraph<R>, root: NodeIndex) -> PositionMap {
    let mut positions = PositionMap::new();
    place(graph, root, 0, 0, &mut positions);
    positions
}

/// Returns the next free row after `current`'s subtree
fn place<R: Run>(
    graph: &ExecutionGraph<R>,
    current: NodeIndex,
    row: usize,
    column: usize,
    positions: &mut PositionMap,
) -> usize {
    match positions.get_mut(&current) {
        None => {
            positions.insert(current, Position::new(column, row));
        }
        Some(seen) if seen.column < column => {
            seen.column = column;
        }
        Some(_) => return row + 1,
    }

    let mut targets = graph.successors(current);
    if targets.is_empty() {
        return row + 1;
    }

    targets.sort_by(|a, b| graph.vertex(*a).x().total_cmp(&graph.vertex(*b).x()));

    let mut row = row;
    for target in targets {
        row = place(graph, target, row, column + 1, positions);
    }
    row
}
