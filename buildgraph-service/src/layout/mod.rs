// Layout
// Orders an execution graph with an oracle and assigns grid positions

pub mod graphviz;
pub mod grid;
pub mod ordering;

pub use graphviz::{GraphvizConfig, GraphvizOrdering};
pub use grid::transform;
pub use ordering::{LevelOrdering, OrderingError, OrderingService};

use crate::graph::ExecutionGraph;
use crate::run::Run;

use petgraph::stable_graph::NodeIndex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A vertex's place on the build grid: `column` is the stage, `row` the lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub column: usize,
    pub row: usize,
}

impl Position {
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }
}

pub type PositionMap = BTreeMap<NodeIndex, Position>;

/// Runs the ordering oracle, then the grid transform
#[derive(Clone)]
pub struct LayoutEngine {
    ordering: Arc<dyn OrderingService>,
}

impl LayoutEngine {
    pub fn new(ordering: impl OrderingService + 'static) -> Self {
        Self {
            ordering: Arc::new(ordering),
        }
    }

    pub fn with_shared(ordering: Arc<dyn OrderingService>) -> Self {
        Self { ordering }
    }

    /// Order the graph's vertices and place them on the grid.
    ///
    /// An oracle failure is logged; vertices keep their current coordinate
    /// and placement continues.
    pub async fn layout<R: Run>(&self, graph: &mut ExecutionGraph<R>) -> PositionMap {
        let Some(root) = graph.root() else {
            return PositionMap::new();
        };

        match self.ordering.order(&graph.describe()).await {
            Ok(coordinates) => {
                let matched = graph.apply_coordinates(&coordinates);
                if matched < graph.vertex_count() {
                    tracing::debug!(
                        matched,
                        vertices = graph.vertex_count(),
                        "ordering left some vertices without a coordinate"
                    );
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "ordering failed, laying out unordered");
            }
        }

        transform(graph, root)
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LevelOrdering::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphDescription;
    use crate::run::BuildRun;

    use std::collections::HashMap;

    /// Oracle returning fixed coordinates by label
    struct Fixed(HashMap<String, f64>);

    #[async_trait::async_trait]
    impl OrderingService for Fixed {
        async fn order(
            &self,
            _graph: &GraphDescription,
        ) -> Result<HashMap<String, f64>, OrderingError> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    #[async_trait::async_trait]
    impl OrderingService for Broken {
        async fn order(
            &self,
            _graph: &GraphDescription,
        ) -> Result<HashMap<String, f64>, OrderingError> {
            Err(OrderingError::ToolNotFound("dot".to_string()))
        }
    }

    fn fan_out() -> (ExecutionGraph<BuildRun>, NodeIndex, NodeIndex) {
        let mut graph = ExecutionGraph::with_root(BuildRun::new("build", 1));
        let root = graph.root().unwrap();
        let (a, _) = graph.add_vertex(BuildRun::new("lint", 1));
        let (b, _) = graph.add_vertex(BuildRun::new("test", 1));
        graph.add_edge(root, a);
        graph.add_edge(root, b);
        (graph, a, b)
    }

    #[tokio::test]
    async fn test_empty_graph_has_no_positions() {
        let mut graph: ExecutionGraph<BuildRun> = ExecutionGraph::new();
        let positions = LayoutEngine::default().layout(&mut graph).await;
        assert!(positions.is_empty());
    }

    #[tokio::test]
    async fn test_oracle_decides_row_order() {
        let (mut graph, lint, test) = fan_out();
        let coords = HashMap::from([
            ("build #1".to_string(), 0.0),
            ("lint #1".to_string(), 9.0),
            ("test #1".to_string(), 2.0),
        ]);

        let positions = LayoutEngine::new(Fixed(coords)).layout(&mut graph).await;
        assert_eq!(positions[&test], Position::new(1, 0));
        assert_eq!(positions[&lint], Position::new(1, 1));
        assert_eq!(graph.vertex(lint).x(), 9.0);
    }

    #[tokio::test]
    async fn test_oracle_failure_still_lays_out() {
        let (mut graph, lint, test) = fan_out();

        let positions = LayoutEngine::new(Broken).layout(&mut graph).await;
        assert_eq!(positions.len(), 3);
        assert_eq!(positions[&lint], Position::new(1, 0));
        assert_eq!(positions[&test], Position::new(1, 1));
        assert_eq!(graph.vertex(lint).x(), 0.0);
    }

    #[tokio::test]
    async fn test_layout_is_repeatable() {
        let (mut graph, _, _) = fan_out();
        let engine = LayoutEngine::default();

        let first = engine.layout(&mut graph).await;
        let second = engine.layout(&mut graph).await;
        assert_eq!(first, second);
    }
}
