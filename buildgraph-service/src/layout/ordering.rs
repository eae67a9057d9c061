// Ordering Services
// One-axis ordering oracles: give each vertex a left-to-right coordinate

use crate::graph::GraphDescription;

use std::collections::{HashMap, VecDeque};
use std::io;
use thiserror::Error;

/// Errors from an ordering oracle
#[derive(Debug, Error)]
pub enum OrderingError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Layout tool not found: {0}")]
    ToolNotFound(String),

    #[error("Layout tool '{command}' failed (exit code {code:?}): {stderr}")]
    ToolFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Malformed layout output: {0}")]
    Malformed(String),
}

/// Produces a coordinate per vertex label ordering siblings left to right.
///
/// Implementations must be deterministic: the same description yields the
/// same coordinates. Labels missing from the result keep their previous
/// coordinate.
#[async_trait::async_trait]
pub trait OrderingService: Send + Sync {
    async fn order(&self, graph: &GraphDescription) -> Result<HashMap<String, f64>, OrderingError>;
}

/// In-process ordering: Kahn's algorithm over the description, placing each
/// vertex at its longest-path depth and numbering vertices left to right
/// within a depth in the order they become ready. Ties keep description order.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelOrdering;

impl LevelOrdering {
    pub fn new() -> Self {
        Self
    }

    /// Coordinates computed synchronously
    pub fn coordinates(&self, graph: &GraphDescription) -> HashMap<String, f64> {
        let count = graph.labels.len();
        let mut in_degree = vec![0usize; count];
        let mut adj_list: Vec<Vec<usize>> = vec![Vec::new(); count];

        for &(from, to) in &graph.edges {
            if from < count && to < count {
                adj_list[from].push(to);
                in_degree[to] += 1;
            }
        }

        // Find all nodes with in-degree 0
        let mut queue: VecDeque<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
        let mut depth = vec![0usize; count];
        let mut order = Vec::with_capacity(count);

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &next in &adj_list[node] {
                depth[next] = depth[next].max(depth[node] + 1);
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() < count {
            tracing::debug!(
                unordered = count - order.len(),
                "vertices on a cycle left without a coordinate"
            );
        }

        let mut next_slot: HashMap<usize, usize> = HashMap::new();
        let mut coordinates = HashMap::with_capacity(order.len());
        for node in order {
            let slot = next_slot.entry(depth[node]).or_insert(0);
            coordinates.insert(graph.labels[node].clone(), *slot as f64);
            *slot += 1;
        }
        coordinates
    }
}

#[async_trait::async_trait]
impl OrderingService for LevelOrdering {
    async fn order(&self, graph: &GraphDescription) -> Result<HashMap<String, f64>, OrderingError> {
        Ok(self.coordinates(graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description(labels: &[&str], edges: &[(usize, usize)]) -> GraphDescription {
        GraphDescription {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            edges: edges.to_vec(),
        }
    }

    #[test]
    fn test_siblings_numbered_left_to_right() {
        let graph = description(&["r", "a", "b", "c"], &[(0, 1), (0, 2), (0, 3)]);
        let coords = LevelOrdering::new().coordinates(&graph);

        assert_eq!(coords["r"], 0.0);
        assert_eq!(coords["a"], 0.0);
        assert_eq!(coords["b"], 1.0);
        assert_eq!(coords["c"], 2.0);
    }

    #[test]
    fn test_depth_uses_longest_path() {
        // r -> a -> b, r -> b, r -> c: b sits one level below a and c
        let graph = description(&["r", "a", "b", "c"], &[(0, 1), (1, 2), (0, 2), (0, 3)]);
        let coords = LevelOrdering::new().coordinates(&graph);

        assert_eq!(coords["a"], 0.0);
        assert_eq!(coords["c"], 1.0);
        assert_eq!(coords["b"], 0.0);
    }

    #[test]
    fn test_deterministic() {
        let graph = description(&["r", "x", "y", "z"], &[(0, 3), (0, 1), (0, 2)]);
        let first = LevelOrdering::new().coordinates(&graph);
        let second = LevelOrdering::new().coordinates(&graph);
        assert_eq!(first, second);
        assert_eq!(first["z"], 0.0);
        assert_eq!(first["x"], 1.0);
    }

    #[test]
    fn test_cycle_members_are_left_out() {
        let graph = description(&["r", "a", "b"], &[(0, 1), (1, 2), (2, 1)]);
        let coords = LevelOrdering::new().coordinates(&graph);
        assert_eq!(coords.len(), 1);
        assert!(coords.contains_key("r"));
    }

    #[tokio::test]
    async fn test_order_via_trait_object() {
        let service: Box<dyn OrderingService> = Box::new(LevelOrdering::new());
        let graph = description(&["r"], &[]);
        let coords = service.order(&graph).await.unwrap();
        assert_eq!(coords["r"], 0.0);
    }
}
