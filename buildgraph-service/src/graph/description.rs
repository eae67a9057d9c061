// Graph Description
// Label-only view of an execution graph handed to ordering oracles

/// Vertices as labels, edges as `(source, target)` positions into `labels`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphDescription {
    pub labels: Vec<String>,
    pub edges: Vec<(usize, usize)>,
}

impl GraphDescription {
    /// Render as a DOT digraph, one quoted node statement per vertex
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph G {\n");

        for label in &self.labels {
            out.push_str(&format!("  \"{}\";\n", escape_dot(label)));
        }
        for &(from, to) in &self.edges {
            out.push_str(&format!(
                "  \"{}\" -> \"{}\";\n",
                escape_dot(&self.labels[from]),
                escape_dot(&self.labels[to])
            ));
        }

        out.push_str("}\n");
        out
    }
}

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
