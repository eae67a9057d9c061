// Configuration
// Which ordering oracle to use and how to invoke Graphviz

use crate::error::{ServiceError, ServiceResult};
use crate::layout::{GraphvizConfig, GraphvizOrdering, LevelOrdering, OrderingService};

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Ordering oracle selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingBackend {
    /// Graphviz when its command resolves, otherwise levels
    #[default]
    Auto,
    Graphviz,
    Levels,
}

impl FromStr for OrderingBackend {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "graphviz" | "dot" => Ok(Self::Graphviz),
            "levels" => Ok(Self::Levels),
            other => Err(ServiceError::Config(format!(
                "unknown ordering backend '{}' (expected auto, graphviz or levels)",
                other
            ))),
        }
    }
}

/// Graph layout configuration (default: ~/.buildgraph/config.yaml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub ordering: OrderingBackend,
    pub graphviz: GraphvizConfig,
}

impl GraphConfig {
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".buildgraph")
            .join("config.yaml")
    }

    /// Load from `path`; a malformed file is an error
    pub fn load<P: AsRef<Path>>(path: P) -> ServiceResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> ServiceResult<Self> {
        match Self::load(path.as_ref()) {
            Err(ServiceError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.as_ref().display(), "no config file, using defaults");
                Ok(Self::default())
            }
            result => result,
        }
    }

    /// The configured ordering oracle
    pub fn ordering_service(&self) -> Arc<dyn OrderingService> {
        match self.ordering {
            OrderingBackend::Graphviz => Arc::new(GraphvizOrdering::new(self.graphviz.clone())),
            OrderingBackend::Levels => Arc::new(LevelOrdering::new()),
            OrderingBackend::Auto => match GraphvizOrdering::detect(&self.graphviz) {
                Some(graphviz) => {
                    tracing::debug!("using graphviz ordering");
                    Arc::new(graphviz)
                }
                None => {
                    tracing::debug!("graphviz not found, using level ordering");
                    Arc::new(LevelOrdering::new())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphDescription;

    #[test]
    fn test_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.ordering, OrderingBackend::Auto);
        assert_eq!(config.graphviz, GraphvizConfig::default());
        assert!(GraphConfig::default_path().ends_with(".buildgraph/config.yaml"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "ordering: graphviz\ngraphviz:\n  command: /opt/graphviz/bin/dot\n",
        )
        .unwrap();

        let config = GraphConfig::load(&path).unwrap();
        assert_eq!(config.ordering, OrderingBackend::Graphviz);
        assert_eq!(config.graphviz.command, PathBuf::from("/opt/graphviz/bin/dot"));
        assert_eq!(config.graphviz.args, GraphvizConfig::default().args);
        assert!(config.graphviz.scratch_dir.is_none());
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GraphConfig::load_or_default(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, GraphConfig::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "ordering: sideways\n").unwrap();

        assert!(matches!(
            GraphConfig::load_or_default(&path),
            Err(ServiceError::Yaml(_))
        ));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("levels".parse::<OrderingBackend>().unwrap(), OrderingBackend::Levels);
        assert_eq!("Graphviz".parse::<OrderingBackend>().unwrap(), OrderingBackend::Graphviz);
        assert!("random".parse::<OrderingBackend>().is_err());
    }

    #[tokio::test]
    async fn test_auto_falls_back_without_graphviz() {
        let config = GraphConfig {
            ordering: OrderingBackend::Auto,
            graphviz: GraphvizConfig {
                command: PathBuf::from("/nonexistent/bin/dot-layout-tool"),
                ..Default::default()
            },
        };

        let graph = GraphDescription {
            labels: vec!["a #1".to_string(), "b #1".to_string()],
            edges: vec![(0, 1)],
        };
        let coords = config.ordering_service().order(&graph).await.unwrap();
        assert_eq!(coords.len(), 2);
    }
}
