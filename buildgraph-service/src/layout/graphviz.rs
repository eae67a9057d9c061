// Graphviz Ordering
// Shells out to `dot -Tplain` and reads node x coordinates from the plain output

use super::ordering::{OrderingError, OrderingService};
use crate::graph::GraphDescription;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;

fn default_command() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from("dot.exe")
    } else {
        PathBuf::from("dot")
    }
}

fn default_args() -> Vec<String> {
    ["-Tplain", "-Gcharset=UTF-8", "-q1"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// How to invoke Graphviz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphvizConfig {
    /// Executable to run (default: `dot`)
    pub command: PathBuf,
    /// Arguments; the DOT source is fed on stdin, plain output read from stdout
    pub args: Vec<String>,
    /// Directory for scratch files (default: the OS temp dir)
    pub scratch_dir: Option<PathBuf>,
}

impl Default for GraphvizConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            scratch_dir: None,
        }
    }
}

/// Ordering oracle backed by the Graphviz `dot` layout.
///
/// Each call writes the DOT source and captures the plain output in scratch
/// files of its own. Both files are removed when the call returns, whether
/// it succeeded or not. No timeout is applied; dropping the future kills the
/// child process.
#[derive(Debug, Clone, Default)]
pub struct GraphvizOrdering {
    config: GraphvizConfig,
}

impl GraphvizOrdering {
    pub fn new(config: GraphvizConfig) -> Self {
        Self { config }
    }

    /// `config` with its command resolved on `PATH`, if it can be found
    pub fn detect(config: &GraphvizConfig) -> Option<Self> {
        let command = which::which(&config.command).ok()?;
        Some(Self::new(GraphvizConfig {
            command,
            ..config.clone()
        }))
    }

    fn scratch_dir(&self) -> PathBuf {
        self.config
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    async fn run_layout(
        &self,
        dot_file: &NamedTempFile,
        plain_file: &NamedTempFile,
    ) -> Result<String, OrderingError> {
        let command_name = self.config.command.display().to_string();

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args);
        cmd.stdin(Stdio::from(dot_file.reopen()?));
        cmd.stdout(Stdio::from(plain_file.reopen()?));
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OrderingError::ToolNotFound(command_name.clone())
            } else {
                OrderingError::Io(e)
            }
        })?;

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(OrderingError::ToolFailed {
                command: command_name,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(tokio::fs::read_to_string(plain_file.path()).await?)
    }
}

#[async_trait::async_trait]
impl OrderingService for GraphvizOrdering {
    async fn order(&self, graph: &GraphDescription) -> Result<HashMap<String, f64>, OrderingError> {
        let scratch = self.scratch_dir();

        let mut dot_file = scratch_file(&scratch, "buildgraph", ".dot")?;
        dot_file.write_all(graph.to_dot().as_bytes())?;
        dot_file.flush()?;

        let plain_file = scratch_file(&scratch, "buildgraph_plain", ".txt")?;

        let result = self.run_layout(&dot_file, &plain_file).await;

        for file in [dot_file, plain_file] {
            let path = file.path().to_path_buf();
            if let Err(err) = file.close() {
                tracing::warn!(path = %path.display(), error = %err, "failed to remove scratch file");
            }
        }

        parse_plain(&result?)
    }
}

fn scratch_file(dir: &Path, prefix: &str, suffix: &str) -> Result<NamedTempFile, OrderingError> {
    Ok(tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(dir)?)
}

/// Read `node <name> <x> <y> ...` lines from Graphviz plain output.
///
/// Names may be bare or double-quoted with backslash escapes. Other
/// statements (`graph`, `edge`, `stop`) are ignored.
pub fn parse_plain(plain: &str) -> Result<HashMap<String, f64>, OrderingError> {
    let mut coordinates = HashMap::new();

    for line in plain.lines() {
        let Some(rest) = line.trim_start().strip_prefix("node ") else {
            continue;
        };

        let (name, rest) = split_name(rest.trim_start())
            .ok_or_else(|| OrderingError::Malformed(line.to_string()))?;
        let x = rest
            .split_whitespace()
            .next()
            .and_then(|token| token.parse::<f64>().ok())
            .ok_or_else(|| OrderingError::Malformed(line.to_string()))?;

        coordinates.insert(name, x);
    }

    Ok(coordinates)
}

fn split_name(s: &str) -> Option<(String, &str)> {
    let Some(quoted) = s.strip_prefix('"') else {
        let end = s.find(char::is_whitespace).unwrap_or(s.len());
        return (end > 0).then(|| (s[..end].to_string(), &s[end..]));
    };

    let mut name = String::new();
    let mut chars = quoted.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let (_, escaped) = chars.next()?;
                if escaped != '"' && escaped != '\\' {
                    name.push('\\');
                }
                name.push(escaped);
            }
            '"' => return Some((name, &quoted[i + 1..])),
            _ => name.push(c),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = "graph 1 2.75 2.5
node \"build #12\" 1.375 2.25 1.0694 0.5 \"build #12\" solid ellipse black lightgrey
node \"test #7\" 0.5 1.25 0.93 0.5 \"test #7\" solid ellipse black lightgrey
node deploy 2.25 1.25 0.75 0.5 deploy solid ellipse black lightgrey
edge \"build #12\" \"test #7\" 4 1.2 2.0 1.0 1.8 0.8 1.6 0.6 1.5 solid black
stop
";

    fn description() -> GraphDescription {
        GraphDescription {
            labels: vec!["build #12".to_string(), "test #7".to_string()],
            edges: vec![(0, 1)],
        }
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_parse_plain_output() {
        let coords = parse_plain(PLAIN).unwrap();
        assert_eq!(coords.len(), 3);
        assert_eq!(coords["build #12"], 1.375);
        assert_eq!(coords["test #7"], 0.5);
        assert_eq!(coords["deploy"], 2.25);
    }

    #[test]
    fn test_parse_escaped_names() {
        let coords = parse_plain("node \"say \\\"hi\\\" #1\" 3.5 1 1 1\n").unwrap();
        assert_eq!(coords["say \"hi\" #1"], 3.5);
    }

    #[test]
    fn test_parse_malformed_node() {
        assert!(parse_plain("node \"unterminated 1.0 2.0\n").is_err());
        assert!(parse_plain("node a nope 2.0\n").is_err());
        assert!(parse_plain("graph 1 1 1\nstop\n").unwrap().is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = GraphvizConfig::default();
        assert_eq!(config.args, vec!["-Tplain", "-Gcharset=UTF-8", "-q1"]);
        assert!(config.scratch_dir.is_none());
    }

    #[test]
    fn test_detect_resolves_command() {
        let missing = GraphvizConfig {
            command: PathBuf::from("/nonexistent/bin/dot-layout-tool"),
            ..Default::default()
        };
        assert!(GraphvizOrdering::detect(&missing).is_none());

        #[cfg(unix)]
        {
            let scratch = PathBuf::from("/tmp/layout");
            let shell = GraphvizConfig {
                command: PathBuf::from("sh"),
                scratch_dir: Some(scratch.clone()),
                ..Default::default()
            };
            let detected = GraphvizOrdering::detect(&shell).unwrap();
            assert!(detected.config.command.is_absolute());
            assert_eq!(detected.config.args, shell.args);
            assert_eq!(detected.config.scratch_dir, Some(scratch));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_order_with_scripted_tool_cleans_up() {
        let tools = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();

        // Stands in for dot: consume the DOT source, emit fixed plain output
        let script = tools.path().join("fake-dot.sh");
        std::fs::write(
            &script,
            format!("cat > /dev/null\ncat <<'PLAIN'\n{}PLAIN\n", PLAIN),
        )
        .unwrap();

        let ordering = GraphvizOrdering::new(GraphvizConfig {
            command: PathBuf::from("sh"),
            args: vec![script.display().to_string()],
            scratch_dir: Some(scratch.path().to_path_buf()),
        });

        let coords = ordering.order(&description()).await.unwrap();
        assert_eq!(coords["build #12"], 1.375);
        assert_eq!(coords["test #7"], 0.5);
        assert_eq!(entries(scratch.path()), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tool_sees_dot_source() {
        let tools = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();

        // Report how many edge statements arrived on stdin
        let script = tools.path().join("echo-nodes.sh");
        std::fs::write(
            &script,
            "grep -c -- '->' | while read n; do echo \"node edges $n 0 1 1\"; done\n",
        )
        .unwrap();

        let ordering = GraphvizOrdering::new(GraphvizConfig {
            command: PathBuf::from("sh"),
            args: vec![script.display().to_string()],
            scratch_dir: Some(scratch.path().to_path_buf()),
        });

        let coords = ordering.order(&description()).await.unwrap();
        assert_eq!(coords["edges"], 1.0);
        assert_eq!(entries(scratch.path()), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_tool_cleans_up() {
        let scratch = tempfile::tempdir().unwrap();

        let ordering = GraphvizOrdering::new(GraphvizConfig {
            command: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "echo 'syntax error' >&2; exit 3".to_string()],
            scratch_dir: Some(scratch.path().to_path_buf()),
        });

        let err = ordering.order(&description()).await.unwrap_err();
        match err {
            OrderingError::ToolFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("syntax error"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_tool_cleans_up() {
        let scratch = tempfile::tempdir().unwrap();

        let ordering = GraphvizOrdering::new(GraphvizConfig {
            command: PathBuf::from("/nonexistent/bin/dot-layout-tool"),
            scratch_dir: Some(scratch.path().to_path_buf()),
            ..Default::default()
        });

        let err = ordering.order(&description()).await.unwrap_err();
        assert!(matches!(err, OrderingError::ToolNotFound(_)));
        assert_eq!(entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_scratch_dir_is_an_error() {
        let ordering = GraphvizOrdering::new(GraphvizConfig {
            scratch_dir: Some(PathBuf::from("/nonexistent/scratch/dir")),
            ..Default::default()
        });

        let err = ordering.order(&description()).await.unwrap_err();
        assert!(matches!(err, OrderingError::Io(_)));
    }
}
