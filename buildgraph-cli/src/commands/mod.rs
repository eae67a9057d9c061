pub mod dot;
pub mod show;

use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;

use buildgraph_service::{BuildRun, RunHistory};

/// Load a run history file
pub fn load_history(path: &Path) -> Result<Arc<RunHistory>> {
    if !path.exists() {
        color_eyre::eyre::bail!("History file not found: {}", path.display());
    }
    let history = RunHistory::from_file(path)
        .wrap_err_with(|| format!("Failed to load history from {}", path.display()))?;
    Ok(Arc::new(history))
}

/// Resolve a `job#number` id against the history
pub fn resolve_run(history: &RunHistory, id: &str) -> Result<BuildRun> {
    history
        .run(id)?
        .ok_or_else(|| eyre!("Run '{}' is not recorded in the history", id))
}
