use crate::output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgGroup, Args};
use color_eyre::Result;
use serde_json::json;

use buildgraph_service::{
    max_columns, BuildGrid, BuildRun, GraphConfig, GridBuilder, LayoutEngine, OrderingBackend,
};

/// Show the build grid of one or more pipelines
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("root").required(true).args(["run", "job"])))]
pub struct ShowArgs {
    /// Path to the run history YAML file
    pub history: PathBuf,

    /// Root run of the pipeline (format: job#number)
    #[arg(long, value_name = "ID")]
    pub run: Option<String>,

    /// Show the pipelines rooted at recent runs of a job
    #[arg(long, value_name = "JOB")]
    pub job: Option<String>,

    /// Number of runs to show with --job
    #[arg(long, value_name = "N", default_value_t = 5)]
    pub limit: usize,

    /// Ordering backend: auto, graphviz or levels (overrides config)
    #[arg(long, value_name = "BACKEND")]
    pub ordering: Option<OrderingBackend>,

    /// Config file (default: ~/.buildgraph/config.yaml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print grids as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ShowArgs) -> Result<()> {
    let history = super::load_history(&args.history)?;
    tracing::info!(path = %args.history.display(), runs = history.len(), "loaded run history");

    let config_path = args.config.clone().unwrap_or_else(GraphConfig::default_path);
    let mut config = GraphConfig::load_or_default(&config_path)?;
    if let Some(ordering) = args.ordering {
        config.ordering = ordering;
    }

    let roots: Vec<BuildRun> = match (&args.run, &args.job) {
        (Some(id), _) => vec![super::resolve_run(&history, id)?],
        (None, Some(job)) => history.runs_of(job).into_iter().take(args.limit).collect(),
        (None, None) => Vec::new(),
    };

    if roots.is_empty() {
        output::warning("No runs to show");
        return Ok(());
    }

    if !args.json {
        output::status("Laying out", &format!("{} pipeline(s)", roots.len()));
    }

    let builder = GridBuilder::new(
        Arc::new(Arc::clone(&history).registry()),
        LayoutEngine::with_shared(config.ordering_service()),
    );
    let grids = builder.grids_for(roots.clone()).await;
    tracing::debug!(pipelines = grids.len(), "laid out grids");

    if args.json {
        let pipelines: Vec<_> = roots
            .iter()
            .zip(&grids)
            .map(|(root, grid)| json!({ "root": root.to_string(), "grid": grid.to_json() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&pipelines)?);
        return Ok(());
    }

    let width = max_columns(&grids);
    for (root, grid) in roots.iter().zip(&grids) {
        output::pipeline_header(&root.to_string(), grid.rows(), grid.columns());
        for line in render(grid, width) {
            println!("{}", line);
        }
        println!();
    }
    output::dim("  > has downstream runs");

    Ok(())
}

/// Render a grid as aligned text, one line per row, padded to `width` columns
fn render(grid: &BuildGrid<BuildRun>, width: usize) -> Vec<String> {
    let cell_text = |row: usize, column: usize| match grid.get(row, column) {
        Some(cell) if cell.has_downstream => format!("{} >", cell.run),
        Some(cell) => cell.run.to_string(),
        None => String::new(),
    };

    let widths: Vec<usize> = (0..width)
        .map(|column| {
            (0..grid.rows())
                .map(|row| cell_text(row, column).chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    (0..grid.rows())
        .map(|row| {
            let mut cells: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(column, &w)| format!("{:<w$}", cell_text(row, column), w = w))
                .collect();
            while cells.last().is_some_and(|cell| cell.trim().is_empty()) {
                cells.pop();
            }
            format!("  {}", cells.join(" | "))
        })
        .collect()
}
