use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

use buildgraph_service::compute_graph;

/// Print the execution graph of a pipeline as Graphviz DOT
#[derive(Args, Debug)]
pub struct DotArgs {
    /// Path to the run history YAML file
    pub history: PathBuf,

    /// Root run of the pipeline (format: job#number)
    #[arg(long, value_name = "ID")]
    pub run: String,
}

pub fn execute(args: DotArgs) -> Result<()> {
    let history = super::load_history(&args.history)?;
    let root = super::resolve_run(&history, &args.run)?;

    let registry = history.registry();
    let graph = compute_graph(&registry, Some(root));
    tracing::info!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "discovered execution graph"
    );
    print!("{}", graph.describe().to_dot());

    Ok(())
}
