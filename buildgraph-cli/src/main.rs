mod commands;
mod output;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use commands::dot::DotArgs;
use commands::show::ShowArgs;

/// Lay out build pipelines recorded in a run history
#[derive(Parser, Debug)]
#[command(name = "buildgraph", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Show(ShowArgs),
    Dot(DotArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Show(args) => commands::show::execute(args).await,
        Command::Dot(args) => commands::dot::execute(args),
    }
}
