//! Traffic Graph CLI
//!
//! Command-line tools for the traffic graph anomaly finder.
//!
//! # Commands
//!
//! - `finder`: run the anomaly-detection pipeline over the stored
//!   endpoint batch and write outlier flags back
//! - `import`: load endpoint records from a JSON file into the store

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

/// Traffic Graph CLI - anomaly detection over endpoint embeddings
#[derive(Parser)]
#[command(name = "traffic-graph-cli")]
#[command(author = "Traffic Graph Team")]
#[command(version = "0.1.0")]
#[command(about = "Anomaly detection tools for the traffic graph")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the anomaly finder over the stored endpoint batch
    ///
    /// Fetches every endpoint record, projects the embeddings to 2-D,
    /// selects a clustering epsilon from the k-distance knee, labels
    /// outliers with DBSCAN, persists the flags, and renders the plots.
    Finder(commands::finder::FinderArgs),
    /// Import endpoint records from a JSON file
    Import(commands::import::ImportArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Finder(args) => commands::finder::handle_finder(args).await,
        Commands::Import(args) => commands::import::handle_import(args).await,
    };

    std::process::exit(exit_code);
}
