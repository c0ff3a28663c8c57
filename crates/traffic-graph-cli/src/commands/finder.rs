//! Finder command: the end-to-end anomaly-detection run.
//!
//! # Usage
//!
//! ```bash
//! # Interactive: pauses once to confirm the recommended epsilon
//! traffic-graph-cli finder --db-path ./data/traffic-graph
//!
//! # Headless: accept the recommendation without prompting
//! traffic-graph-cli finder --agent
//!
//! # Pin epsilon explicitly, skipping selection entirely
//! traffic-graph-cli finder --eps 0.42
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::{error, info};

use traffic_graph_core::detection::{
    AcceptRecommended, DetectionParams, EpsilonConfirmer, FinderPipeline, InteractiveConfirmer,
};
use traffic_graph_core::traits::BatchSelector;
use traffic_graph_core::viz::{FinderRenderer, RasterRenderer, TerminalRenderer};
use traffic_graph_core::Config;
use traffic_graph_storage::RocksEndpointStore;

/// Arguments for the finder command.
#[derive(Args, Debug)]
pub struct FinderArgs {
    /// Database directory (default from configuration)
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Run non-interactively: accept the recommended epsilon without prompting
    #[arg(long)]
    pub agent: bool,

    /// Explicit epsilon, skipping selection and confirmation
    #[arg(long)]
    pub eps: Option<f64>,

    /// Directory for the PNG artifacts (default from configuration)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Neighborhood size for the k-distance profile and DBSCAN
    #[arg(long)]
    pub min_samples: Option<usize>,

    /// Restrict the batch to one resolved organization
    #[arg(long)]
    pub org: Option<String>,

    /// Print the run summary as JSON on stdout (suppresses terminal plots)
    #[arg(long)]
    pub json: bool,
}

/// Execute the finder command.
///
/// # Returns
///
/// Exit code: 0 on success, 1 on any failure (no data, bad parameters,
/// storage errors).
pub async fn handle_finder(args: FinderArgs) -> i32 {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return 1;
        }
    };

    let db_path = args.db_path.unwrap_or(config.storage.db_path);
    let output_dir = args.output_dir.unwrap_or(config.finder.output_dir);
    let min_samples = args.min_samples.unwrap_or(config.finder.min_samples);
    let interactive = config.finder.interactive && !args.agent && args.eps.is_none();

    let store = match RocksEndpointStore::open(&db_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to open store at {}: {e}", db_path.display());
            return 1;
        }
    };

    let mut params = DetectionParams::default().with_min_samples(min_samples);
    if let Some(eps) = args.eps {
        params = params.with_epsilon_override(eps);
    }

    let confirmer: Box<dyn EpsilonConfirmer> = if interactive {
        Box::new(InteractiveConfirmer)
    } else {
        Box::new(AcceptRecommended)
    };

    let mut pipeline = FinderPipeline::new(store)
        .with_params(params)
        .with_confirmer(confirmer);
    // Agent mode is headless: terminal views only, no raster artifacts.
    if !args.agent {
        let raster: Box<dyn FinderRenderer> = Box::new(RasterRenderer::new(&output_dir));
        pipeline = pipeline.with_renderer(raster);
    }
    if !args.json {
        pipeline = pipeline.with_renderer(Box::new(TerminalRenderer::default()));
    }

    let selector = match args.org {
        Some(org) => BatchSelector::Organization(org),
        None => BatchSelector::All,
    };

    match pipeline.run(&selector).await {
        Ok(summary) => {
            info!(
                outliers = summary.outliers.len(),
                clusters = summary.cluster_count,
                epsilon = summary.epsilon,
                "finder run complete"
            );
            if args.json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        error!("Failed to serialize summary: {e}");
                        return 1;
                    }
                }
            } else {
                println!(
                    "{} endpoints, {} clusters, {} outliers (eps {:.4}, {})",
                    summary.batch_size,
                    summary.cluster_count,
                    summary.outliers.len(),
                    summary.epsilon,
                    summary.epsilon_source,
                );
                if !args.agent {
                    println!("artifacts written to {}", output_dir.display());
                }
            }
            0
        }
        Err(e) => {
            error!("Finder run failed: {e}");
            1
        }
    }
}
