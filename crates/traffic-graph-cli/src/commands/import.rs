//! Import command: load endpoint records from a JSON file.
//!
//! The file holds a JSON array of endpoint records:
//!
//! ```json
//! [
//!   {
//!     "id": { "address": "10.0.0.1", "port": 443 },
//!     "embedding": [0.12, -0.5, 1.3],
//!     "attributes": { "organization": "Example Corp", "total_size": 4096 }
//!   }
//! ]
//! ```
//!
//! Records are validated individually; one bad record aborts the import
//! before anything else is written.

use std::path::PathBuf;

use clap::Args;
use tracing::{error, info};

use traffic_graph_core::traits::EndpointStore;
use traffic_graph_core::types::EndpointRecord;
use traffic_graph_core::Config;
use traffic_graph_storage::RocksEndpointStore;

/// Arguments for the import command.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Database directory (default from configuration)
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// JSON file holding an array of endpoint records
    #[arg(long)]
    pub file: PathBuf,
}

/// Execute the import command.
///
/// # Returns
///
/// Exit code: 0 on success, 1 on any failure (unreadable file, invalid
/// records, storage errors).
pub async fn handle_import(args: ImportArgs) -> i32 {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return 1;
        }
    };
    let db_path = args.db_path.unwrap_or(config.storage.db_path);

    let contents = match std::fs::read_to_string(&args.file) {
        Ok(contents) => contents,
        Err(e) => {
            error!("Failed to read {}: {e}", args.file.display());
            return 1;
        }
    };
    let records: Vec<EndpointRecord> = match serde_json::from_str(&contents) {
        Ok(records) => records,
        Err(e) => {
            error!("Failed to parse {}: {e}", args.file.display());
            return 1;
        }
    };

    // Fail fast: reject the whole file before writing anything.
    for record in &records {
        if let Err(e) = record.validate() {
            error!("Invalid record in {}: {e}", args.file.display());
            return 1;
        }
    }

    let store = match RocksEndpointStore::open(&db_path) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open store at {}: {e}", db_path.display());
            return 1;
        }
    };

    let total = records.len();
    for record in &records {
        if let Err(e) = store.put_endpoint(record).await {
            error!("Failed to store {}: {e}", record.id);
            return 1;
        }
    }

    info!(imported = total, "import complete");
    println!("Imported {total} endpoint records into {}", db_path.display());
    0
}
