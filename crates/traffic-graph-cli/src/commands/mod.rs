//! CLI command handlers.
//!
//! # Modules
//!
//! - `finder`: run the anomaly-detection pipeline
//! - `import`: load endpoint records into the store

pub mod finder;
pub mod import;
