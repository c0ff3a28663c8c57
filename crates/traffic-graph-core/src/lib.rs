//! Core types, traits, and the anomaly-detection pipeline for the
//! traffic graph.
//!
//! The crate is storage-agnostic: the pipeline talks to any
//! [`traits::EndpointStore`] implementation. The persistent RocksDB
//! store lives in `traffic-graph-storage`; an in-memory stub for tests
//! and development lives in [`stubs`].
//!
//! # Pipeline
//!
//! [`detection::FinderPipeline`] runs one batch end to end: fetch the
//! embedding-enriched endpoint records, standardize, project to 2-D via
//! PCA, build the sorted k-distance profile, pick epsilon at the knee
//! (median fallback), cluster with DBSCAN, persist per-endpoint outlier
//! flags, and hand the scene to the configured renderers.

pub mod config;
pub mod detection;
pub mod error;
pub mod stubs;
pub mod traits;
pub mod types;
pub mod viz;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use traits::{BatchSelector, EndpointStore, PersistOutcome};
pub use types::{EndpointAttributes, EndpointId, EndpointRecord};
