//! Domain types for the traffic graph.
//!
//! The unit of analysis is the [`EndpointRecord`]: one observed network
//! endpoint (address + port) with its embedding vector, descriptive
//! attributes, and the tri-state outlier flag produced by the finder
//! pipeline.

mod endpoint;

pub use endpoint::{EndpointAttributes, EndpointId, EndpointRecord};
