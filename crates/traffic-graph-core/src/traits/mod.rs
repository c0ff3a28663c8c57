//! Core trait abstractions.

mod endpoint_store;

pub use endpoint_store::{BatchSelector, EndpointStore, PersistOutcome};
