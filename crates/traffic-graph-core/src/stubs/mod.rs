//! In-memory stub implementations for development and testing.

mod memory_store;

pub use memory_store::InMemoryEndpointStore;
