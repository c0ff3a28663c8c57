//! Persistent storage layer for the traffic graph.
//!
//! RocksDB-backed implementation of the core
//! [`EndpointStore`](traffic_graph_core::traits::EndpointStore) trait.
//!
//! # Architecture
//! - `rocksdb_store`: the store implementation
//! - `column_families`: column family definitions and tuning
//! - `serialization`: bincode encode/decode and key handling

pub mod column_families;
pub mod rocksdb_store;
pub mod serialization;

pub use column_families::{cf_names, endpoints_options, get_column_family_descriptors, system_options};
pub use rocksdb_store::{RocksDbConfig, RocksEndpointStore, StorageError};
pub use serialization::{
    deserialize_record, endpoint_key, parse_endpoint_key, serialize_record, SerializationError,
};
