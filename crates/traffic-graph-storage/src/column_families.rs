//! RocksDB column family definitions.
//!
//! Two families keep record data and bookkeeping separate:
//!
//! | Name | Purpose | Key Format |
//! |------|---------|------------|
//! | endpoints | Endpoint records with embeddings | "address:port" UTF-8 |
//! | system | Schema version, bookkeeping | string key |
//!
//! All families share one block cache.

use rocksdb::{BlockBasedOptions, Cache, ColumnFamilyDescriptor, Options};

/// Column family name constants.
pub mod cf_names {
    /// Primary endpoint record storage.
    pub const ENDPOINTS: &str = "endpoints";

    /// System bookkeeping (rare access, no compression).
    pub const SYSTEM: &str = "system";

    /// All column family names.
    pub const ALL: &[&str] = &[ENDPOINTS, SYSTEM];
}

/// Options for endpoint record storage (point lookups plus one full
/// scan per finder run).
///
/// Bloom filter at 10 bits per key keeps stale-flag existence checks
/// off disk; LZ4 keeps embedding-heavy values compact.
pub fn endpoints_options(cache: &Cache) -> Options {
    let mut block_opts = BlockBasedOptions::default();
    block_opts.set_block_cache(cache);
    block_opts.set_bloom_filter(10.0, false);
    block_opts.set_cache_index_and_filter_blocks(true);

    let mut opts = Options::default();
    opts.set_block_based_table_factory(&block_opts);
    opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
    opts.create_if_missing(true);

    opts
}

/// Options for system metadata (tiny, rarely touched).
pub fn system_options(cache: &Cache) -> Options {
    let mut block_opts = BlockBasedOptions::default();
    block_opts.set_block_cache(cache);

    let mut opts = Options::default();
    opts.set_block_based_table_factory(&block_opts);
    opts.set_compression_type(rocksdb::DBCompressionType::None);
    opts.create_if_missing(true);

    opts
}

/// Descriptors for every column family, sharing one block cache.
pub fn get_column_family_descriptors(cache: &Cache) -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(cf_names::ENDPOINTS, endpoints_options(cache)),
        ColumnFamilyDescriptor::new(cf_names::SYSTEM, system_options(cache)),
    ]
}
