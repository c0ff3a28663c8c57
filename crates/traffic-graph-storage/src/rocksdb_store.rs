//! RocksDB-backed endpoint store.
//!
//! One database holds every endpoint record, keyed by the UTF-8
//! "address:port" identity. The finder's flag write-back goes through a
//! single `WriteBatch`, so a batch of flags lands atomically or not at
//! all, and repeating the identical write leaves the store unchanged.

use std::path::Path;

use async_trait::async_trait;
use rocksdb::{Cache, ColumnFamily, IteratorMode, Options, WriteBatch, DB};
use thiserror::Error;
use tracing::{debug, info};

use traffic_graph_core::error::{CoreError, CoreResult};
use traffic_graph_core::traits::{BatchSelector, EndpointStore, PersistOutcome};
use traffic_graph_core::types::{EndpointId, EndpointRecord};

use crate::column_families::{cf_names, get_column_family_descriptors};
use crate::serialization::{
    deserialize_record, endpoint_key, serialize_record, SerializationError,
};

/// Default shared block cache size: 64MB.
pub const DEFAULT_CACHE_SIZE: usize = 64 * 1024 * 1024;

/// Default maximum open files.
pub const DEFAULT_MAX_OPEN_FILES: i32 = 512;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database failed to open.
    #[error("Failed to open database at '{path}': {message}")]
    OpenFailed {
        /// Requested database path.
        path: String,
        /// Underlying RocksDB message.
        message: String,
    },

    /// Column family missing (possible only if the DB opened without it).
    #[error("Column family '{name}' not found")]
    ColumnFamilyNotFound {
        /// Name of the missing family.
        name: String,
    },

    /// Write operation failed.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Read operation failed.
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// Encode or decode of a stored value failed.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl From<StorageError> for CoreError {
    fn from(e: StorageError) -> Self {
        CoreError::StorageError(e.to_string())
    }
}

/// Tuning knobs for [`RocksEndpointStore`].
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Maximum open files.
    pub max_open_files: i32,
    /// Shared block cache size in bytes.
    pub block_cache_size: usize,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            max_open_files: DEFAULT_MAX_OPEN_FILES,
            block_cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

/// Persistent [`EndpointStore`] over RocksDB.
pub struct RocksEndpointStore {
    db: DB,
    // Shared block cache, kept alive for the DB lifetime.
    #[allow(dead_code)]
    cache: Cache,
}

impl RocksEndpointStore {
    /// Open (or create) a store at `path` with default tuning.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::OpenFailed` if RocksDB cannot open the
    /// path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open_with_config(path, &RocksDbConfig::default())
    }

    /// Open (or create) a store with explicit tuning.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: &RocksDbConfig,
    ) -> Result<Self, StorageError> {
        let path_str = path.as_ref().display().to_string();
        let cache = Cache::new_lru_cache(config.block_cache_size);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_open_files(config.max_open_files);

        let descriptors = get_column_family_descriptors(&cache);
        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), descriptors).map_err(|e| {
            StorageError::OpenFailed {
                path: path_str.clone(),
                message: e.to_string(),
            }
        })?;

        info!(path = %path_str, "opened endpoint store");
        Ok(Self { db, cache })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound {
                name: name.to_string(),
            })
    }

    /// Read one record by identity.
    pub fn get_record(&self, id: &EndpointId) -> Result<Option<EndpointRecord>, StorageError> {
        let cf = self.cf(cf_names::ENDPOINTS)?;
        let bytes = self
            .db
            .get_cf(cf, endpoint_key(id))
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;
        match bytes {
            Some(bytes) => Ok(Some(deserialize_record(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace one record.
    pub fn put_record(&self, record: &EndpointRecord) -> Result<(), StorageError> {
        let cf = self.cf(cf_names::ENDPOINTS)?;
        let bytes = serialize_record(record)?;
        self.db
            .put_cf(cf, endpoint_key(&record.id), bytes)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))
    }

    /// Every stored record whose attributes match the selector, in key
    /// order. RocksDB iterates keys lexicographically, so repeated runs
    /// over the same data see the same batch order.
    pub fn scan_records(
        &self,
        selector: &BatchSelector,
    ) -> Result<Vec<EndpointRecord>, StorageError> {
        let cf = self.cf(cf_names::ENDPOINTS)?;
        let mut batch = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            let record = deserialize_record(&value)?;
            if selector.matches(&record) {
                batch.push(record);
            }
        }
        Ok(batch)
    }

    /// Flush memtables to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| StorageError::WriteFailed(e.to_string()))
    }

    fn write_flags(&self, flags: &[(EndpointId, bool)]) -> Result<PersistOutcome, StorageError> {
        let cf = self.cf(cf_names::ENDPOINTS)?;
        let mut batch = WriteBatch::default();
        let mut outcome = PersistOutcome::default();

        for (id, value) in flags {
            let key = endpoint_key(id);
            let existing = self
                .db
                .get_cf(cf, &key)
                .map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            match existing {
                Some(bytes) => {
                    let mut record = deserialize_record(&bytes)?;
                    record.outlier = Some(*value);
                    batch.put_cf(cf, &key, serialize_record(&record)?);
                    outcome.written += 1;
                }
                None => {
                    debug!(endpoint = %id, "flag target vanished, skipping");
                    outcome.stale += 1;
                }
            }
        }

        self.db
            .write(batch)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(outcome)
    }
}

#[async_trait]
impl EndpointStore for RocksEndpointStore {
    async fn fetch_batch(&self, selector: &BatchSelector) -> CoreResult<Vec<EndpointRecord>> {
        Ok(self.scan_records(selector)?)
    }

    async fn set_outlier_flags(
        &self,
        flags: &[(EndpointId, bool)],
    ) -> CoreResult<PersistOutcome> {
        Ok(self.write_flags(flags)?)
    }

    async fn put_endpoint(&self, record: &EndpointRecord) -> CoreResult<()> {
        record.validate()?;
        Ok(self.put_record(record)?)
    }

    async fn count(&self) -> CoreResult<usize> {
        let cf = self.cf(cf_names::ENDPOINTS).map_err(CoreError::from)?;
        let mut total = 0usize;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item.map_err(|e| CoreError::StorageError(e.to_string()))?;
            total += 1;
        }
        Ok(total)
    }
}
