//! In-memory endpoint store.
//!
//! Backs isolated pipeline tests and development runs without a database
//! on disk. Data is lost when the process exits.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{CoreError, CoreResult};
use crate::traits::{BatchSelector, EndpointStore, PersistOutcome};
use crate::types::{EndpointId, EndpointRecord};

/// HashMap-backed [`EndpointStore`] implementation.
///
/// Fetch order is deterministic: records are returned sorted by identity,
/// so repeated runs over the same data see the same input order (the
/// cluster engine is deterministic given fixed input order).
#[derive(Debug, Default)]
pub struct InMemoryEndpointStore {
    records: RwLock<HashMap<String, EndpointRecord>>,
}

impl InMemoryEndpointStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given records.
    pub fn with_records(records: impl IntoIterator<Item = EndpointRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.id.storage_key(), r))
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }

    /// Read back a single record, if present.
    pub fn get(&self, id: &EndpointId) -> Option<EndpointRecord> {
        self.records
            .read()
            .ok()
            .and_then(|map| map.get(&id.storage_key()).cloned())
    }

    /// Drop a record. Used by tests that simulate an upstream delete
    /// between fetch and persist.
    pub fn remove(&self, id: &EndpointId) -> Option<EndpointRecord> {
        self.records
            .write()
            .ok()
            .and_then(|mut map| map.remove(&id.storage_key()))
    }
}

#[async_trait]
impl EndpointStore for InMemoryEndpointStore {
    async fn fetch_batch(&self, selector: &BatchSelector) -> CoreResult<Vec<EndpointRecord>> {
        let map = self
            .records
            .read()
            .map_err(|e| CoreError::StorageError(format!("lock poisoned: {e}")))?;

        let mut batch: Vec<EndpointRecord> = map
            .values()
            .filter(|r| selector.matches(r))
            .cloned()
            .collect();
        batch.sort_by(|a, b| a.id.storage_key().cmp(&b.id.storage_key()));
        Ok(batch)
    }

    async fn set_outlier_flags(
        &self,
        flags: &[(EndpointId, bool)],
    ) -> CoreResult<PersistOutcome> {
        let mut map = self
            .records
            .write()
            .map_err(|e| CoreError::StorageError(format!("lock poisoned: {e}")))?;

        let mut outcome = PersistOutcome::default();
        for (id, value) in flags {
            match map.get_mut(&id.storage_key()) {
                Some(record) => {
                    record.outlier = Some(*value);
                    outcome.written += 1;
                }
                None => outcome.stale += 1,
            }
        }
        Ok(outcome)
    }

    async fn put_endpoint(&self, record: &EndpointRecord) -> CoreResult<()> {
        record.validate()?;
        let mut map = self
            .records
            .write()
            .map_err(|e| CoreError::StorageError(format!("lock poisoned: {e}")))?;
        map.insert(record.id.storage_key(), record.clone());
        Ok(())
    }

    async fn count(&self) -> CoreResult<usize> {
        let map = self
            .records
            .read()
            .map_err(|e| CoreError::StorageError(format!("lock poisoned: {e}")))?;
        Ok(map.len())
    }
}
