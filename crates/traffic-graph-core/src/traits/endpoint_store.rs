//! Endpoint store trait for batch fetch and outlier persistence.
//!
//! The finder pipeline performs exactly one read pass and one write pass
//! per invocation. The store handle is injected at call time (no global
//! driver), which is what makes the pipeline testable against
//! [`crate::stubs::InMemoryEndpointStore`].

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{EndpointId, EndpointRecord};

/// Logical partition selector for a batch fetch.
///
/// `All` is the only selector the current schema needs ("all current
/// traffic aggregates"); `Organization` narrows a batch to one resolved
/// org, which is the one variation point the source schemas differ on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BatchSelector {
    /// Every eligible endpoint record.
    #[default]
    All,
    /// Endpoints whose resolved organization matches exactly.
    Organization(String),
}

impl BatchSelector {
    /// Whether a record belongs to this partition.
    pub fn matches(&self, record: &EndpointRecord) -> bool {
        match self {
            BatchSelector::All => true,
            BatchSelector::Organization(org) => {
                record.attributes.organization.as_deref() == Some(org.as_str())
            }
        }
    }
}

/// Result of one outlier-flag write pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    /// Flags written onto matching entities.
    pub written: usize,
    /// Identities that no longer matched any stored entity. Skipped and
    /// counted, never fatal.
    pub stale: usize,
}

/// Persistence and query abstraction over the traffic graph store.
///
/// Implementations must provide:
/// - `fetch_batch`: an empty result is a valid, non-error response
///   (the caller maps it to `DataUnavailable`);
/// - `set_outlier_flags`: an atomic, idempotent upsert pass — either every
///   flag for a matching identity is written or none is, and repeating the
///   identical call must leave the store unchanged.
#[async_trait]
pub trait EndpointStore: Send + Sync {
    /// Fetch every endpoint record in the selected partition.
    async fn fetch_batch(&self, selector: &BatchSelector) -> CoreResult<Vec<EndpointRecord>>;

    /// Upsert outlier flags keyed by identity, atomically.
    ///
    /// Identities with no matching entity are skipped and counted in
    /// [`PersistOutcome::stale`].
    async fn set_outlier_flags(
        &self,
        flags: &[(EndpointId, bool)],
    ) -> CoreResult<PersistOutcome>;

    /// Insert or replace a record. Used by the import path and tests.
    async fn put_endpoint(&self, record: &EndpointRecord) -> CoreResult<()>;

    /// Total number of stored records.
    async fn count(&self) -> CoreResult<usize>;
}
