//! Endpoint record types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Stable identity of a network endpoint: address plus port.
///
/// Used as the persistence round-trip key. Must be unique within a batch.
///
/// # Examples
///
/// ```
/// use traffic_graph_core::types::EndpointId;
///
/// let id = EndpointId::new("93.184.216.34", 443);
/// assert_eq!(id.to_string(), "93.184.216.34:443");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointId {
    /// IP address (v4 or v6) as observed on the wire.
    pub address: String,
    /// Transport port.
    pub port: u16,
}

impl EndpointId {
    /// Create a new endpoint identity.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Rendered storage key, identical to the `Display` form.
    pub fn storage_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Descriptive metadata carried through for annotation only.
///
/// Never used in distance computation; the pipeline reads these fields
/// solely to label plot points and the outlier report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointAttributes {
    /// Resolved organization name, if enrichment found one.
    pub organization: Option<String>,
    /// Reverse-DNS hostname, if any.
    pub hostname: Option<String>,
    /// Geolocation string ("City, Country").
    pub location: Option<String>,
    /// Aggregate traffic size in bytes for this endpoint.
    pub total_size: u64,
}

impl EndpointAttributes {
    /// Single-line annotation used by both plot backends.
    pub fn annotation(&self, id: &EndpointId) -> String {
        let org = self.organization.as_deref().unwrap_or("unknown");
        format!("{}({}) {}", id, self.total_size, org)
    }
}

/// One endpoint with its embedding, attributes, and outlier flag.
///
/// Records are created by the upstream embedding stage; the finder
/// pipeline only ever mutates `outlier`, once per record per run.
///
/// The flag is tri-state: `None` means the record was never evaluated,
/// `Some(false)` evaluated and normal, `Some(true)` evaluated and
/// anomalous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    /// Stable identity, unique within a batch.
    pub id: EndpointId,
    /// Fixed-length embedding vector. Dimensionality must be identical
    /// across every record in a batch.
    pub embedding: Vec<f32>,
    /// Annotation-only metadata.
    #[serde(default)]
    pub attributes: EndpointAttributes,
    /// Outlier flag written back by the finder pipeline.
    #[serde(default)]
    pub outlier: Option<bool>,
}

impl EndpointRecord {
    /// Create a record that has never been evaluated.
    pub fn new(id: EndpointId, embedding: Vec<f32>, attributes: EndpointAttributes) -> Self {
        Self {
            id,
            embedding,
            attributes,
            outlier: None,
        }
    }

    /// Validate the record before it enters the store or the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ValidationError` if the embedding is empty or
    /// contains a non-finite component.
    pub fn validate(&self) -> CoreResult<()> {
        if self.embedding.is_empty() {
            return Err(CoreError::ValidationError {
                field: "embedding".to_string(),
                message: format!("embedding for {} must not be empty", self.id),
            });
        }

        if let Some(pos) = self.embedding.iter().position(|v| !v.is_finite()) {
            return Err(CoreError::ValidationError {
                field: "embedding".to_string(),
                message: format!(
                    "embedding for {} has non-finite component at index {}",
                    self.id, pos
                ),
            });
        }

        Ok(())
    }
}
