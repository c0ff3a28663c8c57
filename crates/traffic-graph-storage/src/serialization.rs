//! Binary serialization for stored endpoint records.
//!
//! Records are bincode-encoded; keys are the UTF-8 "address:port"
//! rendering of [`EndpointId`], which keeps iteration order stable and
//! the keys greppable in debugging tools.

use thiserror::Error;

use traffic_graph_core::types::{EndpointId, EndpointRecord};

/// Errors from encode or decode of stored values.
///
/// bincode's error type does not implement `Clone`, so messages are
/// carried as strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Encoding a record failed.
    #[error("Serialization failed: {0}")]
    SerializeFailed(String),

    /// Decoding stored bytes failed (corrupt or incompatible data).
    #[error("Deserialization failed: {0}")]
    DeserializeFailed(String),

    /// A stored key was not valid UTF-8 or not "address:port" shaped.
    #[error("Invalid endpoint key: {0}")]
    InvalidKey(String),
}

/// Encode a record for storage.
pub fn serialize_record(record: &EndpointRecord) -> Result<Vec<u8>, SerializationError> {
    bincode::serialize(record).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Decode a stored record.
pub fn deserialize_record(bytes: &[u8]) -> Result<EndpointRecord, SerializationError> {
    bincode::deserialize(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

/// Storage key for an endpoint identity.
pub fn endpoint_key(id: &EndpointId) -> Vec<u8> {
    id.storage_key().into_bytes()
}

/// Recover an identity from a stored key.
///
/// The port is the suffix after the last colon, so IPv6 addresses with
/// embedded colons parse correctly.
pub fn parse_endpoint_key(bytes: &[u8]) -> Result<EndpointId, SerializationError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| SerializationError::InvalidKey(e.to_string()))?;
    let (address, port) = text
        .rsplit_once(':')
        .ok_or_else(|| SerializationError::InvalidKey(format!("missing port in '{text}'")))?;
    let port = port
        .parse::<u16>()
        .map_err(|e| SerializationError::InvalidKey(format!("bad port in '{text}': {e}")))?;
    Ok(EndpointId::new(address, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use traffic_graph_core::types::EndpointAttributes;

    #[test]
    fn test_record_roundtrip() {
        let mut record = EndpointRecord::new(
            EndpointId::new("192.0.2.17", 8443),
            vec![0.5, -1.25, 3.0],
            EndpointAttributes::default(),
        );
        record.attributes.organization = Some("Example Corp".to_string());
        record.outlier = Some(true);

        let bytes = serialize_record(&record).unwrap();
        let back = deserialize_record(&bytes).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        let err = deserialize_record(&[0xFF; 3]).unwrap_err();
        assert!(matches!(err, SerializationError::DeserializeFailed(_)));
    }

    #[test]
    fn test_key_roundtrip() {
        let id = EndpointId::new("10.20.30.40", 53);
        let key = endpoint_key(&id);
        assert_eq!(key, b"10.20.30.40:53");
        assert_eq!(parse_endpoint_key(&key).unwrap(), id);
    }

    #[test]
    fn test_key_roundtrip_ipv6() {
        let id = EndpointId::new("2001:db8::1", 443);
        let key = endpoint_key(&id);
        assert_eq!(parse_endpoint_key(&key).unwrap(), id);
    }

    #[test]
    fn test_key_without_port_is_invalid() {
        let err = parse_endpoint_key(b"not-a-key").unwrap_err();
        assert!(matches!(err, SerializationError::InvalidKey(_)));
    }
}
