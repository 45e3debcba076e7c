//! # Persistence Format
//!
//! Two encodings of the same [`Snapshot`]:
//!
//! - **Binary**: Header (5 bytes) + postcard payload. Used by the redb
//!   backend and by `radon export -t snapshot`.
//!   - 4 bytes: Magic ("RDON")
//!   - 1 byte: Version
//! - **JSON**: a plain object with `campaigns` and `stock_ledger` arrays, the
//!   layout the JSON file backend keeps on disk.
//!
//! Sizes and headers are validated before any payload is decoded.

use crate::{Campaign, RadonError, StockEntry, primitives};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum accepted size of an encoded snapshot (256 MB).
///
/// Photos dominate the size of a snapshot; this bounds a few thousand
/// campaigns with full photo sets.
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024;

/// Header length in bytes.
const HEADER_LEN: usize = 5;

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Everything the store persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    #[serde(default)]
    pub stock_ledger: Vec<StockEntry>,
}

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes every binary payload.
#[derive(Debug, Clone, Copy)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), RadonError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(RadonError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(RadonError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RadonError> {
        if bytes.len() < HEADER_LEN {
            return Err(RadonError::SerializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// BINARY ENCODING
// =============================================================================

/// Encode any persisted value as header + postcard payload.
pub fn encode_binary<T: Serialize>(value: &T) -> Result<Vec<u8>, RadonError> {
    let payload =
        postcard::to_stdvec(value).map_err(|e| RadonError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&PersistenceHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Decode a value written by [`encode_binary`].
pub fn decode_binary<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RadonError> {
    if bytes.len() < HEADER_LEN {
        return Err(RadonError::SerializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_LEN
        )));
    }
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(RadonError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    PersistenceHeader::from_bytes(bytes)?.validate()?;

    postcard::from_bytes(&bytes[HEADER_LEN..])
        .map_err(|e| RadonError::SerializationError(format!("Failed to decode payload: {}", e)))
}

/// Serialize a snapshot to binary.
pub fn snapshot_to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>, RadonError> {
    encode_binary(snapshot)
}

/// Deserialize a binary snapshot.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Snapshot, RadonError> {
    decode_binary(bytes)
}

// =============================================================================
// JSON ENCODING
// =============================================================================

/// Serialize a snapshot to pretty-printed JSON.
pub fn snapshot_to_json(snapshot: &Snapshot) -> Result<Vec<u8>, RadonError> {
    serde_json::to_vec_pretty(snapshot).map_err(|e| RadonError::SerializationError(e.to_string()))
}

/// Deserialize a JSON snapshot. Missing keys read as empty collections.
pub fn snapshot_from_json(bytes: &[u8]) -> Result<Snapshot, RadonError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(RadonError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }
    serde_json::from_slice(bytes).map_err(|e| RadonError::SerializationError(e.to_string()))
}

/// Read either encoding, sniffing the magic bytes.
pub fn snapshot_from_any(bytes: &[u8]) -> Result<Snapshot, RadonError> {
    if bytes.starts_with(primitives::MAGIC_BYTES) {
        snapshot_from_bytes(bytes)
    } else {
        snapshot_from_json(bytes)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_campaigns;

    #[test]
    fn header_roundtrip() {
        let header = PersistenceHeader::new();
        let restored = PersistenceHeader::from_bytes(&header.to_bytes()).expect("parse header");

        assert_eq!(restored.magic, *primitives::MAGIC_BYTES);
        assert_eq!(restored.version, primitives::FORMAT_VERSION);
    }

    #[test]
    fn binary_snapshot_bit_exact() {
        let snapshot = Snapshot {
            campaigns: demo_campaigns(),
            stock_ledger: Vec::new(),
        };

        let bytes1 = snapshot_to_bytes(&snapshot).expect("first serialize");
        let restored = snapshot_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = snapshot_to_bytes(&restored).expect("second serialize");

        assert_eq!(restored, snapshot);
        assert_eq!(bytes1, bytes2, "save -> load -> save must be identical");
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(snapshot_from_bytes(&bytes).is_err());
    }

    #[test]
    fn json_missing_keys_are_empty() {
        let snapshot = snapshot_from_json(b"{}").expect("parse");
        assert!(snapshot.campaigns.is_empty());
        assert!(snapshot.stock_ledger.is_empty());
    }

    #[test]
    fn sniffing_picks_encoding() {
        let snapshot = Snapshot {
            campaigns: demo_campaigns(),
            stock_ledger: Vec::new(),
        };
        let json = snapshot_to_json(&snapshot).expect("json");
        let binary = snapshot_to_bytes(&snapshot).expect("binary");

        assert_eq!(snapshot_from_any(&json).expect("json"), snapshot);
        assert_eq!(snapshot_from_any(&binary).expect("binary"), snapshot);
    }
}
