use async_trait::async_trait;
use cid::Cid;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// Module declarations
pub mod memory;
pub mod pinata;

// Re-export commonly used types
pub use memory::{MemoryStore, cid_for};
pub use pinata::PinataClient;

#[derive(Error, Debug)]
pub enum IpfsError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Unpin failed: {0}")]
    Unpin(String),

    #[error("Invalid response from pinning service: {0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid CID: {0}")]
    InvalidCid(String),
}

pub type Result<T> = std::result::Result<T, IpfsError>;

/// Canonical form of a CID. Anything that does not parse as one is rejected,
/// so a caller-supplied CID can only ever name content.
pub fn parse_cid(value: &str) -> Result<String> {
    Cid::try_from(value.trim())
        .map(|cid| cid.to_string())
        .map_err(|e| IpfsError::InvalidCid(format!("{}: {}", value, e)))
}

/// Result of pinning content, in the pinning service's own field names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedContent {
    #[serde(rename = "IpfsHash")]
    pub ipfs_hash: String,
    #[serde(rename = "PinSize", default)]
    pub pin_size: u64,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
    #[serde(rename = "isDuplicate", default)]
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinMetadata {
    #[serde(default)]
    pub name: Option<String>,
}

/// One row of the pin index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinEntry {
    #[serde(rename = "ipfs_pin_hash")]
    pub cid: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub date_pinned: Option<String>,
    #[serde(default)]
    pub metadata: PinMetadata,
}

/// Content-addressed storage for opaque, already-encrypted payloads.
///
/// Implementations must store bytes exactly as given: the CID returned by
/// `upload` names those bytes and nothing else.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn upload(&self, bytes: &[u8], name: &str) -> Result<PinnedContent>;

    async fn upload_json(&self, value: &Value, name: &str) -> Result<PinnedContent>;

    async fn fetch(&self, cid: &str) -> Result<Vec<u8>>;

    /// Walk the whole pin index. Stops early on a failed page and returns what it has.
    async fn fetch_pins(&self) -> Result<Vec<PinEntry>>;

    async fn unpin(&self, cid: &str) -> Result<()>;

    fn gateway_url(&self, cid: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cid() {
        let cid = cid_for(b"record").unwrap();
        assert_eq!(parse_cid(&cid).unwrap(), cid);
        assert_eq!(parse_cid(&format!(" {} ", cid)).unwrap(), cid);
        assert!(parse_cid("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").is_ok());

        for bad in ["", "../../data/pinList", "bafkreiexample", "ipfs/x"] {
            assert!(matches!(parse_cid(bad), Err(IpfsError::InvalidCid(_))), "{}", bad);
        }
    }
}
