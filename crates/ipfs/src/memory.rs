use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cid::Cid;
use cid::multihash::Multihash;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{ContentStore, IpfsError, PinEntry, PinMetadata, PinnedContent, Result};

/// Multicodec for raw binary content
const RAW_CODEC: u64 = 0x55;
/// Multihash code for sha2-256
const SHA2_256: u64 = 0x12;

/// CIDv1 (raw, sha2-256) of the given bytes
pub fn cid_for(bytes: &[u8]) -> Result<String> {
    let hash = Multihash::<64>::wrap(SHA2_256, &Sha256::digest(bytes))
        .map_err(|e| IpfsError::Upload(format!("cannot hash content: {}", e)))?;
    Ok(Cid::new_v1(RAW_CODEC, hash).to_string())
}

struct StoredObject {
    bytes: Vec<u8>,
    name: String,
    pinned_at: DateTime<Utc>,
}

/// In-process content store used by tests and the `memory` storage backend
pub struct MemoryStore {
    objects: RwLock<HashMap<String, StoredObject>>,
    gateway: String,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            gateway: "memory://".to_string(),
        }
    }

    pub async fn contains(&self, cid: &str) -> bool {
        self.objects.read().await.contains_key(cid)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn upload(&self, bytes: &[u8], name: &str) -> Result<PinnedContent> {
        let cid = cid_for(bytes)?;
        let mut objects = self.objects.write().await;
        let is_duplicate = objects.contains_key(&cid);
        let pinned_at = Utc::now();
        if !is_duplicate {
            objects.insert(
                cid.clone(),
                StoredObject {
                    bytes: bytes.to_vec(),
                    name: name.to_string(),
                    pinned_at,
                },
            );
        }
        debug!("Pinned {} bytes as {} (duplicate: {})", bytes.len(), cid, is_duplicate);

        Ok(PinnedContent {
            ipfs_hash: cid,
            pin_size: bytes.len() as u64,
            timestamp: pinned_at.to_rfc3339(),
            is_duplicate,
        })
    }

    async fn upload_json(&self, value: &Value, name: &str) -> Result<PinnedContent> {
        let bytes = serde_json::to_vec(value).map_err(|e| IpfsError::Upload(e.to_string()))?;
        self.upload(&bytes, name).await
    }

    async fn fetch(&self, cid: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(cid)
            .map(|object| object.bytes.clone())
            .ok_or_else(|| IpfsError::Fetch(format!("{} is not pinned", cid)))
    }

    async fn fetch_pins(&self) -> Result<Vec<PinEntry>> {
        let objects = self.objects.read().await;
        let mut pins: Vec<(&DateTime<Utc>, PinEntry)> = objects
            .iter()
            .map(|(cid, object)| {
                (
                    &object.pinned_at,
                    PinEntry {
                        cid: cid.clone(),
                        size: object.bytes.len() as u64,
                        date_pinned: Some(object.pinned_at.to_rfc3339()),
                        metadata: PinMetadata {
                            name: Some(object.name.clone()),
                        },
                    },
                )
            })
            .collect();
        pins.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cid.cmp(&b.1.cid)));
        Ok(pins.into_iter().map(|(_, entry)| entry).collect())
    }

    async fn unpin(&self, cid: &str) -> Result<()> {
        match self.objects.write().await.remove(cid) {
            Some(_) => Ok(()),
            None => Err(IpfsError::Unpin(format!("{} is not pinned", cid))),
        }
    }

    fn gateway_url(&self, cid: &str) -> String {
        format!("{}{}", self.gateway, cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_identical_bytes_same_cid() {
        let store = MemoryStore::new();
        let first = store.upload(b"ciphertext", "a.json").await.unwrap();
        let second = store.upload(b"ciphertext", "b.json").await.unwrap();
        assert_eq!(first.ipfs_hash, second.ipfs_hash);
        assert!(!first.is_duplicate);
        assert!(second.is_duplicate);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_different_bytes_different_cid() {
        let store = MemoryStore::new();
        let a = store.upload(b"one", "a").await.unwrap();
        let b = store.upload(b"two", "b").await.unwrap();
        assert_ne!(a.ipfs_hash, b.ipfs_hash);
    }

    #[test]
    fn test_cid_is_v1_raw() {
        let cid = cid_for(b"").unwrap();
        assert_eq!(cid, "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku");
    }

    #[tokio::test]
    async fn test_fetch_returns_exact_bytes() {
        let store = MemoryStore::new();
        let pinned = store.upload(b"\x00\x01binary", "bin").await.unwrap();
        assert_eq!(store.fetch(&pinned.ipfs_hash).await.unwrap(), b"\x00\x01binary");
        assert!(store.fetch("bafkreimissing").await.is_err());
    }

    #[tokio::test]
    async fn test_pins_and_unpin() {
        let store = MemoryStore::new();
        let pinned = store.upload_json(&json!({"a": 1}), "doc").await.unwrap();
        let pins = store.fetch_pins().await.unwrap();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].cid, pinned.ipfs_hash);
        assert_eq!(pins[0].metadata.name.as_deref(), Some("doc"));

        store.unpin(&pinned.ipfs_hash).await.unwrap();
        assert!(store.is_empty().await);
        assert!(store.unpin(&pinned.ipfs_hash).await.is_err());
    }
}
