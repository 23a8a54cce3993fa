use serde::{Deserialize, Serialize};

use crate::ecies::{self, EncryptedPayload};
use crate::symmetric::{SymmetricKey, SymmetricPayload};
use crate::{CryptoError, Result};

/// The document stored in the content store for every record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme")]
pub enum Envelope {
    #[serde(rename = "ecdh-aes-256-gcm")]
    Asymmetric(EncryptedPayload),
    #[serde(rename = "aes-256-gcm")]
    Symmetric(SymmetricPayload),
}

impl Envelope {
    pub fn seal_for(plaintext: &[u8], recipient_public_key: &str) -> Result<Self> {
        Ok(Envelope::Asymmetric(ecies::encrypt(plaintext, recipient_public_key)?))
    }

    pub fn seal_with(plaintext: &[u8], key: &SymmetricKey) -> Result<Self> {
        Ok(Envelope::Symmetric(key.encrypt(plaintext)?))
    }

    /// Serialize once; these exact bytes are what gets pinned and addressed
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CryptoError::Encryption(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| CryptoError::Decryption(format!("Malformed envelope: {}", e)))
    }

    pub fn open(&self, private_key: Option<&str>, symmetric: Option<&SymmetricKey>) -> Result<Vec<u8>> {
        match self {
            Envelope::Asymmetric(payload) => {
                let private_key = private_key.ok_or_else(|| {
                    CryptoError::Decryption("A private key is required to open this record".to_string())
                })?;
                ecies::decrypt_with_private_key(payload, private_key)
            }
            Envelope::Symmetric(payload) => {
                let key = symmetric.ok_or_else(|| {
                    CryptoError::Decryption("No symmetric key configured".to_string())
                })?;
                key.decrypt(payload)
            }
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Envelope::Asymmetric(_) => "ecdh-aes-256-gcm",
            Envelope::Symmetric(_) => "aes-256-gcm",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_key_pair;

    #[test]
    fn test_asymmetric_envelope() {
        let pair = generate_key_pair();
        let envelope = Envelope::seal_for(b"{\"id\":\"r1\"}", &pair.public_key).unwrap();
        let bytes = envelope.to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"scheme\":\"ecdh-aes-256-gcm\""));
        assert!(text.contains("ephemeralPublicKey"));

        let restored = Envelope::from_bytes(&bytes).unwrap();
        assert_eq!(restored, envelope);
        assert_eq!(
            restored.open(Some(pair.private_key.as_str()), None).unwrap(),
            b"{\"id\":\"r1\"}"
        );
        assert!(restored.open(None, None).is_err());
    }

    #[test]
    fn test_symmetric_envelope() {
        let key = SymmetricKey::generate();
        let envelope = Envelope::seal_with(b"payload", &key).unwrap();
        assert_eq!(envelope.scheme(), "aes-256-gcm");
        let restored = Envelope::from_bytes(&envelope.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.open(None, Some(&key)).unwrap(), b"payload");
    }

    #[test]
    fn test_malformed_envelope() {
        let err = Envelope::from_bytes(b"{\"scheme\":\"rot13\"}").unwrap_err();
        assert!(matches!(err, CryptoError::Decryption(_)));
    }
}
