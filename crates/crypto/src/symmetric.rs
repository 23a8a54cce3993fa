use aes_gcm::{
    Aes256Gcm, AesGcm, Nonce,
    aead::{Aead, KeyInit, consts::U16},
    aes::Aes256,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{CryptoError, IV_LEN, KEY_LEN, Result, TAG_LEN, decode_hex};

/// AES-256-GCM with a 128-bit nonce, used by clients that generate 16-byte IVs
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Ciphertext produced with a shared symmetric key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymmetricPayload {
    #[serde(default)]
    pub iv: String,
    #[serde(default)]
    pub auth_tag: String,
    #[serde(default)]
    pub encrypted: String,
}

/// 256-bit AES key, wiped from memory on drop
#[derive(Clone)]
pub struct SymmetricKey(Zeroizing<[u8; KEY_LEN]>);

impl SymmetricKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "symmetric key must be {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn from_hex(value: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            decode_hex(value).map_err(|e| CryptoError::InvalidKey(format!("bad hex: {}", e)))?,
        );
        Self::from_bytes(&bytes)
    }

    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        rand::thread_rng().fill_bytes(&mut key[..]);
        Self(key)
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<SymmetricPayload> {
        let sealed = seal(self.0.as_slice(), plaintext)?;
        Ok(SymmetricPayload {
            iv: hex::encode(sealed.iv),
            auth_tag: hex::encode(sealed.auth_tag),
            encrypted: hex::encode(sealed.ciphertext),
        })
    }

    pub fn decrypt(&self, payload: &SymmetricPayload) -> Result<Vec<u8>> {
        require_fields(&[
            ("iv", &payload.iv),
            ("authTag", &payload.auth_tag),
            ("encrypted", &payload.encrypted),
        ])?;
        let iv = decode_field("iv", &payload.iv)?;
        let auth_tag = decode_field("authTag", &payload.auth_tag)?;
        let ciphertext = decode_field("encrypted", &payload.encrypted)?;
        open(self.0.as_slice(), &iv, &ciphertext, &auth_tag)
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

pub(crate) struct Sealed {
    pub iv: [u8; IV_LEN],
    pub auth_tag: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

/// Encrypt with AES-256-GCM under a fresh random IV, splitting the tag off the ciphertext
pub(crate) fn seal(key: &[u8], plaintext: &[u8]) -> Result<Sealed> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::Encryption(format!("Failed to create AES cipher: {:?}", e)))?;

    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let mut ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("Failed to encrypt data: {:?}", e)))?;
    let auth_tag = ciphertext.split_off(ciphertext.len() - TAG_LEN);

    Ok(Sealed {
        iv,
        auth_tag,
        ciphertext,
    })
}

/// Authenticate and decrypt. Returns the plaintext only when the tag verifies.
pub(crate) fn open(key: &[u8], iv: &[u8], ciphertext: &[u8], auth_tag: &[u8]) -> Result<Vec<u8>> {
    if auth_tag.len() != TAG_LEN {
        return Err(CryptoError::Decryption(format!(
            "Invalid auth tag length: expected {} bytes, got {}",
            TAG_LEN,
            auth_tag.len()
        )));
    }

    let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(auth_tag);

    let result = match iv.len() {
        12 => Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::Decryption(format!("Failed to create AES cipher: {:?}", e)))?
            .decrypt(Nonce::from_slice(iv), sealed.as_ref()),
        16 => Aes256Gcm16::new_from_slice(key)
            .map_err(|e| CryptoError::Decryption(format!("Failed to create AES cipher: {:?}", e)))?
            .decrypt(Nonce::<U16>::from_slice(iv), sealed.as_ref()),
        n => {
            return Err(CryptoError::Decryption(format!(
                "Invalid IV length: expected 12 or 16 bytes, got {}",
                n
            )));
        }
    };

    result.map_err(|_| CryptoError::Decryption("authentication tag mismatch".to_string()))
}

/// Fail before touching any key material when a required field is absent
pub(crate) fn require_fields(fields: &[(&str, &String)]) -> Result<()> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(CryptoError::Decryption(format!(
            "Missing required field: {}",
            name
        ))),
        None => Ok(()),
    }
}

pub(crate) fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    decode_hex(value).map_err(|e| CryptoError::Decryption(format!("Invalid hex in {}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_roundtrip() {
        let key = SymmetricKey::generate();
        let payload = key.encrypt(b"blood pressure 120/80").unwrap();
        assert_eq!(hex::decode(&payload.iv).unwrap().len(), IV_LEN);
        assert_eq!(hex::decode(&payload.auth_tag).unwrap().len(), TAG_LEN);
        assert_eq!(key.decrypt(&payload).unwrap(), b"blood pressure 120/80");
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let payload = SymmetricKey::generate().encrypt(b"secret").unwrap();
        let err = SymmetricKey::generate().decrypt(&payload).unwrap_err();
        assert!(matches!(err, CryptoError::Decryption(_)));
    }

    #[test]
    fn test_sixteen_byte_iv_is_accepted() {
        let key = SymmetricKey::generate();
        let iv = [7u8; 16];
        let sealed = Aes256Gcm16::new_from_slice(key.0.as_slice())
            .unwrap()
            .encrypt(aes_gcm::Nonce::<U16>::from_slice(&iv), b"legacy".as_ref())
            .unwrap();
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);
        let payload = SymmetricPayload {
            iv: hex::encode(iv),
            auth_tag: hex::encode(tag),
            encrypted: hex::encode(ciphertext),
        };
        assert_eq!(key.decrypt(&payload).unwrap(), b"legacy");
    }

    #[test]
    fn test_invalid_iv_length() {
        let key = SymmetricKey::generate();
        let mut payload = key.encrypt(b"data").unwrap();
        payload.iv = "00".repeat(8);
        let err = key.decrypt(&payload).unwrap_err();
        assert!(err.to_string().contains("IV length"));
    }

    #[test]
    fn test_key_length_checked() {
        assert!(SymmetricKey::from_hex("abcd").is_err());
        assert!(SymmetricKey::from_hex(&format!("0x{}", "11".repeat(32))).is_ok());
    }
}
