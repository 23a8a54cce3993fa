//! Asymmetric payload encryption: ECDH on secp256k1 followed by AES-256-GCM.
//!
//! The AES key is the first 32 bytes of the raw shared point (its x
//! coordinate). It is truncated, never hashed, so ciphertexts stay readable
//! by the browser clients that produced the existing records.

use rand::RngCore;
use secp256k1::{PublicKey, Secp256k1, SecretKey, ecdh};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::symmetric::{decode_field, open, require_fields, seal};
use crate::{CryptoError, KEY_LEN, Result, decode_hex};

/// A fresh secp256k1 key pair, hex encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub private_key: String,
    /// Uncompressed SEC1 encoding (65 bytes, `04` prefix)
    pub public_key: String,
}

/// Output of [`encrypt`]. Every field is hex; missing fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    #[serde(default)]
    pub ephemeral_public_key: String,
    #[serde(default)]
    pub iv: String,
    #[serde(default)]
    pub auth_tag: String,
    #[serde(default)]
    pub encrypted: String,
}

impl EncryptedPayload {
    pub fn validate(&self) -> Result<()> {
        require_fields(&[
            ("ephemeralPublicKey", &self.ephemeral_public_key),
            ("iv", &self.iv),
            ("authTag", &self.auth_tag),
            ("encrypted", &self.encrypted),
        ])
    }
}

pub fn generate_key_pair() -> KeyPair {
    let secp = Secp256k1::new();
    let secret_key = random_secret_key();
    let public_key = secret_key.public_key(&secp);
    KeyPair {
        private_key: hex::encode(secret_key.secret_bytes()),
        public_key: hex::encode(public_key.serialize_uncompressed()),
    }
}

pub fn encrypt(plaintext: &[u8], recipient_public_key: &str) -> Result<EncryptedPayload> {
    let recipient = parse_public_key(recipient_public_key)
        .map_err(|e| CryptoError::Encryption(format!("Invalid recipient public key: {}", e)))?;

    let secp = Secp256k1::new();
    let ephemeral_secret = random_secret_key();
    let ephemeral_public = ephemeral_secret.public_key(&secp);

    let shared = Zeroizing::new(ecdh::shared_secret_point(&recipient, &ephemeral_secret));
    let key = symmetric_key_from_secret(shared.as_slice()).map_err(|e| match e {
        CryptoError::Decryption(msg) => CryptoError::Encryption(msg),
        other => other,
    })?;

    let sealed = seal(key.as_slice(), plaintext)?;
    debug!("Encrypted {} bytes for recipient", plaintext.len());

    Ok(EncryptedPayload {
        ephemeral_public_key: hex::encode(ephemeral_public.serialize_uncompressed()),
        iv: hex::encode(sealed.iv),
        auth_tag: hex::encode(sealed.auth_tag),
        encrypted: hex::encode(sealed.ciphertext),
    })
}

pub fn decrypt_with_private_key(payload: &EncryptedPayload, private_key: &str) -> Result<Vec<u8>> {
    payload.validate()?;

    let secret_key = parse_secret_key(private_key)
        .map_err(|e| CryptoError::Decryption(format!("Invalid private key: {}", e)))?;
    let ephemeral = parse_public_key(&payload.ephemeral_public_key)
        .map_err(|e| CryptoError::Decryption(format!("Invalid ephemeral public key: {}", e)))?;
    let iv = decode_field("iv", &payload.iv)?;
    let auth_tag = decode_field("authTag", &payload.auth_tag)?;
    let ciphertext = decode_field("encrypted", &payload.encrypted)?;

    let shared = Zeroizing::new(ecdh::shared_secret_point(&ephemeral, &secret_key));
    let key = symmetric_key_from_secret(shared.as_slice())?;

    open(key.as_slice(), &iv, &ciphertext, &auth_tag)
}

/// Take exactly the low 32 bytes of a shared secret as the AES key
pub(crate) fn symmetric_key_from_secret(shared: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if shared.len() < KEY_LEN {
        return Err(CryptoError::Decryption(format!(
            "Shared secret too short: expected at least {} bytes, got {}",
            KEY_LEN,
            shared.len()
        )));
    }
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&shared[..KEY_LEN]);
    Ok(key)
}

pub(crate) fn random_secret_key() -> SecretKey {
    let mut rng = rand::thread_rng();
    let mut bytes = Zeroizing::new([0u8; 32]);
    // Out-of-range scalars are astronomically rare; draw again if one shows up
    loop {
        rng.fill_bytes(&mut bytes[..]);
        if let Ok(secret_key) = SecretKey::from_slice(bytes.as_slice()) {
            return secret_key;
        }
    }
}

pub(crate) fn parse_secret_key(value: &str) -> Result<SecretKey> {
    let bytes = Zeroizing::new(
        decode_hex(value).map_err(|e| CryptoError::InvalidKey(format!("bad hex: {}", e)))?,
    );
    SecretKey::from_slice(&bytes).map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

pub(crate) fn parse_public_key(value: &str) -> Result<PublicKey> {
    let bytes = decode_hex(value).map_err(|e| CryptoError::InvalidKey(format!("bad hex: {}", e)))?;
    PublicKey::from_slice(&bytes).map_err(|e| CryptoError::InvalidKey(e.to_string()))
}
