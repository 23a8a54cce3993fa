use thiserror::Error;

// Module declarations
pub mod ecies;
pub mod envelope;
pub mod hash;
pub mod symmetric;
pub mod wallet;

// Re-export commonly used types
pub use ecies::{
    EncryptedPayload, KeyPair, decrypt_with_private_key, encrypt, generate_key_pair,
};
pub use envelope::Envelope;
pub use hash::{hash_data, hash_hex, sha256_hex};
pub use symmetric::{SymmetricKey, SymmetricPayload};
pub use wallet::{Wallet, recover_signer};

/// Length of the AES-256 key taken from the ECDH shared secret
pub const KEY_LEN: usize = 32;
/// Length of the GCM authentication tag
pub const TAG_LEN: usize = 16;
/// IV length used for new ciphertexts (96-bit GCM nonce)
pub const IV_LEN: usize = 12;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Failed to hash data: {0}")]
    Hash(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

/// Decode a hex string, accepting an optional `0x` prefix
pub(crate) fn decode_hex(value: &str) -> std::result::Result<Vec<u8>, hex::FromHexError> {
    hex::decode(value.trim().trim_start_matches("0x"))
}
