use crate::models;
use serde::{Deserialize, Serialize};

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyPairResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "privateKey")]
    pub private_key: String,
    /// Uncompressed SEC1, hex
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

impl KeyPairResponse {
    pub fn new(private_key: String, public_key: String) -> KeyPairResponse {
        KeyPairResponse {
            success: true,
            private_key,
            public_key,
        }
    }
}

/// EncryptedData : ECDH + AES-256-GCM ciphertext, every field hex
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncryptedData {
    #[serde(rename = "ephemeralPublicKey", default)]
    pub ephemeral_public_key: String,
    #[serde(rename = "iv", default)]
    pub iv: String,
    #[serde(rename = "authTag", default)]
    pub auth_tag: String,
    #[serde(rename = "encrypted", default)]
    pub encrypted: String,
}

impl EncryptedData {
    /// ECDH + AES-256-GCM ciphertext, every field hex
    pub fn new(ephemeral_public_key: String, iv: String, auth_tag: String, encrypted: String) -> EncryptedData {
        EncryptedData {
            ephemeral_public_key,
            iv,
            auth_tag,
            encrypted,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncryptRequest {
    /// A string is encrypted as-is, anything else as its JSON text
    #[serde(rename = "data")]
    pub data: serde_json::Value,
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

impl EncryptRequest {
    pub fn new(data: serde_json::Value, public_key: String) -> EncryptRequest {
        EncryptRequest { data, public_key }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncryptResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "encryptedData")]
    pub encrypted_data: Box<models::EncryptedData>,
}

impl EncryptResponse {
    pub fn new(encrypted_data: models::EncryptedData) -> EncryptResponse {
        EncryptResponse {
            success: true,
            encrypted_data: Box::new(encrypted_data),
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecryptRequest {
    #[serde(rename = "encryptedData")]
    pub encrypted_data: Box<models::EncryptedData>,
    #[serde(rename = "privateKey")]
    pub private_key: String,
}

impl DecryptRequest {
    pub fn new(encrypted_data: models::EncryptedData, private_key: String) -> DecryptRequest {
        DecryptRequest {
            encrypted_data: Box::new(encrypted_data),
            private_key,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecryptResponse {
    #[serde(rename = "success")]
    pub success: bool,
    /// Parsed JSON when the plaintext is JSON, otherwise a string
    #[serde(rename = "data")]
    pub data: serde_json::Value,
}

impl DecryptResponse {
    pub fn new(data: serde_json::Value) -> DecryptResponse {
        DecryptResponse { success: true, data }
    }
}
