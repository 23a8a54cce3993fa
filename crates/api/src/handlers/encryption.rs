use crypto::EncryptedPayload;
use models::models::{DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, EncryptedData, KeyPairResponse};
use serde_json::Value;
use tracing::debug;

use super::{plaintext_value, require_text};
use crate::ApiError;

pub fn generate_key_pair() -> KeyPairResponse {
    let pair = crypto::generate_key_pair();
    debug!("Generated key pair {}", pair.public_key);
    KeyPairResponse::new(pair.private_key, pair.public_key)
}

pub fn encrypt(request: EncryptRequest) -> Result<EncryptResponse, ApiError> {
    require_text("publicKey", &request.public_key)?;
    let plaintext = match &request.data {
        Value::String(text) => text.as_bytes().to_vec(),
        Value::Null => return Err(ApiError::Validation("data is required".to_string())),
        other => serde_json::to_vec(other)?,
    };
    let payload = crypto::encrypt(&plaintext, &request.public_key)?;
    Ok(EncryptResponse::new(EncryptedData::new(
        payload.ephemeral_public_key,
        payload.iv,
        payload.auth_tag,
        payload.encrypted,
    )))
}

pub fn decrypt(request: DecryptRequest) -> Result<DecryptResponse, ApiError> {
    let data = *request.encrypted_data;
    let payload = EncryptedPayload {
        ephemeral_public_key: data.ephemeral_public_key,
        iv: data.iv,
        auth_tag: data.auth_tag,
        encrypted: data.encrypted,
    };
    let plaintext = crypto::decrypt_with_private_key(&payload, &request.private_key)?;
    Ok(DecryptResponse::new(plaintext_value(plaintext)?))
}
