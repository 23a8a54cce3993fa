use crate::models;
use serde::{Deserialize, Serialize};

/// ConsentRequest : Grant, deny or reset a provider's consent for a purpose
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsentRequest {
    #[serde(rename = "producerDid")]
    pub producer_did: String,
    /// Must carry the provider role
    #[serde(rename = "providerDid")]
    pub provider_did: String,
    #[serde(rename = "purpose")]
    pub purpose: String,
    /// Pending, Allowed or Denied (0..=2)
    #[serde(rename = "status")]
    pub status: models::StatusValue,
    /// Unix seconds
    #[serde(rename = "expiresAt")]
    pub expires_at: u64,
}

impl ConsentRequest {
    /// Grant, deny or reset a provider's consent for a purpose
    pub fn new(producer_did: String, provider_did: String, purpose: String, status: models::StatusValue, expires_at: u64) -> ConsentRequest {
        ConsentRequest {
            producer_did,
            provider_did,
            purpose,
            status,
            expires_at,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsentResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "producerDid")]
    pub producer_did: String,
    #[serde(rename = "providerDid")]
    pub provider_did: String,
    #[serde(rename = "purpose")]
    pub purpose: String,
    /// Effective status: an expired grant reads as Denied
    #[serde(rename = "status")]
    pub status: String,
    #[serde(rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(rename = "granted")]
    pub granted: bool,
}

impl ConsentResponse {
    pub fn new(producer_did: String, provider_did: String, purpose: String, status: String, granted: bool) -> ConsentResponse {
        ConsentResponse {
            success: true,
            producer_did,
            provider_did,
            purpose,
            status,
            expires_at: None,
            granted,
        }
    }
}
