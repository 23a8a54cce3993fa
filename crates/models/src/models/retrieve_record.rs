use crate::models;
use serde::{Deserialize, Serialize};

/// RetrieveRecordRequest : Fetch a record's payload and decrypt it
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrieveRecordRequest {
    #[serde(rename = "producer")]
    pub producer: String,
    #[serde(rename = "recordId")]
    pub record_id: String,
    /// Needed only for payloads encrypted to a public key
    #[serde(rename = "privateKey", skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// The record owner's producer DID. Owners need no consent.
    #[serde(rename = "ownerDid", skip_serializing_if = "Option::is_none")]
    pub owner_did: Option<String>,
    /// A provider must hold a live consent for `purpose`
    #[serde(rename = "providerDid", skip_serializing_if = "Option::is_none")]
    pub provider_did: Option<String>,
    #[serde(rename = "purpose", skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl RetrieveRecordRequest {
    /// Fetch a record's payload and decrypt it
    pub fn new(producer: String, record_id: String) -> RetrieveRecordRequest {
        RetrieveRecordRequest {
            producer,
            record_id,
            private_key: None,
            owner_did: None,
            provider_did: None,
            purpose: None,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrieveRecordResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "recordId")]
    pub record_id: String,
    #[serde(rename = "cid")]
    pub cid: String,
    #[serde(rename = "data")]
    pub data: serde_json::Value,
    /// Whether the decrypted data hashes to the anchored content hash
    #[serde(rename = "verified")]
    pub verified: bool,
}

impl RetrieveRecordResponse {
    pub fn new(record_id: String, cid: String, data: serde_json::Value, verified: bool) -> RetrieveRecordResponse {
        RetrieveRecordResponse {
            success: true,
            record_id,
            cid,
            data,
            verified,
        }
    }
}
