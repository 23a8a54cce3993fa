use crate::models;
use serde::{Deserialize, Serialize};

/// RegisterRecordRequest : Encrypt, pin and anchor one record
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisterRecordRequest {
    /// DID of the data owner, `did:ledup:producer:<id>`
    #[serde(rename = "ownerDid")]
    pub owner_did: String,
    /// Producer's Ethereum address
    #[serde(rename = "producer")]
    pub producer: String,
    #[serde(rename = "consent")]
    pub consent: models::StatusValue,
    /// The record itself; `data.id` is used as the record id
    #[serde(rename = "data")]
    pub data: serde_json::Value,
    /// Overrides `data.id`
    #[serde(rename = "recordId", skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Overrides `data.resourceType`
    #[serde(rename = "resourceType", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Encrypt to this secp256k1 key instead of the service's symmetric key
    #[serde(rename = "recipientPublicKey", skip_serializing_if = "Option::is_none")]
    pub recipient_public_key: Option<String>,
}

impl RegisterRecordRequest {
    /// Encrypt, pin and anchor one record
    pub fn new(owner_did: String, producer: String, consent: models::StatusValue, data: serde_json::Value) -> RegisterRecordRequest {
        RegisterRecordRequest {
            owner_did,
            producer,
            consent,
            data,
            record_id: None,
            resource_type: None,
            recipient_public_key: None,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordData {
    #[serde(rename = "recordId")]
    pub record_id: String,
    #[serde(rename = "ownerDid")]
    pub owner_did: String,
    #[serde(rename = "producer")]
    pub producer: String,
    #[serde(rename = "resourceType")]
    pub resource_type: String,
    #[serde(rename = "consent")]
    pub consent: String,
    /// Service signature over the content hash
    #[serde(rename = "signature")]
    pub signature: String,
}

impl RecordData {
    pub fn new(record_id: String, owner_did: String, producer: String, resource_type: String, consent: String, signature: String) -> RecordData {
        RecordData {
            record_id,
            owner_did,
            producer,
            resource_type,
            consent,
            signature,
        }
    }
}

/// RecordMetadata : Where the encrypted payload lives and what it hashes to
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(rename = "url")]
    pub url: String,
    #[serde(rename = "cid")]
    pub cid: String,
    #[serde(rename = "contentHash")]
    pub content_hash: String,
}

impl RecordMetadata {
    /// Where the encrypted payload lives and what it hashes to
    pub fn new(url: String, cid: String, content_hash: String) -> RecordMetadata {
        RecordMetadata { url, cid, content_hash }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisterRecordResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "recordData")]
    pub record_data: Box<models::RecordData>,
    #[serde(rename = "metadata")]
    pub metadata: Box<models::RecordMetadata>,
    #[serde(rename = "transaction")]
    pub transaction: Box<models::TransactionInfo>,
}

impl RegisterRecordResponse {
    pub fn new(record_data: models::RecordData, metadata: models::RecordMetadata, transaction: models::TransactionInfo) -> RegisterRecordResponse {
        RegisterRecordResponse {
            success: true,
            record_data: Box::new(record_data),
            metadata: Box::new(metadata),
            transaction: Box::new(transaction),
        }
    }
}
