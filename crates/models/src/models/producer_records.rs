use crate::models;
use serde::{Deserialize, Serialize};

/// RecordSummary : A record as stored on the ledger
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    #[serde(rename = "recordId")]
    pub record_id: String,
    #[serde(rename = "ownerDid")]
    pub owner_did: String,
    #[serde(rename = "producer")]
    pub producer: String,
    #[serde(rename = "signature")]
    pub signature: String,
    #[serde(rename = "resourceType")]
    pub resource_type: String,
    #[serde(rename = "consent")]
    pub consent: String,
    #[serde(rename = "status")]
    pub status: String,
    #[serde(rename = "metadata")]
    pub metadata: Box<models::RecordMetadata>,
    /// Unix seconds
    #[serde(rename = "updatedAt")]
    pub updated_at: u64,
}

impl RecordSummary {
    /// A record as stored on the ledger
    pub fn new(
        record_id: String,
        owner_did: String,
        producer: String,
        signature: String,
        resource_type: String,
        consent: String,
        status: String,
        metadata: models::RecordMetadata,
        updated_at: u64,
    ) -> RecordSummary {
        RecordSummary {
            record_id,
            owner_did,
            producer,
            signature,
            resource_type,
            consent,
            status,
            metadata: Box::new(metadata),
            updated_at,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProducerRecordsResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "producer")]
    pub producer: String,
    /// Empty when the producer has no records
    #[serde(rename = "records")]
    pub records: Vec<models::RecordSummary>,
}

impl ProducerRecordsResponse {
    pub fn new(producer: String, records: Vec<models::RecordSummary>) -> ProducerRecordsResponse {
        ProducerRecordsResponse {
            success: true,
            producer,
            records,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "record")]
    pub record: Box<models::RecordSummary>,
}

impl RecordResponse {
    pub fn new(record: models::RecordSummary) -> RecordResponse {
        RecordResponse {
            success: true,
            record: Box::new(record),
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProducerStatusResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "producer")]
    pub producer: String,
    #[serde(rename = "registered")]
    pub registered: bool,
    #[serde(rename = "status")]
    pub status: String,
    #[serde(rename = "consent")]
    pub consent: String,
    #[serde(rename = "nonce")]
    pub nonce: u64,
    #[serde(rename = "recordCount")]
    pub record_count: u64,
}

impl ProducerStatusResponse {
    pub fn new(producer: String, registered: bool, status: String, consent: String, nonce: u64, record_count: u64) -> ProducerStatusResponse {
        ProducerStatusResponse {
            success: true,
            producer,
            registered,
            status,
            consent,
            nonce,
            record_count,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordsCountResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "count")]
    pub count: u64,
}

impl RecordsCountResponse {
    pub fn new(count: u64) -> RecordsCountResponse {
        RecordsCountResponse { success: true, count }
    }
}
