use crate::models;
use serde::{Deserialize, Serialize};

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShareDataRequest {
    #[serde(rename = "producer")]
    pub producer: String,
    #[serde(rename = "consumer")]
    pub consumer: String,
    #[serde(rename = "recordId")]
    pub record_id: String,
    /// Repeating a request with the same key never shares twice
    #[serde(rename = "idempotencyKey", skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl ShareDataRequest {
    pub fn new(producer: String, consumer: String, record_id: String) -> ShareDataRequest {
        ShareDataRequest {
            producer,
            consumer,
            record_id,
            idempotency_key: None,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShareDataResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "recordId")]
    pub record_id: String,
    /// True when this key had already been shared
    #[serde(rename = "replayed")]
    pub replayed: bool,
    #[serde(rename = "transaction")]
    pub transaction: Box<models::TransactionInfo>,
}

impl ShareDataResponse {
    pub fn new(record_id: String, replayed: bool, transaction: models::TransactionInfo) -> ShareDataResponse {
        ShareDataResponse {
            success: true,
            record_id,
            replayed,
            transaction: Box::new(transaction),
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "recordId")]
    pub record_id: String,
    #[serde(rename = "verified")]
    pub verified: bool,
}

impl VerifyPaymentResponse {
    pub fn new(record_id: String, verified: bool) -> VerifyPaymentResponse {
        VerifyPaymentResponse {
            success: true,
            record_id,
            verified,
        }
    }
}
