use crate::models;
use serde::{Deserialize, Serialize};

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecordStatusRequest {
    #[serde(rename = "producer")]
    pub producer: String,
    #[serde(rename = "recordId")]
    pub record_id: String,
    /// Active, Inactive, Suspended or Error (0..=3)
    #[serde(rename = "status")]
    pub status: models::StatusValue,
}

impl UpdateRecordStatusRequest {
    pub fn new(producer: String, record_id: String, status: models::StatusValue) -> UpdateRecordStatusRequest {
        UpdateRecordStatusRequest {
            producer,
            record_id,
            status,
        }
    }
}

/// TransactionInfo : Receipt of a ledger write
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionInfo {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "blockNumber", skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(rename = "success")]
    pub success: bool,
}

impl TransactionInfo {
    /// Receipt of a ledger write
    pub fn new(transaction_hash: String, block_number: Option<u64>, success: bool) -> TransactionInfo {
        TransactionInfo {
            transaction_hash,
            block_number,
            success,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "transaction")]
    pub transaction: Box<models::TransactionInfo>,
}

impl TransactionResponse {
    pub fn new(transaction: models::TransactionInfo) -> TransactionResponse {
        TransactionResponse {
            success: true,
            transaction: Box::new(transaction),
        }
    }
}
