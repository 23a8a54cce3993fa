use ledger::{ConsentStatus, Record, RecordStatus, TxReceipt};
use models::models::{RecordMetadata, RecordSummary, StatusValue, TransactionInfo};
use serde_json::Value;

use crate::ApiError;

pub mod consent;
pub mod encryption;
pub mod registry;
pub mod sharing;
pub mod storage;

pub(crate) fn now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

pub(crate) fn consent_status(value: &StatusValue) -> Result<ConsentStatus, ApiError> {
    let status = match value {
        StatusValue::Code(code) => ConsentStatus::from_code(*code),
        StatusValue::Name(name) => ConsentStatus::from_name(name),
    };
    status.ok_or_else(|| ApiError::Validation(format!("Invalid consent status: {}", value)))
}

pub(crate) fn record_status(value: &StatusValue) -> Result<RecordStatus, ApiError> {
    let status = match value {
        StatusValue::Code(code) => RecordStatus::from_code(*code),
        StatusValue::Name(name) => RecordStatus::from_name(name),
    };
    status.ok_or_else(|| ApiError::Validation(format!("Invalid record status: {}", value)))
}

pub(crate) fn name_of<T: std::fmt::Debug>(status: T) -> String {
    format!("{:?}", status)
}

/// Reject anything that is not a 20-byte hex address
pub(crate) fn require_address(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::Validation(format!("{} is not a valid address: {}", field, value)));
    }
    Ok(format!("0x{}", hex.to_lowercase()))
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

pub(crate) fn transaction_info(receipt: TxReceipt) -> TransactionInfo {
    TransactionInfo::new(receipt.transaction_hash, receipt.block_number, receipt.success)
}

pub(crate) fn record_summary(record: Record) -> RecordSummary {
    RecordSummary::new(
        record.record_id,
        record.owner_did,
        record.producer,
        record.signature,
        record.resource_type,
        name_of(record.consent),
        name_of(record.status),
        RecordMetadata::new(record.metadata.url, record.metadata.cid, record.metadata.content_hash),
        record.updated_at,
    )
}

/// JSON when the bytes parse as JSON, a string otherwise
pub(crate) fn plaintext_value(plaintext: Vec<u8>) -> Result<Value, ApiError> {
    if let Ok(value) = serde_json::from_slice::<Value>(&plaintext) {
        return Ok(value);
    }
    String::from_utf8(plaintext)
        .map(Value::String)
        .map_err(|_| ApiError::Decryption("Plaintext is not valid UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_values() {
        assert_eq!(consent_status(&StatusValue::Code(1)).unwrap(), ConsentStatus::Allowed);
        assert_eq!(
            consent_status(&StatusValue::Name("pending".to_string())).unwrap(),
            ConsentStatus::Pending
        );
        assert!(consent_status(&StatusValue::Code(7)).is_err());
        assert_eq!(record_status(&StatusValue::Code(1)).unwrap(), RecordStatus::Inactive);
    }

    #[test]
    fn test_require_address() {
        assert_eq!(
            require_address("producer", "0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert!(require_address("producer", "0xabc").is_err());
    }

    #[test]
    fn test_plaintext_value() {
        assert_eq!(plaintext_value(br#"{"a":1}"#.to_vec()).unwrap(), json!({"a": 1}));
        assert_eq!(plaintext_value(b"hello".to_vec()).unwrap(), json!("hello"));
        assert!(plaintext_value(vec![0xff, 0xfe]).is_err());
    }
}
