use serde::{Deserialize, Serialize};

/// Consent for a provider to use a producer's data. On-chain codes: Pending 0, Allowed 1, Denied 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConsentStatus {
    #[default]
    Pending,
    Allowed,
    Denied,
}

impl ConsentStatus {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ConsentStatus::Pending),
            1 => Some(ConsentStatus::Allowed),
            2 => Some(ConsentStatus::Denied),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ConsentStatus::Pending => 0,
            ConsentStatus::Allowed => 1,
            ConsentStatus::Denied => 2,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pending" => Some(ConsentStatus::Pending),
            "allowed" => Some(ConsentStatus::Allowed),
            "denied" => Some(ConsentStatus::Denied),
            _ => None,
        }
    }
}

/// Record lifecycle. Records are never removed; they move to `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Error,
}

impl RecordStatus {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RecordStatus::Active),
            1 => Some(RecordStatus::Inactive),
            2 => Some(RecordStatus::Suspended),
            3 => Some(RecordStatus::Error),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            RecordStatus::Active => 0,
            RecordStatus::Inactive => 1,
            RecordStatus::Suspended => 2,
            RecordStatus::Error => 3,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "active" => Some(RecordStatus::Active),
            "inactive" => Some(RecordStatus::Inactive),
            "suspended" => Some(RecordStatus::Suspended),
            "error" => Some(RecordStatus::Error),
            _ => None,
        }
    }
}

/// Pointer to an encrypted payload in the content store. Replaced, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub url: String,
    pub cid: String,
    /// Hex SHA-256 of the plaintext
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub record_id: String,
    pub owner_did: String,
    pub producer: String,
    pub signature: String,
    pub resource_type: String,
    pub consent: ConsentStatus,
    pub status: RecordStatus,
    pub metadata: Metadata,
    /// Unix seconds of the last write
    pub updated_at: u64,
}

/// Write parameters for anchoring a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRecord {
    pub owner_did: String,
    pub record_id: String,
    pub producer: String,
    pub signature: String,
    pub resource_type: String,
    pub consent: ConsentStatus,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerRecordStatus {
    pub producer: String,
    pub registered: bool,
    pub status: RecordStatus,
    pub consent: ConsentStatus,
    pub nonce: u64,
    pub record_count: u64,
}

impl ProducerRecordStatus {
    /// What an address with nothing on the ledger looks like
    pub fn unregistered(producer: &str) -> Self {
        Self {
            producer: producer.to_string(),
            registered: false,
            status: RecordStatus::Inactive,
            consent: ConsentStatus::Pending,
            nonce: 0,
            record_count: 0,
        }
    }
}

/// Time-bounded authorization for (producer, provider, purpose)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consent {
    pub producer_did: String,
    pub provider_did: String,
    pub purpose: String,
    pub status: ConsentStatus,
    /// Unix seconds
    pub expires_at: u64,
}

impl Consent {
    /// An expired `Allowed` consent counts as `Denied`
    pub fn effective_status(&self, now: u64) -> ConsentStatus {
        match self.status {
            ConsentStatus::Allowed if now >= self.expires_at => ConsentStatus::Denied,
            status => status,
        }
    }

    pub fn is_granted(&self, now: u64) -> bool {
        self.effective_status(now) == ConsentStatus::Allowed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub block_number: Option<u64>,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub producer: String,
    pub consumer: String,
    pub record_id: String,
    /// Same key, same share: repeats never write twice
    pub idempotency_key: String,
}

impl ShareRequest {
    pub fn new(producer: &str, consumer: &str, record_id: &str, idempotency_key: Option<&str>) -> Self {
        let mut request = Self {
            producer: producer.to_string(),
            consumer: consumer.to_string(),
            record_id: record_id.to_string(),
            idempotency_key: String::new(),
        };
        request.idempotency_key = match idempotency_key {
            Some(key) if !key.trim().is_empty() => key.to_string(),
            _ => request.fingerprint(),
        };
        request
    }

    /// What the share is about. A key stays bound to the first fingerprint it was used with.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}:{}:{}",
            self.producer.to_lowercase(),
            self.consumer.to_lowercase(),
            self.record_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared { receipt: TxReceipt, replayed: bool },
    PaymentNotVerified,
}
