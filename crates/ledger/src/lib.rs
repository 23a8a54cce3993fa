use async_trait::async_trait;
use thiserror::Error;

// Module declarations
pub mod ethereum;
pub mod memory;
pub mod types;

// Re-export commonly used types
pub use ethereum::EthereumLedger;
pub use memory::MemoryLedger;
pub use types::{
    Consent, ConsentStatus, Metadata, ProducerRecordStatus, Record, RecordStatus,
    RegisterRecord, ShareOutcome, ShareRequest, TxReceipt,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The transaction was rejected; carries the revert reason
    #[error("Ledger write failed: {0}")]
    Write(String),

    #[error("Ledger read failed: {0}")]
    Read(String),

    #[error("Invalid ledger input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Read and write access to the data registry.
///
/// Callers get no cross-request coordination from this trait; concurrent
/// writes for the same record are settled by the ledger itself.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn register_producer_record(&self, record: RegisterRecord) -> Result<TxReceipt>;

    /// Empty for producers with no records
    async fn get_producer_records(&self, producer: &str) -> Result<Vec<Record>>;

    async fn get_producer_record(&self, producer: &str, record_id: &str) -> Result<Option<Record>>;

    async fn get_producer_record_status(&self, producer: &str) -> Result<ProducerRecordStatus>;

    async fn update_producer_record_status(
        &self,
        producer: &str,
        record_id: &str,
        status: RecordStatus,
    ) -> Result<TxReceipt>;

    async fn update_consent(&self, consent: Consent) -> Result<TxReceipt>;

    async fn get_consent(
        &self,
        producer_did: &str,
        provider_did: &str,
        purpose: &str,
    ) -> Result<Option<Consent>>;

    async fn get_total_records_count(&self) -> Result<u64>;

    async fn verify_payment(&self, record_id: &str) -> Result<bool>;

    /// Verify payment and record the share as one ledger-side step
    async fn share_data(&self, request: ShareRequest) -> Result<ShareOutcome>;
}
