use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::types::{
    Consent, ConsentStatus, ProducerRecordStatus, Record, RecordStatus, RegisterRecord,
    ShareOutcome, ShareRequest, TxReceipt,
};
use crate::{Ledger, LedgerError, Result};

#[derive(Default)]
struct ProducerState {
    nonce: u64,
    status: RecordStatus,
    consent: ConsentStatus,
}

#[derive(Default)]
struct LedgerState {
    block: u64,
    /// Keyed by record id, which is unique across producers
    records: HashMap<String, Record>,
    producers: HashMap<String, ProducerState>,
    consents: HashMap<(String, String, String), Consent>,
    payments: HashSet<String>,
    /// idempotency key -> (request fingerprint, first receipt)
    shares: HashMap<String, (String, TxReceipt)>,
    rejected_writes: Option<String>,
}

impl LedgerState {
    fn next_receipt(&mut self) -> TxReceipt {
        self.block += 1;
        TxReceipt {
            transaction_hash: format!("0x{:064x}", self.block),
            block_number: Some(self.block),
            success: true,
        }
    }

    fn check_writable(&self) -> Result<()> {
        match &self.rejected_writes {
            Some(reason) => Err(LedgerError::Write(reason.clone())),
            None => Ok(()),
        }
    }
}

/// Single-process ledger. Every write takes one lock, so each write is atomic
/// with respect to reads.
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a record as paid for, the way an on-chain payment would
    pub async fn record_payment(&self, record_id: &str) {
        self.state.write().await.payments.insert(record_id.to_string());
        debug!("Payment recorded for {}", record_id);
    }

    /// Make every subsequent write fail with `reason`; `None` restores writes
    pub async fn reject_writes(&self, reason: Option<&str>) {
        self.state.write().await.rejected_writes = reason.map(str::to_string);
    }
}

fn producer_key(producer: &str) -> Result<String> {
    let trimmed = producer.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(LedgerError::InvalidInput(format!("Invalid producer address: {}", producer)));
    }
    Ok(format!("0x{}", hex.to_lowercase()))
}

fn now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn register_producer_record(&self, record: RegisterRecord) -> Result<TxReceipt> {
        let producer = producer_key(&record.producer)?;
        if record.record_id.trim().is_empty() {
            return Err(LedgerError::Write("Record id is empty".to_string()));
        }
        if record.signature.trim().is_empty() {
            return Err(LedgerError::Write("Signature is empty".to_string()));
        }

        let mut state = self.state.write().await;
        state.check_writable()?;

        if let Some(existing) = state.records.get(&record.record_id) {
            if existing.producer != producer {
                warn!("Record {} already belongs to {}", record.record_id, existing.producer);
                return Err(LedgerError::Write(format!(
                    "Record {} already registered by another producer",
                    record.record_id
                )));
            }
        }

        let entry = Record {
            record_id: record.record_id.clone(),
            owner_did: record.owner_did,
            producer: producer.clone(),
            signature: record.signature,
            resource_type: record.resource_type,
            consent: record.consent,
            status: RecordStatus::Active,
            metadata: record.metadata,
            updated_at: now(),
        };
        state.records.insert(record.record_id.clone(), entry);

        let producer_state = state.producers.entry(producer.clone()).or_default();
        producer_state.nonce += 1;
        producer_state.status = RecordStatus::Active;
        producer_state.consent = record.consent;

        let receipt = state.next_receipt();
        info!("Registered record {} for producer {}", record.record_id, producer);
        Ok(receipt)
    }

    async fn get_producer_records(&self, producer: &str) -> Result<Vec<Record>> {
        let producer = producer_key(producer)?;
        let state = self.state.read().await;
        let mut records: Vec<Record> = state
            .records
            .values()
            .filter(|record| record.producer == producer)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.record_id.cmp(&b.record_id));
        Ok(records)
    }

    async fn get_producer_record(&self, producer: &str, record_id: &str) -> Result<Option<Record>> {
        let producer = producer_key(producer)?;
        let state = self.state.read().await;
        Ok(state
            .records
            .get(record_id)
            .filter(|record| record.producer == producer)
            .cloned())
    }

    async fn get_producer_record_status(&self, producer: &str) -> Result<ProducerRecordStatus> {
        let key = producer_key(producer)?;
        let state = self.state.read().await;
        let Some(producer_state) = state.producers.get(&key) else {
            return Ok(ProducerRecordStatus::unregistered(&key));
        };
        let record_count = state.records.values().filter(|r| r.producer == key).count() as u64;
        Ok(ProducerRecordStatus {
            producer: key,
            registered: true,
            status: producer_state.status,
            consent: producer_state.consent,
            nonce: producer_state.nonce,
            record_count,
        })
    }

    async fn update_producer_record_status(
        &self,
        producer: &str,
        record_id: &str,
        status: RecordStatus,
    ) -> Result<TxReceipt> {
        let producer = producer_key(producer)?;
        let mut state = self.state.write().await;
        state.check_writable()?;

        let updated_at = now();
        match state.records.get_mut(record_id) {
            Some(record) if record.producer == producer => {
                record.status = status;
                record.updated_at = updated_at;
            }
            _ => {
                return Err(LedgerError::Write(format!(
                    "Record {} not found for producer {}",
                    record_id, producer
                )));
            }
        }
        if let Some(producer_state) = state.producers.get_mut(&producer) {
            producer_state.nonce += 1;
        }
        Ok(state.next_receipt())
    }

    async fn update_consent(&self, consent: Consent) -> Result<TxReceipt> {
        if consent.producer_did.is_empty() || consent.provider_did.is_empty() {
            return Err(LedgerError::Write("Consent requires both DIDs".to_string()));
        }
        let mut state = self.state.write().await;
        state.check_writable()?;

        let key = (
            consent.producer_did.clone(),
            consent.provider_did.clone(),
            consent.purpose.clone(),
        );
        debug!("Consent {:?} for {:?}", consent.status, key);
        state.consents.insert(key, consent);
        Ok(state.next_receipt())
    }

    async fn get_consent(
        &self,
        producer_did: &str,
        provider_did: &str,
        purpose: &str,
    ) -> Result<Option<Consent>> {
        let key = (producer_did.to_string(), provider_did.to_string(), purpose.to_string());
        Ok(self.state.read().await.consents.get(&key).cloned())
    }

    async fn get_total_records_count(&self) -> Result<u64> {
        Ok(self.state.read().await.records.len() as u64)
    }

    async fn verify_payment(&self, record_id: &str) -> Result<bool> {
        Ok(self.state.read().await.payments.contains(record_id))
    }

    async fn share_data(&self, request: ShareRequest) -> Result<ShareOutcome> {
        producer_key(&request.producer)?;
        producer_key(&request.consumer)?;

        // Payment check and share write happen under one lock
        let mut state = self.state.write().await;
        if let Some((fingerprint, receipt)) = state.shares.get(&request.idempotency_key) {
            if *fingerprint != request.fingerprint() {
                return Err(LedgerError::InvalidInput(format!(
                    "Idempotency key {} was already used for a different share",
                    request.idempotency_key
                )));
            }
            debug!("Share {} already recorded", request.idempotency_key);
            return Ok(ShareOutcome::Shared {
                receipt: receipt.clone(),
                replayed: true,
            });
        }
        if !state.payments.contains(&request.record_id) {
            return Ok(ShareOutcome::PaymentNotVerified);
        }
        state.check_writable()?;

        let receipt = state.next_receipt();
        state
            .shares
            .insert(request.idempotency_key.clone(), (request.fingerprint(), receipt.clone()));
        info!(
            "Shared record {} from {} with {}",
            request.record_id, request.producer, request.consumer
        );
        Ok(ShareOutcome::Shared {
            receipt,
            replayed: false,
        })
    }
}
