use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256, U256, keccak256},
    providers::ProviderBuilder,
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;
use std::str::FromStr;
use tracing::{debug, error, info};

use crate::types::{
    Consent, ConsentStatus, Metadata, ProducerRecordStatus, Record, RecordStatus, RegisterRecord,
    ShareOutcome, ShareRequest, TxReceipt,
};
use crate::{Ledger, LedgerError, Result};

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract DataRegistry {
        struct RecordMetadata {
            string url;
            string cid;
            bytes32 contentHash;
        }

        struct ProducerRecord {
            string recordId;
            string ownerDid;
            address producer;
            string signature;
            string resourceType;
            uint8 consent;
            uint8 status;
            RecordMetadata metadata;
            uint256 updatedAt;
        }

        function registerProducerRecord(
            string ownerDid,
            string recordId,
            address producer,
            string signature,
            string resourceType,
            uint8 consent,
            RecordMetadata metadata
        ) external;

        function getProducerRecords(address producer) external view returns (ProducerRecord[] records);

        function getProducerRecord(address producer, string recordId)
            external view returns (bool found, ProducerRecord record);

        function getProducerRecordStatus(address producer)
            external view returns (bool registered, uint8 status, uint8 consent, uint256 nonce, uint256 recordCount);

        function updateProducerRecordStatus(address producer, string recordId, uint8 status) external;

        function updateConsent(
            string producerDid,
            string providerDid,
            string purpose,
            uint8 status,
            uint256 expiresAt
        ) external;

        function getConsent(string producerDid, string providerDid, string purpose)
            external view returns (bool found, uint8 status, uint256 expiresAt);

        function getTotalRecordsCount() external view returns (uint256 count);

        function verifyPayment(string recordId) external view returns (bool verified);

        function isShared(bytes32 shareKey) external view returns (bool shared);

        function shareData(address producer, address consumer, string recordId, bytes32 shareKey) external;
    }
);

/// Revert reasons the registry contract uses for the share call
const PAYMENT_NOT_VERIFIED: &str = "Payment not verified";
const ALREADY_SHARED: &str = "Already shared";

/// Builds a fresh provider for each call, then binds the registry contract to it
macro_rules! registry {
    ($ledger:expr, $provider:ident) => {
        let $provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet($ledger.wallet.clone())
            .on_http(
                $ledger
                    .rpc_url
                    .parse()
                    .map_err(|e| LedgerError::Read(format!("Invalid RPC URL: {}", e)))?,
            );
        let $provider = DataRegistry::new($ledger.registry, &$provider);
    };
}

/// Data registry contract on an EVM chain
pub struct EthereumLedger {
    rpc_url: String,
    registry: Address,
    wallet: EthereumWallet,
    signer_address: Address,
}

impl EthereumLedger {
    pub fn new(rpc_url: &str, registry_address: &str, signer_private_key: &str) -> Result<Self> {
        if !rpc_url.starts_with("http://") && !rpc_url.starts_with("https://") {
            return Err(LedgerError::InvalidInput(format!("Invalid RPC URL: {}", rpc_url)));
        }
        let registry = parse_address(registry_address)?;
        let signer = PrivateKeySigner::from_str(signer_private_key.trim_start_matches("0x"))
            .map_err(|e| LedgerError::InvalidInput(format!("Invalid signer key: {}", e)))?;
        let signer_address = signer.address();
        info!("Ethereum ledger at {} signing as {}", registry, signer_address);

        Ok(Self {
            rpc_url: rpc_url.to_string(),
            registry,
            wallet: EthereumWallet::from(signer),
            signer_address,
        })
    }

    pub fn signer_address(&self) -> String {
        self.signer_address.to_string().to_lowercase()
    }
}

fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim())
        .map_err(|_| LedgerError::InvalidInput(format!("Invalid producer address: {}", value)))
}

fn parse_hash(value: &str) -> Result<B256> {
    B256::from_str(value.trim())
        .map_err(|_| LedgerError::InvalidInput(format!("Invalid content hash: {}", value)))
}

fn to_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn read_err(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Read(e.to_string())
}

fn write_err(e: impl std::fmt::Display) -> LedgerError {
    let message = e.to_string();
    error!("Ledger transaction failed: {}", message);
    LedgerError::Write(message)
}

fn record_from_chain(record: DataRegistry::ProducerRecord) -> Record {
    Record {
        record_id: record.recordId,
        owner_did: record.ownerDid,
        producer: record.producer.to_string().to_lowercase(),
        signature: record.signature,
        resource_type: record.resourceType,
        consent: ConsentStatus::from_code(record.consent).unwrap_or_default(),
        status: RecordStatus::from_code(record.status).unwrap_or(RecordStatus::Error),
        metadata: Metadata {
            url: record.metadata.url,
            cid: record.metadata.cid,
            content_hash: hex::encode(record.metadata.contentHash),
        },
        updated_at: to_u64(record.updatedAt),
    }
}

fn receipt_from_chain(receipt: alloy::rpc::types::TransactionReceipt) -> TxReceipt {
    TxReceipt {
        transaction_hash: format!("{:?}", receipt.transaction_hash),
        block_number: receipt.block_number,
        success: receipt.status(),
    }
}

/// A mined but reverted transaction is a failed write
fn confirmed(receipt: TxReceipt, call: &str, subject: &str) -> Result<TxReceipt> {
    if !receipt.success {
        return Err(LedgerError::Write(format!(
            "{} reverted for {} in {}",
            call, subject, receipt.transaction_hash
        )));
    }
    Ok(receipt)
}

/// 32-byte on-chain key. The preimage binds the idempotency key to the share it names,
/// so reusing a key for another record cannot replay the first share.
pub fn share_key(request: &ShareRequest) -> B256 {
    keccak256(format!("{}|{}", request.idempotency_key, request.fingerprint()).as_bytes())
}

#[async_trait]
impl Ledger for EthereumLedger {
    async fn register_producer_record(&self, record: RegisterRecord) -> Result<TxReceipt> {
        let producer = parse_address(&record.producer)?;
        let metadata = DataRegistry::RecordMetadata {
            url: record.metadata.url,
            cid: record.metadata.cid,
            contentHash: parse_hash(&record.metadata.content_hash)?,
        };
        registry!(self, registry);

        debug!("Sending registerProducerRecord for {}", record.record_id);
        let pending = registry
            .registerProducerRecord(
                record.owner_did,
                record.record_id.clone(),
                producer,
                record.signature,
                record.resource_type,
                record.consent.code(),
                metadata,
            )
            .send()
            .await
            .map_err(write_err)?;
        let receipt = pending.get_receipt().await.map_err(write_err)?;
        let receipt = confirmed(receipt_from_chain(receipt), "registerProducerRecord", &record.record_id)?;
        info!("Anchored record {} in block {:?}", record.record_id, receipt.block_number);
        Ok(receipt)
    }

    async fn get_producer_records(&self, producer: &str) -> Result<Vec<Record>> {
        let producer = parse_address(producer)?;
        registry!(self, registry);
        let result = registry.getProducerRecords(producer).call().await.map_err(read_err)?;
        Ok(result.records.into_iter().map(record_from_chain).collect())
    }

    async fn get_producer_record(&self, producer: &str, record_id: &str) -> Result<Option<Record>> {
        let producer = parse_address(producer)?;
        registry!(self, registry);
        let result = registry
            .getProducerRecord(producer, record_id.to_string())
            .call()
            .await
            .map_err(read_err)?;
        Ok(result.found.then(|| record_from_chain(result.record)))
    }

    async fn get_producer_record_status(&self, producer: &str) -> Result<ProducerRecordStatus> {
        let address = parse_address(producer)?;
        registry!(self, registry);
        let result = registry
            .getProducerRecordStatus(address)
            .call()
            .await
            .map_err(read_err)?;
        let producer = address.to_string().to_lowercase();
        if !result.registered {
            return Ok(ProducerRecordStatus::unregistered(&producer));
        }
        Ok(ProducerRecordStatus {
            producer,
            registered: true,
            status: RecordStatus::from_code(result.status).unwrap_or(RecordStatus::Error),
            consent: ConsentStatus::from_code(result.consent).unwrap_or_default(),
            nonce: to_u64(result.nonce),
            record_count: to_u64(result.recordCount),
        })
    }

    async fn update_producer_record_status(
        &self,
        producer: &str,
        record_id: &str,
        status: RecordStatus,
    ) -> Result<TxReceipt> {
        let producer = parse_address(producer)?;
        registry!(self, registry);
        let receipt = registry
            .updateProducerRecordStatus(producer, record_id.to_string(), status.code())
            .send()
            .await
            .map_err(write_err)?
            .get_receipt()
            .await
            .map_err(write_err)?;
        confirmed(receipt_from_chain(receipt), "updateProducerRecordStatus", record_id)
    }

    async fn update_consent(&self, consent: Consent) -> Result<TxReceipt> {
        let subject = format!("{} -> {}", consent.producer_did, consent.provider_did);
        registry!(self, registry);
        let receipt = registry
            .updateConsent(
                consent.producer_did,
                consent.provider_did,
                consent.purpose,
                consent.status.code(),
                U256::from(consent.expires_at),
            )
            .send()
            .await
            .map_err(write_err)?
            .get_receipt()
            .await
            .map_err(write_err)?;
        confirmed(receipt_from_chain(receipt), "updateConsent", &subject)
    }

    async fn get_consent(
        &self,
        producer_did: &str,
        provider_did: &str,
        purpose: &str,
    ) -> Result<Option<Consent>> {
        registry!(self, registry);
        let result = registry
            .getConsent(producer_did.to_string(), provider_did.to_string(), purpose.to_string())
            .call()
            .await
            .map_err(read_err)?;
        if !result.found {
            return Ok(None);
        }
        Ok(Some(Consent {
            producer_did: producer_did.to_string(),
            provider_did: provider_did.to_string(),
            purpose: purpose.to_string(),
            status: ConsentStatus::from_code(result.status).unwrap_or_default(),
            expires_at: to_u64(result.expiresAt),
        }))
    }

    async fn get_total_records_count(&self) -> Result<u64> {
        registry!(self, registry);
        let result = registry.getTotalRecordsCount().call().await.map_err(read_err)?;
        Ok(to_u64(result.count))
    }

    async fn verify_payment(&self, record_id: &str) -> Result<bool> {
        registry!(self, registry);
        let result = registry
            .verifyPayment(record_id.to_string())
            .call()
            .await
            .map_err(read_err)?;
        Ok(result.verified)
    }

    async fn share_data(&self, request: ShareRequest) -> Result<ShareOutcome> {
        let producer = parse_address(&request.producer)?;
        let consumer = parse_address(&request.consumer)?;
        let key = share_key(&request);
        registry!(self, registry);

        let shared = registry.isShared(key).call().await.map_err(read_err)?;
        if shared.shared {
            debug!("Share {} already on chain", request.idempotency_key);
            return Ok(replayed());
        }

        // The contract checks payment inside shareData and reverts if unpaid
        let pending = match registry
            .shareData(producer, consumer, request.record_id.clone(), key)
            .send()
            .await
        {
            Ok(pending) => pending,
            Err(e) => return share_revert(e.to_string()),
        };
        let receipt = pending.get_receipt().await.map_err(write_err)?;
        let receipt = confirmed(receipt_from_chain(receipt), "shareData", &request.record_id)?;
        info!("Shared record {} in block {:?}", request.record_id, receipt.block_number);
        Ok(ShareOutcome::Shared {
            receipt,
            replayed: false,
        })
    }
}

fn replayed() -> ShareOutcome {
    ShareOutcome::Shared {
        receipt: TxReceipt {
            transaction_hash: String::new(),
            block_number: None,
            success: true,
        },
        replayed: true,
    }
}

fn share_revert(message: String) -> Result<ShareOutcome> {
    if message.contains(PAYMENT_NOT_VERIFIED) {
        Ok(ShareOutcome::PaymentNotVerified)
    } else if message.contains(ALREADY_SHARED) {
        Ok(replayed())
    } else {
        Err(write_err(message))
    }
}
