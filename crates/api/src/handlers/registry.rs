use crypto::{Envelope, hash_data};
use ledger::{ConsentStatus, Metadata, Record, RegisterRecord};
use models::models::{
    ProducerRecordsResponse, ProducerStatusResponse, RecordData, RecordMetadata, RecordResponse,
    RecordsCountResponse, RegisterRecordRequest, RegisterRecordResponse, RetrieveRecordRequest,
    RetrieveRecordResponse, TransactionResponse, UpdateRecordStatusRequest,
};
use serde_json::Value;
use std::fmt;
use tracing::{debug, error, info, warn};

use super::{
    consent_status, name_of, now, plaintext_value, record_status, record_summary, require_address,
    require_text, transaction_info,
};
use crate::did::{Role, require_role};
use crate::{ApiError, AppState};

/// Where a registration is. `Failed` can follow any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Encrypted,
    Uploaded,
    Signed,
    Anchored,
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn string_field(data: &Value, name: &str) -> Option<String> {
    data.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Encrypt, pin, sign and anchor one record
pub async fn register_record(
    state: &AppState,
    request: RegisterRecordRequest,
) -> Result<RegisterRecordResponse, ApiError> {
    let mut stage = Stage::Received;
    let result = run_registration(state, request, &mut stage).await;
    if let Err(e) = &result {
        error!(stage = %stage, "Registration failed after {}: {}", stage, e);
    }
    result
}

async fn run_registration(
    state: &AppState,
    request: RegisterRecordRequest,
    stage: &mut Stage,
) -> Result<RegisterRecordResponse, ApiError> {
    require_role("ownerDid", &request.owner_did, Role::Producer)?;
    let producer = require_address("producer", &request.producer)?;
    let consent = consent_status(&request.consent)?;
    if !request.data.is_object() {
        return Err(ApiError::Validation("data must be a JSON object".to_string()));
    }
    let record_id = request
        .record_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .or_else(|| string_field(&request.data, "id"))
        .ok_or_else(|| ApiError::Validation("recordId is required (or data.id)".to_string()))?;
    let resource_type = request
        .resource_type
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| string_field(&request.data, "resourceType"))
        .ok_or_else(|| ApiError::Validation("resourceType is required (or data.resourceType)".to_string()))?;
    info!(record_id = %record_id, stage = %stage, "Registering record for {}", producer);

    let plaintext = serde_json::to_vec(&request.data)?;
    let envelope = match request.recipient_public_key.as_deref() {
        Some(public_key) if !public_key.trim().is_empty() => Envelope::seal_for(&plaintext, public_key)?,
        _ => Envelope::seal_with(&plaintext, &state.symmetric_key)?,
    };
    *stage = Stage::Encrypted;
    debug!(record_id = %record_id, stage = %stage, "Sealed with {}", envelope.scheme());

    // Serialized once: these bytes are the ones the CID names
    let bytes = envelope.to_bytes()?;
    let pinned = state.store.upload(&bytes, &format!("{}.json", record_id)).await?;
    *stage = Stage::Uploaded;
    info!(record_id = %record_id, stage = %stage, "Pinned as {}", pinned.ipfs_hash);

    let digest = hash_data(&request.data)?;
    let content_hash = hex::encode(digest);
    let signature = state.wallet.sign_hash(&digest)?;
    *stage = Stage::Signed;
    debug!(record_id = %record_id, stage = %stage, "Content hash {}", content_hash);

    let metadata = Metadata {
        url: state.store.gateway_url(&pinned.ipfs_hash),
        cid: pinned.ipfs_hash.clone(),
        content_hash,
    };
    let anchor = RegisterRecord {
        owner_did: request.owner_did.clone(),
        record_id: record_id.clone(),
        producer: producer.clone(),
        signature: signature.clone(),
        resource_type: resource_type.clone(),
        consent,
        metadata: metadata.clone(),
    };
    let receipt = match state.ledger.register_producer_record(anchor).await {
        Ok(receipt) => receipt,
        Err(e) => {
            release_orphan(state, &pinned.ipfs_hash, pinned.is_duplicate).await;
            return Err(e.into());
        }
    };
    *stage = Stage::Anchored;
    info!(record_id = %record_id, stage = %stage, "Anchored in {}", receipt.transaction_hash);

    let response = RegisterRecordResponse::new(
        RecordData::new(
            record_id.clone(),
            request.owner_did,
            producer,
            resource_type,
            name_of(consent),
            signature,
        ),
        RecordMetadata::new(metadata.url, metadata.cid, metadata.content_hash),
        transaction_info(receipt),
    );
    *stage = Stage::Responded;
    info!(record_id = %record_id, stage = %stage, "Registration complete");
    Ok(response)
}

/// Best-effort unpin of content whose anchor failed. Duplicates belong to someone else.
async fn release_orphan(state: &AppState, cid: &str, is_duplicate: bool) {
    if !state.config.unpin_on_anchor_failure || is_duplicate {
        warn!("Anchor failed; leaving {} pinned", cid);
        return;
    }
    match state.store.unpin(cid).await {
        Ok(()) => info!("Anchor failed; unpinned {}", cid),
        Err(e) => warn!("Anchor failed and unpin of {} also failed: {}", cid, e),
    }
}

pub async fn producer_records(state: &AppState, producer: &str) -> Result<ProducerRecordsResponse, ApiError> {
    let producer = require_address("producer", producer)?;
    let records = state.ledger.get_producer_records(&producer).await?;
    info!("Found {} records for {}", records.len(), producer);
    Ok(ProducerRecordsResponse::new(
        producer,
        records.into_iter().map(record_summary).collect(),
    ))
}

pub async fn producer_record(state: &AppState, producer: &str, record_id: &str) -> Result<RecordResponse, ApiError> {
    let producer = require_address("producer", producer)?;
    let record = state
        .ledger
        .get_producer_record(&producer, record_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Record {} not found for {}", record_id, producer)))?;
    Ok(RecordResponse::new(record_summary(record)))
}

pub async fn producer_record_status(state: &AppState, producer: &str) -> Result<ProducerStatusResponse, ApiError> {
    let producer = require_address("producer", producer)?;
    let status = state.ledger.get_producer_record_status(&producer).await?;
    Ok(ProducerStatusResponse::new(
        status.producer,
        status.registered,
        name_of(status.status),
        name_of(status.consent),
        status.nonce,
        status.record_count,
    ))
}

/// Records are never deleted; retiring one moves it to `Inactive`
pub async fn update_record_status(
    state: &AppState,
    request: UpdateRecordStatusRequest,
) -> Result<TransactionResponse, ApiError> {
    let producer = require_address("producer", &request.producer)?;
    require_text("recordId", &request.record_id)?;
    let status = record_status(&request.status)?;

    if state
        .ledger
        .get_producer_record(&producer, &request.record_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "Record {} not found for {}",
            request.record_id, producer
        )));
    }
    let receipt = state
        .ledger
        .update_producer_record_status(&producer, &request.record_id, status)
        .await?;
    info!("Record {} is now {:?}", request.record_id, status);
    Ok(TransactionResponse::new(transaction_info(receipt)))
}

/// Ledger lookup, caller check, content-store fetch by CID, then decrypt
pub async fn retrieve_record(
    state: &AppState,
    request: RetrieveRecordRequest,
) -> Result<RetrieveRecordResponse, ApiError> {
    let producer = require_address("producer", &request.producer)?;
    require_text("recordId", &request.record_id)?;

    let record = state
        .ledger
        .get_producer_record(&producer, &request.record_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Record {} not found for {}", request.record_id, producer)))?;

    authorize_reader(state, &request, &record).await?;

    let bytes = state.store.fetch(&record.metadata.cid).await?;
    let envelope = Envelope::from_bytes(&bytes)?;
    let plaintext = envelope.open(request.private_key.as_deref(), Some(&state.symmetric_key))?;
    let data = plaintext_value(plaintext)?;

    let verified = crypto::hash_hex(&data)
        .map(|hash| hash == record.metadata.content_hash)
        .unwrap_or(false);
    if !verified {
        warn!("Record {} does not match its anchored hash", record.record_id);
    }
    info!("Retrieved record {} from {}", record.record_id, record.metadata.cid);
    Ok(RetrieveRecordResponse::new(
        record.record_id,
        record.metadata.cid,
        data,
        verified,
    ))
}

/// Owners read their own records. A provider needs the record's consent
/// not to be `Denied` and a live grant for the stated purpose.
async fn authorize_reader(state: &AppState, request: &RetrieveRecordRequest, record: &Record) -> Result<(), ApiError> {
    if let Some(owner_did) = request.owner_did.as_deref() {
        require_role("ownerDid", owner_did, Role::Producer)?;
        if owner_did.trim() != record.owner_did {
            warn!("{} is not the owner of {}", owner_did, record.record_id);
            return Err(ApiError::Auth(format!("{} does not own record {}", owner_did, record.record_id)));
        }
        return Ok(());
    }

    let Some(provider_did) = request.provider_did.as_deref() else {
        return Err(ApiError::Auth(
            "ownerDid, or providerDid with purpose, is required to retrieve a record".to_string(),
        ));
    };
    require_role("providerDid", provider_did, Role::Provider)?;
    let purpose = request.purpose.as_deref().unwrap_or_default();
    require_text("purpose", purpose)?;

    if record.consent == ConsentStatus::Denied {
        warn!("Record {} is not shared: producer denied consent", record.record_id);
        return Err(ApiError::Auth(format!("Consent denied for record {}", record.record_id)));
    }
    let granted = state
        .ledger
        .get_consent(&record.owner_did, provider_did, purpose)
        .await?
        .is_some_and(|consent| consent.is_granted(now()));
    if !granted {
        warn!("No live consent for {} on {}", provider_did, record.record_id);
        return Err(ApiError::Auth(format!(
            "Consent not granted to {} for {}",
            provider_did, purpose
        )));
    }
    Ok(())
}

pub async fn records_count(state: &AppState) -> Result<RecordsCountResponse, ApiError> {
    Ok(RecordsCountResponse::new(state.ledger.get_total_records_count().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{PRODUCER, state};
    use models::models::StatusValue;
    use serde_json::json;

    fn registration(record_id: &str) -> RegisterRecordRequest {
        RegisterRecordRequest::new(
            "did:ledup:producer:1".to_string(),
            PRODUCER.to_string(),
            StatusValue::Code(1),
            json!({"id": record_id, "resourceType": "Patient", "name": "Jane"}),
        )
    }

    fn owner_retrieval(record_id: &str) -> RetrieveRecordRequest {
        let mut request = RetrieveRecordRequest::new(PRODUCER.to_string(), record_id.to_string());
        request.owner_did = Some("did:ledup:producer:1".to_string());
        request
    }

    #[tokio::test]
    async fn test_register_then_retrieve() {
        let (state, store, _) = state();
        let response = register_record(&state, registration("r1")).await.unwrap();
        assert!(response.success);
        assert_eq!(response.record_data.record_id, "r1");
        assert_eq!(response.record_data.resource_type, "Patient");
        assert_eq!(response.record_data.consent, "Allowed");
        assert!(store.contains(&response.metadata.cid).await);

        // The anchored signature recovers to the service wallet
        let digest = hash_data(&json!({"id": "r1", "resourceType": "Patient", "name": "Jane"})).unwrap();
        let signer = crypto::recover_signer(&digest, &response.record_data.signature).unwrap();
        assert_eq!(signer, state.wallet.address());

        let retrieved = retrieve_record(&state, owner_retrieval("r1")).await.unwrap();
        assert_eq!(retrieved.data["name"], "Jane");
        assert!(retrieved.verified);
    }

    #[tokio::test]
    async fn test_register_to_public_key() {
        let (state, _, _) = state();
        let pair = crypto::generate_key_pair();
        let mut request = registration("r2");
        request.recipient_public_key = Some(pair.public_key.clone());
        register_record(&state, request).await.unwrap();

        let mut retrieve = owner_retrieval("r2");
        assert!(matches!(
            retrieve_record(&state, retrieve.clone()).await,
            Err(ApiError::Decryption(_))
        ));
        retrieve.private_key = Some(pair.private_key);
        let retrieved = retrieve_record(&state, retrieve).await.unwrap();
        assert_eq!(retrieved.data["id"], "r2");
    }

    #[tokio::test]
    async fn test_anchor_failure_unpins_upload() {
        let (state, store, ledger) = state();
        ledger.reject_writes(Some("execution reverted: unauthorized")).await;

        let err = register_record(&state, registration("r1")).await.unwrap_err();
        assert!(matches!(err, ApiError::ChainWrite(ref msg) if msg.contains("unauthorized")));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_anchor_failure_keeps_duplicate_pin() {
        let (state, store, ledger) = state();
        let envelope_bytes = b"someone else's content";
        let existing = ipfs::ContentStore::upload(store.as_ref(), envelope_bytes, "other").await.unwrap();
        ledger.reject_writes(Some("execution reverted")).await;

        release_orphan(&state, &existing.ipfs_hash, true).await;
        assert!(store.contains(&existing.ipfs_hash).await);
    }

    #[tokio::test]
    async fn test_registration_validation() {
        let (state, _, _) = state();

        let mut request = registration("r1");
        request.data = json!({"resourceType": "Patient"});
        assert!(matches!(register_record(&state, request).await, Err(ApiError::Validation(_))));

        let mut request = registration("r1");
        request.owner_did = "did:ledup:provider:1".to_string();
        assert!(matches!(register_record(&state, request).await, Err(ApiError::Auth(_))));

        let mut request = registration("r1");
        request.producer = "0xabc".to_string();
        assert!(matches!(register_record(&state, request).await, Err(ApiError::Validation(_))));

        let mut request = registration("r1");
        request.consent = StatusValue::Code(9);
        assert!(matches!(register_record(&state, request).await, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_producer_has_no_records() {
        let (state, _, _) = state();
        let response = producer_records(&state, PRODUCER).await.unwrap();
        assert!(response.records.is_empty());
        let status = producer_record_status(&state, PRODUCER).await.unwrap();
        assert!(!status.registered);
        assert!(matches!(
            producer_record(&state, PRODUCER, "missing").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_status_update_keeps_record() {
        let (state, _, _) = state();
        register_record(&state, registration("r1")).await.unwrap();
        let request = UpdateRecordStatusRequest::new(
            PRODUCER.to_string(),
            "r1".to_string(),
            StatusValue::Name("Inactive".to_string()),
        );
        update_record_status(&state, request).await.unwrap();

        let record = producer_record(&state, PRODUCER, "r1").await.unwrap();
        assert_eq!(record.record.status, "Inactive");
        assert_eq!(records_count(&state).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_retrieve_requires_live_consent_for_provider() {
        let (state, _, ledger) = state();
        register_record(&state, registration("r1")).await.unwrap();

        let mut request = RetrieveRecordRequest::new(PRODUCER.to_string(), "r1".to_string());
        request.provider_did = Some("did:ledup:provider:7".to_string());
        request.purpose = Some("research".to_string());
        assert!(matches!(
            retrieve_record(&state, request.clone()).await,
            Err(ApiError::Auth(_))
        ));

        // Granted but already expired
        let expired = ledger::Consent {
            producer_did: "did:ledup:producer:1".to_string(),
            provider_did: "did:ledup:provider:7".to_string(),
            purpose: "research".to_string(),
            status: ledger::ConsentStatus::Allowed,
            expires_at: 1,
        };
        ledger::Ledger::update_consent(ledger.as_ref(), expired.clone()).await.unwrap();
        assert!(matches!(
            retrieve_record(&state, request.clone()).await,
            Err(ApiError::Auth(_))
        ));

        let live = ledger::Consent {
            expires_at: now() + 3600,
            ..expired
        };
        ledger::Ledger::update_consent(ledger.as_ref(), live).await.unwrap();
        assert!(retrieve_record(&state, request).await.is_ok());
    }

    #[tokio::test]
    async fn test_retrieve_requires_caller_identity() {
        let (state, _, ledger) = state();
        let mut request = registration("r1");
        request.consent = StatusValue::Code(2);
        request.data = json!({"id": "r1", "resourceType": "Patient", "diagnosis": "secret"});
        register_record(&state, request).await.unwrap();

        let anonymous = RetrieveRecordRequest::new(PRODUCER.to_string(), "r1".to_string());
        assert!(matches!(retrieve_record(&state, anonymous).await, Err(ApiError::Auth(_))));

        let mut impostor = owner_retrieval("r1");
        impostor.owner_did = Some("did:ledup:producer:2".to_string());
        assert!(matches!(retrieve_record(&state, impostor).await, Err(ApiError::Auth(_))));

        // A denied record stays closed even with a live grant
        ledger::Ledger::update_consent(
            ledger.as_ref(),
            ledger::Consent {
                producer_did: "did:ledup:producer:1".to_string(),
                provider_did: "did:ledup:provider:7".to_string(),
                purpose: "research".to_string(),
                status: ledger::ConsentStatus::Allowed,
                expires_at: now() + 3600,
            },
        )
        .await
        .unwrap();
        let mut provider = RetrieveRecordRequest::new(PRODUCER.to_string(), "r1".to_string());
        provider.provider_did = Some("did:ledup:provider:7".to_string());
        provider.purpose = Some("research".to_string());
        assert!(matches!(retrieve_record(&state, provider).await, Err(ApiError::Auth(_))));

        let retrieved = retrieve_record(&state, owner_retrieval("r1")).await.unwrap();
        assert_eq!(retrieved.data["diagnosis"], "secret");
    }
}
