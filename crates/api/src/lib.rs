use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

// Module declarations
pub mod config;
pub mod did;
pub mod error;
pub mod handlers;
pub mod request;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, status_for_code};
pub use models::models::ErrorResponse;
pub use request::{HttpRequest, Request};
pub use state::AppState;

use handlers::{consent, encryption, registry, sharing, storage};

/// Header carrying the shared API key
pub const API_KEY_HEADER: &str = "x-api-key";

fn authorize(state: &AppState, http: &HttpRequest) -> Result<(), ApiError> {
    let Some(expected) = state.config.api_key.as_deref() else {
        return Ok(());
    };
    match http.header(API_KEY_HEADER) {
        Some(given) if bool::from(given.as_bytes().ct_eq(expected.as_bytes())) => Ok(()),
        Some(_) => Err(ApiError::Auth("Invalid API key".to_string())),
        None => Err(ApiError::Auth(format!("Missing {} header", API_KEY_HEADER))),
    }
}

/// Route one request and return the JSON response body
pub async fn process_request_async(state: &AppState, http: &HttpRequest) -> Result<String, ApiError> {
    debug!("Processing {} {}", http.method, http.path);
    authorize(state, http).inspect_err(|e| warn!("Rejected {} {}: {}", http.method, http.path, e))?;

    let request = Request::parse(http)?;
    let name = request.name();
    let json = match request {
        Request::RegisterRecord(body) => serde_json::to_string(&registry::register_record(state, body).await?)?,
        Request::ProducerRecords { producer } => {
            serde_json::to_string(&registry::producer_records(state, &producer).await?)?
        }
        Request::ProducerRecord { producer, record_id } => {
            serde_json::to_string(&registry::producer_record(state, &producer, &record_id).await?)?
        }
        Request::ProducerRecordStatus { producer } => {
            serde_json::to_string(&registry::producer_record_status(state, &producer).await?)?
        }
        Request::UpdateRecordStatus(body) => {
            serde_json::to_string(&registry::update_record_status(state, body).await?)?
        }
        Request::RetrieveRecord(body) => serde_json::to_string(&registry::retrieve_record(state, body).await?)?,
        Request::UpdateConsent(body) => serde_json::to_string(&consent::update_consent(state, body).await?)?,
        Request::GetConsent {
            producer_did,
            provider_did,
            purpose,
        } => serde_json::to_string(
            &consent::get_consent(state, &producer_did, &provider_did, &purpose).await?,
        )?,
        Request::VerifyPayment { record_id } => {
            serde_json::to_string(&sharing::verify_payment(state, &record_id).await?)?
        }
        Request::ShareData(body) => serde_json::to_string(&sharing::share_data(state, body).await?)?,
        Request::RecordsCount => serde_json::to_string(&registry::records_count(state).await?)?,
        Request::GenerateKeyPair => serde_json::to_string(&encryption::generate_key_pair())?,
        Request::Encrypt(body) => serde_json::to_string(&encryption::encrypt(body)?)?,
        Request::Decrypt(body) => serde_json::to_string(&encryption::decrypt(body)?)?,
        Request::Upload(body) => serde_json::to_string(&storage::upload(state, body).await?)?,
        Request::Pins => serde_json::to_string(&storage::pins(state).await?)?,
        Request::Unpin { cid } => serde_json::to_string(&storage::unpin(state, &cid).await?)?,
    };
    info!("{} completed successfully", name);
    Ok(json)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::AppState;
    use crate::config::{Config, LedgerBackend, StorageBackend};
    use ipfs::MemoryStore;
    use ledger::MemoryLedger;
    use std::sync::Arc;

    pub const PRODUCER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
    pub const CONSUMER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
    pub const SIGNER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    pub const ENCRYPTION_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    pub fn config(api_key: Option<&str>) -> Config {
        Config {
            ledger: LedgerBackend::Memory,
            storage: StorageBackend::Memory,
            signer_private_key: SIGNER_KEY.to_string(),
            encryption_key: ENCRYPTION_KEY.to_string(),
            api_key: api_key.map(str::to_string),
            unpin_on_anchor_failure: true,
        }
    }

    pub fn state_with(config: Config) -> (AppState, Arc<MemoryStore>, Arc<MemoryLedger>) {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(MemoryLedger::new());
        let state = AppState::new(config, store.clone(), ledger.clone()).unwrap();
        (state, store, ledger)
    }

    pub fn state() -> (AppState, Arc<MemoryStore>, Arc<MemoryLedger>) {
        state_with(config(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use test_support::{CONSUMER, PRODUCER, config, state, state_with};

    async fn respond(state: &AppState, http: &HttpRequest) -> (u16, String) {
        match process_request_async(state, http).await {
            Ok(body) => (200, body),
            Err(err) => {
                let status = err.status_code();
                let body: ErrorResponse = err.into();
                (status, serde_json::to_string(&body).unwrap())
            }
        }
    }

    fn register_body() -> String {
        json!({
            "ownerDid": "did:ledup:producer:1",
            "producer": PRODUCER,
            "consent": 1,
            "data": {"id": "r1", "resourceType": "Patient"}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_register_record_scenario() {
        let (state, _, _) = state();
        let http = HttpRequest::new("POST", "/data-registry/producer/register-record").with_body(register_body());
        let (status, body) = respond(&state, &http).await;
        assert_eq!(status, 200);

        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["recordData"]["recordId"], "r1");
        assert!(!body["metadata"]["cid"].as_str().unwrap().is_empty());
        assert_eq!(body["metadata"]["contentHash"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_unknown_producer_lists_empty() {
        let (state, _, _) = state();
        let http = HttpRequest::new("GET", "/data-registry/producer/records").with_query("producer", CONSUMER);
        let (status, body) = respond(&state, &http).await;
        assert_eq!(status, 200);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["records"], json!([]));
    }

    #[tokio::test]
    async fn test_unpaid_share_returns_400() {
        let (state, _, ledger) = state();
        let http = HttpRequest::new("POST", "/data-registry/share-data").with_body(
            json!({"producer": PRODUCER, "consumer": CONSUMER, "recordId": "r1"}).to_string(),
        );
        let (status, body) = respond(&state, &http).await;
        assert_eq!(status, 400);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Payment not verified");

        // No share was recorded by the refused call
        ledger.record_payment("r1").await;
        let (status, body) = respond(&state, &http).await;
        assert_eq!(status, 200);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["replayed"], false);
    }

    #[tokio::test]
    async fn test_api_key_enforced() {
        let (state, _, _) = state_with(config(Some("secret")));
        let http = HttpRequest::new("GET", "/data-registry/records/count");
        assert_eq!(respond(&state, &http).await.0, 401);

        let http = http.with_header("X-API-Key", "wrong");
        assert_eq!(respond(&state, &http).await.0, 401);

        // Same length, last byte differs
        let http = http.with_header("x-api-key", "secreT");
        assert_eq!(respond(&state, &http).await.0, 401);

        let http = http.with_header("x-api-key", "secret-and-more");
        assert_eq!(respond(&state, &http).await.0, 401);

        let http = http.with_header("x-api-key", "secret");
        let (status, body) = respond(&state, &http).await;
        assert_eq!(status, 200);
        assert!(body.contains("\"count\":0"));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (state, _, _) = state();
        let unknown = HttpRequest::new("GET", "/nope");
        assert_eq!(respond(&state, &unknown).await.0, 404);

        let malformed = HttpRequest::new("POST", "/encryption/decrypt").with_body("{not json");
        let (status, body) = respond(&state, &malformed).await;
        assert_eq!(status, 400);
        assert!(body.contains("VALIDATION_ERROR"));

        let tampered = HttpRequest::new("POST", "/encryption/decrypt").with_body(
            json!({"encryptedData": {"iv": "00"}, "privateKey": test_support::SIGNER_KEY}).to_string(),
        );
        let (status, body) = respond(&state, &tampered).await;
        assert_eq!(status, 400);
        assert!(body.contains("DECRYPTION_ERROR"));
    }
}
