use ledger::{Consent, ConsentStatus};
use models::models::{ConsentRequest, ConsentResponse, TransactionResponse};
use tracing::info;

use super::{consent_status, name_of, now, require_text, transaction_info};
use crate::did::{Role, require_role};
use crate::{ApiError, AppState};

pub async fn update_consent(state: &AppState, request: ConsentRequest) -> Result<TransactionResponse, ApiError> {
    require_role("producerDid", &request.producer_did, Role::Producer)?;
    require_role("providerDid", &request.provider_did, Role::Provider)?;
    require_text("purpose", &request.purpose)?;
    let status = consent_status(&request.status)?;
    if status == ConsentStatus::Allowed && request.expires_at <= now() {
        return Err(ApiError::Validation("expiresAt must be in the future".to_string()));
    }

    let receipt = state
        .ledger
        .update_consent(Consent {
            producer_did: request.producer_did.clone(),
            provider_did: request.provider_did.clone(),
            purpose: request.purpose.clone(),
            status,
            expires_at: request.expires_at,
        })
        .await?;
    info!(
        "Consent for {} to {} ({}) set to {:?}",
        request.producer_did, request.provider_did, request.purpose, status
    );
    Ok(TransactionResponse::new(transaction_info(receipt)))
}

/// Reports the effective status; nothing recorded reads as Pending
pub async fn get_consent(
    state: &AppState,
    producer_did: &str,
    provider_did: &str,
    purpose: &str,
) -> Result<ConsentResponse, ApiError> {
    let consent = state.ledger.get_consent(producer_did, provider_did, purpose).await?;
    let now = now();
    let (status, expires_at, granted) = match &consent {
        Some(consent) => (
            consent.effective_status(now),
            Some(consent.expires_at),
            consent.is_granted(now),
        ),
        None => (ConsentStatus::Pending, None, false),
    };
    let mut response = ConsentResponse::new(
        producer_did.to_string(),
        provider_did.to_string(),
        purpose.to_string(),
        name_of(status),
        granted,
    );
    response.expires_at = expires_at;
    Ok(response)
}
