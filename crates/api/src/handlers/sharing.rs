use ledger::{ShareOutcome, ShareRequest};
use models::models::{ShareDataRequest, ShareDataResponse, VerifyPaymentResponse};
use tracing::{info, warn};

use super::{require_address, require_text, transaction_info};
use crate::{ApiError, AppState};

pub async fn verify_payment(state: &AppState, record_id: &str) -> Result<VerifyPaymentResponse, ApiError> {
    let verified = state.ledger.verify_payment(record_id).await?;
    Ok(VerifyPaymentResponse::new(record_id.to_string(), verified))
}

/// Payment is checked first so an unpaid share never reaches a write. The ledger
/// re-checks inside the share itself.
pub async fn share_data(state: &AppState, request: ShareDataRequest) -> Result<ShareDataResponse, ApiError> {
    let producer = require_address("producer", &request.producer)?;
    let consumer = require_address("consumer", &request.consumer)?;
    require_text("recordId", &request.record_id)?;

    if !state.ledger.verify_payment(&request.record_id).await? {
        warn!("Share of {} refused: payment not verified", request.record_id);
        return Err(ApiError::PaymentNotVerified);
    }

    let share = ShareRequest::new(&producer, &consumer, &request.record_id, request.idempotency_key.as_deref());
    match state.ledger.share_data(share).await? {
        ShareOutcome::Shared { receipt, replayed } => {
            info!(
                "Record {} shared with {} (replayed: {})",
                request.record_id, consumer, replayed
            );
            Ok(ShareDataResponse::new(
                request.record_id,
                replayed,
                transaction_info(receipt),
            ))
        }
        ShareOutcome::PaymentNotVerified => Err(ApiError::PaymentNotVerified),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CONSUMER, PRODUCER, state};

    #[tokio::test]
    async fn test_unpaid_share_is_refused_without_write() {
        let (state, _, ledger) = state();
        let request = ShareDataRequest::new(PRODUCER.to_string(), CONSUMER.to_string(), "r1".to_string());
        assert!(matches!(
            share_data(&state, request.clone()).await,
            Err(ApiError::PaymentNotVerified)
        ));

        // Nothing was written: the first paid share is not a replay
        ledger.record_payment("r1").await;
        let response = share_data(&state, request).await.unwrap();
        assert!(!response.replayed);
    }

    #[tokio::test]
    async fn test_repeat_share_is_replayed() {
        let (state, _, ledger) = state();
        ledger.record_payment("r1").await;
        let mut request = ShareDataRequest::new(PRODUCER.to_string(), CONSUMER.to_string(), "r1".to_string());
        request.idempotency_key = Some("order-1".to_string());

        let first = share_data(&state, request.clone()).await.unwrap();
        let second = share_data(&state, request).await.unwrap();
        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(first.transaction, second.transaction);
    }

    #[tokio::test]
    async fn test_reused_key_for_other_record_is_rejected() {
        let (state, _, ledger) = state();
        ledger.record_payment("r1").await;
        ledger.record_payment("r2").await;
        let mut first = ShareDataRequest::new(PRODUCER.to_string(), CONSUMER.to_string(), "r1".to_string());
        first.idempotency_key = Some("order-1".to_string());
        assert!(!share_data(&state, first).await.unwrap().replayed);

        let mut second = ShareDataRequest::new(PRODUCER.to_string(), CONSUMER.to_string(), "r2".to_string());
        second.idempotency_key = Some("order-1".to_string());
        let err = share_data(&state, second).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_verify_payment() {
        let (state, _, ledger) = state();
        assert!(!verify_payment(&state, "r9").await.unwrap().verified);
        ledger.record_payment("r9").await;
        assert!(verify_payment(&state, "r9").await.unwrap().verified);
    }
}
