use models::models::{PinSummary, PinsResponse, UnpinResponse, UploadRequest, UploadResponse};
use tracing::info;

use crate::{ApiError, AppState};

pub async fn upload(state: &AppState, request: UploadRequest) -> Result<UploadResponse, ApiError> {
    if request.data.is_null() {
        return Err(ApiError::Validation("data is required".to_string()));
    }
    let name = request
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "data.json".to_string());
    let pinned = state.store.upload_json(&request.data, &name).await?;
    let url = state.store.gateway_url(&pinned.ipfs_hash);
    Ok(UploadResponse::new(
        pinned.ipfs_hash,
        url,
        pinned.pin_size,
        pinned.timestamp,
        pinned.is_duplicate,
    ))
}

pub async fn pins(state: &AppState) -> Result<PinsResponse, ApiError> {
    let pins = state.store.fetch_pins().await?;
    Ok(PinsResponse::new(
        pins.into_iter()
            .map(|pin| {
                let mut summary = PinSummary::new(pin.cid, pin.size);
                summary.date_pinned = pin.date_pinned;
                summary.name = pin.metadata.name;
                summary
            })
            .collect(),
    ))
}

pub async fn unpin(state: &AppState, cid: &str) -> Result<UnpinResponse, ApiError> {
    state.store.unpin(cid).await?;
    info!("Unpinned {} on request", cid);
    Ok(UnpinResponse::new(cid.to_string()))
}
