use crate::models;
use serde::{Deserialize, Serialize};

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    #[serde(rename = "data")]
    pub data: serde_json::Value,
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UploadRequest {
    pub fn new(data: serde_json::Value) -> UploadRequest {
        UploadRequest { data, name: None }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "cid")]
    pub cid: String,
    #[serde(rename = "url")]
    pub url: String,
    #[serde(rename = "size")]
    pub size: u64,
    #[serde(rename = "timestamp")]
    pub timestamp: String,
    #[serde(rename = "isDuplicate")]
    pub is_duplicate: bool,
}

impl UploadResponse {
    pub fn new(cid: String, url: String, size: u64, timestamp: String, is_duplicate: bool) -> UploadResponse {
        UploadResponse {
            success: true,
            cid,
            url,
            size,
            timestamp,
            is_duplicate,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinSummary {
    #[serde(rename = "cid")]
    pub cid: String,
    #[serde(rename = "size")]
    pub size: u64,
    #[serde(rename = "datePinned", skip_serializing_if = "Option::is_none")]
    pub date_pinned: Option<String>,
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PinSummary {
    pub fn new(cid: String, size: u64) -> PinSummary {
        PinSummary {
            cid,
            size,
            date_pinned: None,
            name: None,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinsResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "count")]
    pub count: u64,
    #[serde(rename = "pins")]
    pub pins: Vec<models::PinSummary>,
}

impl PinsResponse {
    pub fn new(pins: Vec<models::PinSummary>) -> PinsResponse {
        PinsResponse {
            success: true,
            count: pins.len() as u64,
            pins,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnpinResponse {
    #[serde(rename = "success")]
    pub success: bool,
    #[serde(rename = "cid")]
    pub cid: String,
}

impl UnpinResponse {
    pub fn new(cid: String) -> UnpinResponse {
        UnpinResponse { success: true, cid }
    }
}
