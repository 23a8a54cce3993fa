use models::models::{
    ConsentRequest, DecryptRequest, EncryptRequest, RegisterRecordRequest, RetrieveRecordRequest,
    ShareDataRequest, UpdateRecordStatusRequest, UploadRequest,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::error;

use crate::ApiError;

/// An HTTP call as the runtime adapter hands it over
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    /// Keys are lower-cased
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    fn param(&self, name: &str) -> Result<String, ApiError> {
        self.query
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::Validation(format!("Missing query parameter: {}", name)))
    }

    fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        if self.body.trim().is_empty() {
            return Err(ApiError::Validation("Request body is required".to_string()));
        }
        serde_json::from_str(&self.body).map_err(|e| {
            error!("Failed to parse request body for {}: {}", self.path, e);
            ApiError::Validation(format!("Invalid request body: {}", e))
        })
    }
}

/// Every operation the service exposes, parsed and shape-checked
#[derive(Debug, Clone)]
pub enum Request {
    RegisterRecord(RegisterRecordRequest),
    ProducerRecords { producer: String },
    ProducerRecord { producer: String, record_id: String },
    ProducerRecordStatus { producer: String },
    UpdateRecordStatus(UpdateRecordStatusRequest),
    RetrieveRecord(RetrieveRecordRequest),
    UpdateConsent(ConsentRequest),
    GetConsent {
        producer_did: String,
        provider_did: String,
        purpose: String,
    },
    VerifyPayment { record_id: String },
    ShareData(ShareDataRequest),
    RecordsCount,
    GenerateKeyPair,
    Encrypt(EncryptRequest),
    Decrypt(DecryptRequest),
    Upload(UploadRequest),
    Pins,
    Unpin { cid: String },
}

impl Request {
    pub fn parse(http: &HttpRequest) -> Result<Request, ApiError> {
        let path = http.path.trim_end_matches('/');
        let request = match (http.method.as_str(), path) {
            ("POST", "/data-registry/producer/register-record") => Request::RegisterRecord(http.json()?),
            ("GET", "/data-registry/producer/records") => Request::ProducerRecords {
                producer: http.param("producer")?,
            },
            ("GET", "/data-registry/producer/record") => Request::ProducerRecord {
                producer: http.param("producer")?,
                record_id: http.param("recordId")?,
            },
            ("GET", "/data-registry/producer/record-status") => Request::ProducerRecordStatus {
                producer: http.param("producer")?,
            },
            ("POST", "/data-registry/producer/update-record-status") => {
                Request::UpdateRecordStatus(http.json()?)
            }
            ("POST", "/data-registry/producer/retrieve-record") => Request::RetrieveRecord(http.json()?),
            ("POST", "/data-registry/consent") => Request::UpdateConsent(http.json()?),
            ("GET", "/data-registry/consent") => Request::GetConsent {
                producer_did: http.param("producerDid")?,
                provider_did: http.param("providerDid")?,
                purpose: http.param("purpose")?,
            },
            ("GET", "/data-registry/verify-payment") => Request::VerifyPayment {
                record_id: http.param("recordId")?,
            },
            ("POST", "/data-registry/share-data") => Request::ShareData(http.json()?),
            ("GET", "/data-registry/records/count") => Request::RecordsCount,
            ("POST", "/encryption/generate-key-pair") => Request::GenerateKeyPair,
            ("POST", "/encryption/encrypt") => Request::Encrypt(http.json()?),
            ("POST", "/encryption/decrypt") => Request::Decrypt(http.json()?),
            ("POST", "/ipfs/upload") => Request::Upload(http.json()?),
            ("GET", "/ipfs/pins") => Request::Pins,
            ("DELETE", "/ipfs/unpin") => Request::Unpin {
                cid: ipfs::parse_cid(&http.param("cid")?)?,
            },
            (method, _) => {
                error!(path = %http.path, method = %method, "Unknown route requested");
                return Err(ApiError::NotFound(format!("Unknown route: {} {}", method, http.path)));
            }
        };
        Ok(request)
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Request::RegisterRecord(_) => "register-record",
            Request::ProducerRecords { .. } => "producer-records",
            Request::ProducerRecord { .. } => "producer-record",
            Request::ProducerRecordStatus { .. } => "record-status",
            Request::UpdateRecordStatus(_) => "update-record-status",
            Request::RetrieveRecord(_) => "retrieve-record",
            Request::UpdateConsent(_) => "update-consent",
            Request::GetConsent { .. } => "get-consent",
            Request::VerifyPayment { .. } => "verify-payment",
            Request::ShareData(_) => "share-data",
            Request::RecordsCount => "records-count",
            Request::GenerateKeyPair => "generate-key-pair",
            Request::Encrypt(_) => "encrypt",
            Request::Decrypt(_) => "decrypt",
            Request::Upload(_) => "ipfs-upload",
            Request::Pins => "ipfs-pins",
            Request::Unpin { .. } => "ipfs-unpin",
        }
    }
}
