use crate::models;
use serde::{Deserialize, Serialize};

/// ErrorResponse : Body returned with every non-2xx status
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    #[serde(rename = "success")]
    pub success: bool,
    /// What went wrong, in detail
    #[serde(rename = "error")]
    pub error: String,
    /// Human-readable summary
    #[serde(rename = "message")]
    pub message: String,
    /// Machine-readable error code
    #[serde(rename = "code")]
    pub code: String,
}

impl ErrorResponse {
    /// Body returned with every non-2xx status
    pub fn new(code: String, error: String, message: String) -> ErrorResponse {
        ErrorResponse {
            success: false,
            error,
            message,
            code,
        }
    }
}
