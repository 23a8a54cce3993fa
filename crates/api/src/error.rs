use crypto::CryptoError;
use ipfs::IpfsError;
use ledger::LedgerError;
use models::models::ErrorResponse;
use thiserror::Error;

/// API Errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payment not verified")]
    PaymentNotVerified,

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Content store error: {0}")]
    Storage(String),

    #[error("Ledger write failed: {0}")]
    ChainWrite(String),

    #[error("Ledger read failed: {0}")]
    ChainRead(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Machine-readable code carried in the error body
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Auth(_) => "AUTH_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::PaymentNotVerified => "PAYMENT_NOT_VERIFIED",
            ApiError::Upload(_) => "UPLOAD_ERROR",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::ChainWrite(_) => "CHAIN_WRITE_ERROR",
            ApiError::ChainRead(_) => "CHAIN_READ_ERROR",
            ApiError::Encryption(_) => "ENCRYPTION_ERROR",
            ApiError::Decryption(_) => "DECRYPTION_ERROR",
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Json(_) => "JSON_ERROR",
        }
    }

    /// Short human summary carried as the error body's `message`
    pub fn summary(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Invalid request",
            ApiError::Auth(_) => "Unauthorized",
            ApiError::NotFound(_) => "Not found",
            ApiError::PaymentNotVerified => "Payment not verified",
            ApiError::Upload(_) => "Upload failed",
            ApiError::Storage(_) => "Content store error",
            ApiError::ChainWrite(_) => "Ledger write failed",
            ApiError::ChainRead(_) => "Ledger read failed",
            ApiError::Encryption(_) => "Encryption failed",
            ApiError::Decryption(_) => "Decryption failed",
            ApiError::Config(_) => "Configuration error",
            ApiError::Internal(_) => "Internal error",
            ApiError::Json(_) => "Invalid JSON",
        }
    }

    pub fn status_code(&self) -> u16 {
        status_for_code(self.code())
    }
}

/// HTTP status for an error code
pub fn status_for_code(code: &str) -> u16 {
    match code {
        "VALIDATION_ERROR" | "PAYMENT_NOT_VERIFIED" | "ENCRYPTION_ERROR" | "DECRYPTION_ERROR" => 400,
        "AUTH_ERROR" => 401,
        "NOT_FOUND" => 404,
        _ => 500,
    }
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        let code = err.code().to_string();
        let summary = err.summary().to_string();
        let error = match err {
            ApiError::PaymentNotVerified => "Payment not verified".to_string(),
            ApiError::Validation(msg)
            | ApiError::Auth(msg)
            | ApiError::NotFound(msg)
            | ApiError::Upload(msg)
            | ApiError::Storage(msg)
            | ApiError::ChainWrite(msg)
            | ApiError::ChainRead(msg)
            | ApiError::Encryption(msg)
            | ApiError::Decryption(msg)
            | ApiError::Config(msg)
            | ApiError::Internal(msg) => msg,
            ApiError::Json(err) => err.to_string(),
        };
        ErrorResponse::new(code, error, summary)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Write(msg) => ApiError::ChainWrite(msg),
            LedgerError::Read(msg) => ApiError::ChainRead(msg),
            LedgerError::InvalidInput(msg) => ApiError::Validation(msg),
        }
    }
}

impl From<IpfsError> for ApiError {
    fn from(err: IpfsError) -> Self {
        match err {
            IpfsError::Upload(msg) => ApiError::Upload(msg),
            IpfsError::Config(msg) => ApiError::Config(msg),
            IpfsError::InvalidCid(msg) => ApiError::Validation(msg),
            other => ApiError::Storage(other.to_string()),
        }
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Decryption(msg) => ApiError::Decryption(msg),
            CryptoError::InvalidKey(msg) | CryptoError::Encryption(msg) => ApiError::Encryption(msg),
            CryptoError::Hash(msg) => ApiError::Validation(msg),
            CryptoError::Signing(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_not_verified_body() {
        let err = ApiError::PaymentNotVerified;
        assert_eq!(err.status_code(), 400);
        let body: ErrorResponse = err.into();
        assert!(!body.success);
        assert_eq!(body.code, "PAYMENT_NOT_VERIFIED");
        assert_eq!(body.error, "Payment not verified");
        assert_eq!(body.message, "Payment not verified");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Validation("x".into()).status_code(), 400);
        assert_eq!(ApiError::Auth("x".into()).status_code(), 401);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ApiError::Upload("x".into()).status_code(), 500);
        assert_eq!(ApiError::ChainWrite("x".into()).status_code(), 500);
        assert_eq!(ApiError::Decryption("x".into()).status_code(), 400);
    }

    #[test]
    fn test_collaborator_errors_keep_message() {
        let err: ApiError = LedgerError::Write("execution reverted: duplicate".to_string()).into();
        let body: ErrorResponse = err.into();
        assert_eq!(body.code, "CHAIN_WRITE_ERROR");
        assert_eq!(body.error, "execution reverted: duplicate");
        assert_eq!(body.message, "Ledger write failed");

        let err: ApiError = CryptoError::Decryption("authentication tag mismatch".to_string()).into();
        assert_eq!(err.status_code(), 400);

        let err: ApiError = IpfsError::InvalidCid("../x".to_string()).into();
        assert_eq!(err.status_code(), 400);
    }
}
