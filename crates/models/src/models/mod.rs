pub mod consent;
pub use self::consent::{ConsentRequest, ConsentResponse};
pub mod encryption;
pub use self::encryption::{DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, EncryptedData, KeyPairResponse};
pub mod error_response;
pub use self::error_response::ErrorResponse;
pub mod ipfs;
pub use self::ipfs::{PinSummary, PinsResponse, UnpinResponse, UploadRequest, UploadResponse};
pub mod producer_records;
pub use self::producer_records::{ProducerRecordsResponse, ProducerStatusResponse, RecordResponse, RecordSummary, RecordsCountResponse};
pub mod record_status;
pub use self::record_status::{TransactionInfo, TransactionResponse, UpdateRecordStatusRequest};
pub mod register_record;
pub use self::register_record::{RecordData, RecordMetadata, RegisterRecordRequest, RegisterRecordResponse};
pub mod retrieve_record;
pub use self::retrieve_record::{RetrieveRecordRequest, RetrieveRecordResponse};
pub mod share_data;
pub use self::share_data::{ShareDataRequest, ShareDataResponse, VerifyPaymentResponse};
pub mod status_value;
pub use self::status_value::StatusValue;
