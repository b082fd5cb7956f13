// Backend seams - thin async traits over the REST surface
//
// Every call resolves to the `{ success, message, data? }` envelope the backend
// exposes. Transport failures surface as `ApiError`; a well-formed
// `success: false` response is turned into `ApiError::Rejected` by callers via
// `into_result`/`into_ack`.

pub mod errors;
pub mod mock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contracts::Contract;
use crate::contracts::signing::SignedDocument;
use crate::otp::OtpTicket;
use crate::registration::RegistrationSubmission;
use crate::roles::{PartyRole, Role};

pub use errors::ApiError;
pub use mock::MockBackend;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn ack(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected {
                message: self.message,
            });
        }
        self.data.ok_or(ApiError::MissingData {
            message: self.message,
        })
    }

    /// Success check for calls that carry no payload; yields the message.
    pub fn into_ack(self) -> Result<String, ApiError> {
        if self.success {
            Ok(self.message)
        } else {
            Err(ApiError::Rejected {
                message: self.message,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub url: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub account_id: String,
    pub role: Role,
    /// Business accounts go through manual document review first.
    pub pending_review: bool,
}

#[async_trait]
pub trait ContractApi: Send + Sync {
    async fn fetch_contract(&self, contract_id: &str) -> Result<ApiResponse<Contract>, ApiError>;

    async fn save_contract(&self, contract: &Contract) -> Result<ApiResponse<Contract>, ApiError>;

    /// Issue a one-time code authorizing a signed-document upload.
    async fn request_signing_otp(
        &self,
        contract_id: &str,
        party: PartyRole,
    ) -> Result<ApiResponse<OtpTicket>, ApiError>;

    async fn verify_signing_otp(&self, ticket_id: &str, code: &str) -> Result<ApiResponse<()>, ApiError>;

    /// Upload authorized by a verified ticket. The ticket is consumed.
    async fn upload_signed_document(
        &self,
        contract_id: &str,
        party: PartyRole,
        ticket_id: &str,
        document: &SignedDocument,
    ) -> Result<ApiResponse<UploadReceipt>, ApiError>;
}

#[async_trait]
pub trait RegistrationApi: Send + Sync {
    async fn send_verification_code(
        &self,
        role: Role,
        destination: &str,
    ) -> Result<ApiResponse<OtpTicket>, ApiError>;

    async fn verify_code(&self, ticket_id: &str, code: &str) -> Result<ApiResponse<()>, ApiError>;

    async fn submit_registration(
        &self,
        submission: &RegistrationSubmission,
    ) -> Result<ApiResponse<RegistrationReceipt>, ApiError>;
}
