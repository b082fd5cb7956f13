// OTP-gated upload of a signed contract PDF
//
// request_otp -> (code delivered out of band) -> verify_and_upload
// Failures collapse into a single user-facing message; the issued ticket is
// kept until a fresh code is requested. A ticket that already passed
// verification is not verified again when the upload is retried.

use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::{ApiError, ContractApi, UploadReceipt};
use crate::otp::{OtpTicket, ResendCooldown};
use crate::roles::PartyRole;

pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload signed contract. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SignedDocument {
    pub file_name: String,
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl SignedDocument {
    pub fn pdf(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "application/pdf".to_string(),
            bytes,
        }
    }

    pub fn validate(&self) -> Result<(), SigningError> {
        if self.bytes.is_empty() {
            return Err(SigningError::InvalidDocument("file is empty".to_string()));
        }
        let is_pdf = self.content_type.eq_ignore_ascii_case("application/pdf")
            || self.file_name.to_ascii_lowercase().ends_with(".pdf");
        if !is_pdf {
            return Err(SigningError::InvalidDocument(format!(
                "{} is not a PDF",
                self.file_name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Please wait {}s before requesting a new code", .0.as_secs().max(1))]
    CooldownActive(Duration),
    #[error("Request a verification code first")]
    NoActiveCode,
    #[error("Verification code is required")]
    EmptyCode,
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    #[error("Code verification failed: {0}")]
    Verification(ApiError),
    #[error("Upload failed: {0}")]
    Upload(ApiError),
    #[error("Could not send verification code: {0}")]
    OtpRequest(ApiError),
}

impl SigningError {
    /// Message shown inline. Verification and upload failures are opaque.
    pub fn user_message(&self) -> String {
        match self {
            SigningError::CooldownActive(_)
            | SigningError::NoActiveCode
            | SigningError::EmptyCode
            | SigningError::OtpRequest(_) => self.to_string(),
            SigningError::InvalidDocument(_)
            | SigningError::Verification(_)
            | SigningError::Upload(_) => UPLOAD_FAILED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct SignedUploadFlow {
    contract_id: String,
    party: PartyRole,
    ticket: Option<OtpTicket>,
    ticket_verified: bool,
    cooldown: ResendCooldown,
    pub error: Option<String>,
    pub is_loading: bool,
}

impl SignedUploadFlow {
    pub fn new(contract_id: impl Into<String>, party: PartyRole, resend_cooldown: Duration) -> Self {
        Self {
            contract_id: contract_id.into(),
            party,
            ticket: None,
            ticket_verified: false,
            cooldown: ResendCooldown::new(resend_cooldown),
            error: None,
            is_loading: false,
        }
    }

    pub fn party(&self) -> PartyRole {
        self.party
    }

    pub fn ticket(&self) -> Option<&OtpTicket> {
        self.ticket.as_ref()
    }

    /// Whether the current ticket was accepted and only the upload remains.
    pub fn is_ticket_verified(&self) -> bool {
        self.ticket_verified
    }

    pub fn resend_available_in(&self) -> Duration {
        self.cooldown.remaining()
    }

    /// Ask the backend for a new code. Any previous ticket is discarded.
    pub async fn request_otp<A: ContractApi + ?Sized>(&mut self, api: &A) -> Result<&OtpTicket, SigningError> {
        if !self.cooldown.is_ready() {
            return Err(self.fail(SigningError::CooldownActive(self.cooldown.remaining())));
        }

        self.is_loading = true;
        let response = api.request_signing_otp(&self.contract_id, self.party).await;
        self.is_loading = false;

        let ticket = match response.and_then(|r| r.into_result()) {
            Ok(ticket) => ticket,
            Err(e) => return Err(self.fail(SigningError::OtpRequest(e))),
        };

        info!(
            contract_id = %self.contract_id,
            party = %self.party,
            ticket_id = %ticket.ticket_id,
            "Signing code issued"
        );
        self.error = None;
        self.ticket_verified = false;
        self.cooldown.start();
        Ok(&*self.ticket.insert(ticket))
    }

    /// Verify `code` and upload `document`. Returns the stored document URL.
    pub async fn verify_and_upload<A: ContractApi + ?Sized>(
        &mut self,
        api: &A,
        code: &str,
        document: &SignedDocument,
    ) -> Result<UploadReceipt, SigningError> {
        let Some(ticket_id) = self.ticket.as_ref().map(|t| t.ticket_id.clone()) else {
            return Err(self.fail(SigningError::NoActiveCode));
        };
        if !self.ticket_verified && code.trim().is_empty() {
            return Err(self.fail(SigningError::EmptyCode));
        }
        if let Err(e) = document.validate() {
            return Err(self.fail(e));
        }

        self.is_loading = true;
        let result = self.verify_then_upload(api, &ticket_id, code, document).await;
        self.is_loading = false;

        match result {
            Ok(receipt) => {
                info!(
                    contract_id = %self.contract_id,
                    party = %self.party,
                    url = %receipt.url,
                    "Signed contract uploaded"
                );
                self.ticket = None;
                self.ticket_verified = false;
                self.error = None;
                self.cooldown.clear();
                Ok(receipt)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn verify_then_upload<A: ContractApi + ?Sized>(
        &mut self,
        api: &A,
        ticket_id: &str,
        code: &str,
        document: &SignedDocument,
    ) -> Result<UploadReceipt, SigningError> {
        if !self.ticket_verified {
            api.verify_signing_otp(ticket_id, code)
                .await
                .and_then(|r| r.into_ack())
                .map_err(SigningError::Verification)?;
            self.ticket_verified = true;
        }

        api.upload_signed_document(&self.contract_id, self.party, ticket_id, document)
            .await
            .and_then(|r| r.into_result())
            .map_err(SigningError::Upload)
    }

    fn fail(&mut self, err: SigningError) -> SigningError {
        match &err {
            SigningError::Verification(e) | SigningError::Upload(e) | SigningError::OtpRequest(e) => {
                error!(
                    contract_id = %self.contract_id,
                    party = %self.party,
                    transient = e.is_transient(),
                    error = %err,
                    "Signing flow failed"
                );
            }
            _ => {
                warn!(contract_id = %self.contract_id, party = %self.party, error = %err, "Signing flow rejected");
            }
        }
        self.error = Some(err.user_message());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBackend;

    fn pdf() -> SignedDocument {
        SignedDocument::pdf("signed.pdf", b"%PDF-1.7 signed".to_vec())
    }

    #[test]
    fn test_document_validation() {
        assert!(pdf().validate().is_ok());
        assert!(SignedDocument::pdf("signed.pdf", Vec::new()).validate().is_err());
        let png = SignedDocument {
            file_name: "scan.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };
        assert!(png.validate().is_err());
    }

    #[tokio::test]
    async fn test_upload_without_code_fails() {
        let backend = MockBackend::new();
        let mut flow = SignedUploadFlow::new("c-1", PartyRole::Client, Duration::from_secs(60));
        let result = flow.verify_and_upload(&backend, "123456", &pdf()).await;
        assert!(matches!(result, Err(SigningError::NoActiveCode)));
        assert!(flow.error.is_some());
        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_code_keeps_ticket() {
        let backend = MockBackend::new().with_fixed_code("123456");
        let mut flow = SignedUploadFlow::new("c-1", PartyRole::Client, Duration::from_secs(60));
        flow.request_otp(&backend).await.unwrap();

        let result = flow.verify_and_upload(&backend, "999999", &pdf()).await;
        assert!(matches!(result, Err(SigningError::Verification(_))));
        assert_eq!(flow.error.as_deref(), Some(UPLOAD_FAILED_MESSAGE));
        assert!(flow.ticket().is_some());

        let receipt = flow.verify_and_upload(&backend, "123456", &pdf()).await.unwrap();
        assert!(receipt.url.contains("c-1"));
        assert!(flow.ticket().is_none());
        assert!(flow.error.is_none());
    }
}
