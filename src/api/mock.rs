// In-memory backend - stands in for the REST API in demos and tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    ApiError, ApiResponse, ContractApi, RegistrationApi, RegistrationReceipt, UploadReceipt,
};
use crate::config::BuildBridgeConfig;
use crate::contracts::Contract;
use crate::contracts::signing::SignedDocument;
use crate::otp::{mask_destination, OtpTicket};
use crate::registration::RegistrationSubmission;
use crate::roles::{PartyRole, Role};

/// Calls observed by the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    FetchContract { contract_id: String },
    SaveContract { contract_id: String, version: u32 },
    RequestSigningOtp { contract_id: String, party: PartyRole },
    VerifyOtp { ticket_id: String },
    UploadSignedDocument { contract_id: String, party: PartyRole, file_name: String },
    SendVerificationCode { role: Role },
    SubmitRegistration { role: Role },
}

#[derive(Debug, Clone)]
struct IssuedOtp {
    /// Tickets sharing a scope replace each other.
    scope: String,
    code: String,
    expires_at: DateTime<Utc>,
    verified: bool,
    consumed: bool,
    superseded: bool,
}

#[derive(Debug, Default)]
struct MockState {
    contracts: HashMap<String, Contract>,
    tickets: HashMap<String, IssuedOtp>,
    registrations: Vec<RegistrationSubmission>,
    failures_pending: u32,
    calls: Vec<MockCall>,
}

#[derive(Debug)]
pub struct MockBackend {
    state: Mutex<MockState>,
    latency: Duration,
    code_length: usize,
    otp_ttl: chrono::Duration,
    fixed_code: Option<String>,
    document_base_url: String,
    max_document_bytes: usize,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::from_config(&BuildBridgeConfig::default())
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &BuildBridgeConfig) -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            latency: Duration::from_millis(config.mock_api.latency_ms),
            code_length: config.otp.code_length.max(1),
            otp_ttl: config.otp.ttl(),
            fixed_code: config.otp.fixed_test_code.clone(),
            document_base_url: config.signing.document_base_url.trim_end_matches('/').to_string(),
            max_document_bytes: config.signing.max_document_bytes,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_fixed_code(mut self, code: impl Into<String>) -> Self {
        self.fixed_code = Some(code.into());
        self
    }

    pub fn with_otp_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.otp_ttl = ttl;
        self
    }

    pub async fn insert_contract(&self, contract: Contract) {
        self.state
            .lock()
            .await
            .contracts
            .insert(contract.id.clone(), contract);
    }

    pub async fn stored_contract(&self, contract_id: &str) -> Option<Contract> {
        self.state.lock().await.contracts.get(contract_id).cloned()
    }

    /// Make the next `count` calls fail with a network error.
    pub async fn fail_next(&self, count: u32) {
        self.state.lock().await.failures_pending = count;
    }

    pub async fn calls(&self) -> Vec<MockCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn registrations(&self) -> Vec<RegistrationSubmission> {
        self.state.lock().await.registrations.clone()
    }

    /// The code delivered for a ticket; what the user would read from the SMS.
    pub async fn delivered_code(&self, ticket_id: &str) -> Option<String> {
        self.state
            .lock()
            .await
            .tickets
            .get(ticket_id)
            .map(|otp| otp.code.clone())
    }

    async fn begin(&self, call: MockCall) -> Result<tokio::sync::MutexGuard<'_, MockState>, ApiError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut state = self.state.lock().await;
        debug!(call = ?call, "Mock backend call");
        state.calls.push(call);
        if state.failures_pending > 0 {
            state.failures_pending -= 1;
            warn!("Mock backend injecting network failure");
            return Err(ApiError::Network("connection reset by peer".to_string()));
        }
        Ok(state)
    }

    fn generate_code(&self) -> String {
        if let Some(code) = &self.fixed_code {
            return code.clone();
        }
        let mut rng = rand::rng();
        (0..self.code_length)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }

    fn issue_ticket(&self, state: &mut MockState, scope: String, destination: &str) -> OtpTicket {
        for otp in state.tickets.values_mut().filter(|otp| otp.scope == scope) {
            otp.superseded = true;
        }
        let ticket_id = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + self.otp_ttl;
        state.tickets.insert(
            ticket_id.clone(),
            IssuedOtp {
                scope,
                code: self.generate_code(),
                expires_at,
                verified: false,
                consumed: false,
                superseded: false,
            },
        );
        info!(ticket_id = %ticket_id, destination = %mask_destination(destination), "Issued one-time code");
        OtpTicket {
            ticket_id,
            destination: mask_destination(destination),
            expires_at,
            code_length: self.code_length,
        }
    }

    fn check_code(state: &mut MockState, ticket_id: &str, code: &str) -> ApiResponse<()> {
        let Some(otp) = state.tickets.get_mut(ticket_id) else {
            return ApiResponse::failure("Verification session not found");
        };
        if otp.superseded {
            return ApiResponse::failure("Verification code was replaced by a newer one");
        }
        if otp.verified || otp.consumed {
            return ApiResponse::failure("Verification code already used");
        }
        if Utc::now() >= otp.expires_at {
            return ApiResponse::failure("Verification code expired");
        }
        if otp.code != code.trim() {
            return ApiResponse::failure("Invalid verification code");
        }
        otp.verified = true;
        ApiResponse::ack("Code verified")
    }
}

#[async_trait]
impl ContractApi for MockBackend {
    async fn fetch_contract(&self, contract_id: &str) -> Result<ApiResponse<Contract>, ApiError> {
        let state = self
            .begin(MockCall::FetchContract {
                contract_id: contract_id.to_string(),
            })
            .await?;
        match state.contracts.get(contract_id) {
            Some(contract) => Ok(ApiResponse::ok(contract.clone(), "Contract loaded")),
            None => Err(ApiError::NotFound(format!("contract {contract_id}"))),
        }
    }

    async fn save_contract(&self, contract: &Contract) -> Result<ApiResponse<Contract>, ApiError> {
        let mut state = self
            .begin(MockCall::SaveContract {
                contract_id: contract.id.clone(),
                version: contract.version_number,
            })
            .await?;
        if let Some(stored) = state.contracts.get(&contract.id) {
            if stored.version_number > contract.version_number {
                return Ok(ApiResponse::failure(format!(
                    "Contract has a newer version ({}) on the server",
                    stored.version_number
                )));
            }
        }
        state.contracts.insert(contract.id.clone(), contract.clone());
        Ok(ApiResponse::ok(contract.clone(), "Contract saved"))
    }

    async fn request_signing_otp(
        &self,
        contract_id: &str,
        party: PartyRole,
    ) -> Result<ApiResponse<OtpTicket>, ApiError> {
        let mut state = self
            .begin(MockCall::RequestSigningOtp {
                contract_id: contract_id.to_string(),
                party,
            })
            .await?;
        let destination = match party {
            PartyRole::Client => "+966500000101",
            PartyRole::Contractor => "+966500000202",
        };
        let scope = format!("sign:{contract_id}:{party}");
        let ticket = self.issue_ticket(&mut state, scope, destination);
        Ok(ApiResponse::ok(ticket, "Verification code sent"))
    }

    async fn verify_signing_otp(&self, ticket_id: &str, code: &str) -> Result<ApiResponse<()>, ApiError> {
        let mut state = self
            .begin(MockCall::VerifyOtp {
                ticket_id: ticket_id.to_string(),
            })
            .await?;
        Ok(Self::check_code(&mut state, ticket_id, code))
    }

    async fn upload_signed_document(
        &self,
        contract_id: &str,
        party: PartyRole,
        ticket_id: &str,
        document: &SignedDocument,
    ) -> Result<ApiResponse<UploadReceipt>, ApiError> {
        let mut state = self
            .begin(MockCall::UploadSignedDocument {
                contract_id: contract_id.to_string(),
                party,
                file_name: document.file_name.clone(),
            })
            .await?;
        let Some(otp) = state
            .tickets
            .get_mut(ticket_id)
            .filter(|otp| otp.verified && !otp.consumed && !otp.superseded)
        else {
            return Ok(ApiResponse::failure("Upload is not authorized"));
        };
        // A rejected document leaves the ticket usable for another attempt
        if document.bytes.len() > self.max_document_bytes {
            return Ok(ApiResponse::failure("Document exceeds the maximum upload size"));
        }
        otp.consumed = true;
        let receipt = UploadReceipt {
            url: format!(
                "{}/{}/{}-signed-{}.pdf",
                self.document_base_url,
                contract_id,
                party,
                Uuid::new_v4().simple()
            ),
            file_name: document.file_name.clone(),
            uploaded_at: Utc::now(),
        };
        Ok(ApiResponse::ok(receipt, "Signed document uploaded"))
    }
}

#[async_trait]
impl RegistrationApi for MockBackend {
    async fn send_verification_code(
        &self,
        role: Role,
        destination: &str,
    ) -> Result<ApiResponse<OtpTicket>, ApiError> {
        let mut state = self.begin(MockCall::SendVerificationCode { role }).await?;
        let ticket = self.issue_ticket(&mut state, format!("register:{destination}"), destination);
        Ok(ApiResponse::ok(ticket, "Verification code sent"))
    }

    async fn verify_code(&self, ticket_id: &str, code: &str) -> Result<ApiResponse<()>, ApiError> {
        let mut state = self
            .begin(MockCall::VerifyOtp {
                ticket_id: ticket_id.to_string(),
            })
            .await?;
        Ok(Self::check_code(&mut state, ticket_id, code))
    }

    async fn submit_registration(
        &self,
        submission: &RegistrationSubmission,
    ) -> Result<ApiResponse<RegistrationReceipt>, ApiError> {
        let mut state = self
            .begin(MockCall::SubmitRegistration {
                role: submission.role,
            })
            .await?;
        state.registrations.push(submission.clone());
        let receipt = RegistrationReceipt {
            account_id: format!("acct-{}", Uuid::new_v4().simple()),
            role: submission.role,
            pending_review: submission.role.is_business(),
        };
        Ok(ApiResponse::ok(receipt, "Registration submitted successfully"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_random_codes_have_configured_length() {
        let backend = MockBackend::new();
        let ticket = backend
            .send_verification_code(Role::Individual, "+966501234567")
            .await
            .unwrap()
            .into_result()
            .unwrap();
        let code = backend.delivered_code(&ticket.ticket_id).await.unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(ticket.destination, "+966*******67");
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let backend = MockBackend::new().with_fixed_code("424242");
        let ticket = backend
            .send_verification_code(Role::Supplier, "ops@supplier.test")
            .await
            .unwrap()
            .into_result()
            .unwrap();

        let wrong = RegistrationApi::verify_code(&backend, &ticket.ticket_id, "000000")
            .await
            .unwrap();
        assert!(!wrong.success);

        let right = RegistrationApi::verify_code(&backend, &ticket.ticket_id, "424242")
            .await
            .unwrap();
        assert!(right.success);

        let again = RegistrationApi::verify_code(&backend, &ticket.ticket_id, "424242")
            .await
            .unwrap();
        assert!(!again.success);
        assert_eq!(again.message, "Verification code already used");
    }

    #[tokio::test]
    async fn test_expired_code_is_rejected() {
        let backend = MockBackend::new()
            .with_fixed_code("111111")
            .with_otp_ttl(chrono::Duration::seconds(-1));
        let ticket = backend
            .send_verification_code(Role::Individual, "+966501234567")
            .await
            .unwrap()
            .into_result()
            .unwrap();
        let response = RegistrationApi::verify_code(&backend, &ticket.ticket_id, "111111")
            .await
            .unwrap();
        assert!(!response.success);
        assert_eq!(response.message, "Verification code expired");
    }

    #[tokio::test]
    async fn test_new_ticket_supersedes_previous_one() {
        let backend = MockBackend::new().with_fixed_code("202020");
        let first = backend
            .request_signing_otp("c-1", PartyRole::Client)
            .await
            .unwrap()
            .into_result()
            .unwrap();
        let second = backend
            .request_signing_otp("c-1", PartyRole::Client)
            .await
            .unwrap()
            .into_result()
            .unwrap();
        // Other party's ticket is unaffected
        let other = backend
            .request_signing_otp("c-1", PartyRole::Contractor)
            .await
            .unwrap()
            .into_result()
            .unwrap();

        let stale = backend.verify_signing_otp(&first.ticket_id, "202020").await.unwrap();
        assert!(!stale.success);
        assert_eq!(stale.message, "Verification code was replaced by a newer one");
        assert!(backend.verify_signing_otp(&second.ticket_id, "202020").await.unwrap().success);
        assert!(backend.verify_signing_otp(&other.ticket_id, "202020").await.unwrap().success);
    }

    #[tokio::test]
    async fn test_oversized_upload_keeps_ticket_usable() {
        let mut config = BuildBridgeConfig::default();
        config.signing.max_document_bytes = 4;
        let backend = MockBackend::from_config(&config).with_fixed_code("303030");
        let ticket = backend
            .request_signing_otp("c-2", PartyRole::Client)
            .await
            .unwrap()
            .into_result()
            .unwrap();
        backend.verify_signing_otp(&ticket.ticket_id, "303030").await.unwrap();

        let large = SignedDocument::pdf("big.pdf", vec![0; 5]);
        let rejected = backend
            .upload_signed_document("c-2", PartyRole::Client, &ticket.ticket_id, &large)
            .await
            .unwrap();
        assert!(!rejected.success);

        let small = SignedDocument::pdf("small.pdf", vec![0; 4]);
        let accepted = backend
            .upload_signed_document("c-2", PartyRole::Client, &ticket.ticket_id, &small)
            .await
            .unwrap();
        assert!(accepted.success);

        let replay = backend
            .upload_signed_document("c-2", PartyRole::Client, &ticket.ticket_id, &small)
            .await
            .unwrap();
        assert_eq!(replay.message, "Upload is not authorized");
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated_per_call() {
        let backend = MockBackend::new().with_latency(Duration::from_millis(250));
        let started = tokio::time::Instant::now();
        backend.fetch_contract("missing").await.unwrap_err();
        backend.fetch_contract("missing").await.unwrap_err();
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = MockBackend::new();
        backend.fail_next(1).await;
        let first = backend.fetch_contract("missing").await;
        assert!(matches!(first, Err(ApiError::Network(_))));
        assert!(first.unwrap_err().is_transient());
        let second = backend.fetch_contract("missing").await;
        assert!(matches!(second, Err(ApiError::NotFound(_))));
        assert_eq!(backend.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_save_rejects_stale_version() {
        let backend = MockBackend::new();
        let mut contract = Contract::seed("project-9");
        contract.version_number = 4;
        backend.insert_contract(contract.clone()).await;

        let mut stale = contract.clone();
        stale.version_number = 3;
        let response = backend.save_contract(&stale).await.unwrap();
        assert!(!response.success);

        contract.version_number = 5;
        let response = backend.save_contract(&contract).await.unwrap();
        assert!(response.success);
        assert_eq!(backend.stored_contract(&contract.id).await.unwrap().version_number, 5);
    }
}
