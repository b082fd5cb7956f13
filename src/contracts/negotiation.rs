// Contract negotiation store
//
// Holds one contract and the acting party. Every guard failure leaves the
// contract untouched and records a user-facing message in `error`.

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::model::{Clause, Contract};
use super::status::{try_transition, ContractAction, ContractStatus};
use crate::api::{ApiError, ContractApi, UploadReceipt};
use crate::roles::PartyRole;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Only {required} can {action}")]
    WrongRole {
        required: PartyRole,
        action: &'static str,
    },
    #[error("Contract cannot be {action} in its current state")]
    InvalidState {
        status: ContractStatus,
        action: &'static str,
    },
    #[error("It is not your turn to sign the contract")]
    NotYourTurnToSign,
    #[error("A comment is required when requesting changes")]
    CommentRequired,
    #[error("Additional clauses can only be edited by the client during review")]
    ClausesLocked,
    #[error("Clause text cannot be empty")]
    EmptyClause,
    #[error("Clause {0} not found")]
    ClauseNotFound(String),
    #[error("{0}")]
    Api(ApiError),
}

#[derive(Debug, Clone)]
pub struct ContractNegotiation {
    contract: Contract,
    current_role: PartyRole,
    pub error: Option<String>,
    pub is_loading: bool,
    mock_document_base_url: String,
}

impl ContractNegotiation {
    pub fn new(contract: Contract, current_role: PartyRole) -> Self {
        Self {
            contract,
            current_role,
            error: None,
            is_loading: false,
            mock_document_base_url: crate::config::SigningConfig::default().document_base_url,
        }
    }

    pub fn with_document_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.mock_document_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn status(&self) -> ContractStatus {
        self.contract.status
    }

    pub fn current_role(&self) -> PartyRole {
        self.current_role
    }

    pub fn set_role(&mut self, role: PartyRole) {
        self.current_role = role;
        self.error = None;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Replace the contract with demo data for the same project.
    pub fn reset(&mut self) {
        let project_id = self.contract.project_id.clone();
        self.contract = Contract::seed(project_id);
        self.current_role = PartyRole::Client;
        self.error = None;
        self.is_loading = false;
        info!(contract_id = %self.contract.id, "Negotiation reset to seed contract");
    }

    pub fn can_edit_clauses(&self) -> bool {
        self.current_role == PartyRole::Client && self.contract.status.allows_clause_editing()
    }

    pub fn available_actions(&self) -> Vec<ContractAction> {
        self.contract.status.available_actions(self.current_role)
    }

    /// Client sends the draft (or their modifications) to the contractor.
    pub fn send_to_other_party(&mut self, comment: Option<String>) -> Result<ContractStatus, ContractError> {
        if self.current_role != PartyRole::Client {
            return Err(self.reject(ContractError::WrongRole {
                required: PartyRole::Client,
                action: "send the contract for review",
            }));
        }
        let status = self.apply(ContractAction::Send, comment, "sent")?;
        self.contract.last_negotiation_comment = None;
        Ok(status)
    }

    /// Contractor sends the contract back with a mandatory comment.
    pub fn request_changes(&mut self, comment: &str) -> Result<ContractStatus, ContractError> {
        if self.current_role != PartyRole::Contractor {
            return Err(self.reject(ContractError::WrongRole {
                required: PartyRole::Contractor,
                action: "request changes",
            }));
        }
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(self.reject(ContractError::CommentRequired));
        }
        let status = self.apply(
            ContractAction::RequestChanges,
            Some(comment.to_string()),
            "sent back for changes",
        )?;
        self.contract.last_negotiation_comment = Some(comment.to_string());
        Ok(status)
    }

    pub fn approve(&mut self, comment: Option<String>) -> Result<ContractStatus, ContractError> {
        if self.current_role != PartyRole::Contractor {
            return Err(self.reject(ContractError::WrongRole {
                required: PartyRole::Contractor,
                action: "approve the contract",
            }));
        }
        self.apply(ContractAction::Approve, comment, "approved")
    }

    /// Sign with a mock-generated document URL.
    pub fn sign(&mut self) -> Result<ContractStatus, ContractError> {
        let url = format!(
            "{}/{}/{}-signed-v{}-{}.pdf",
            self.mock_document_base_url,
            self.contract.id,
            self.current_role,
            self.contract.version_number,
            Uuid::new_v4().simple()
        );
        self.sign_with_url(url)
    }

    /// Sign with the URL returned by a completed OTP upload.
    pub fn apply_signed_upload(&mut self, receipt: &UploadReceipt) -> Result<ContractStatus, ContractError> {
        self.sign_with_url(receipt.url.clone())
    }

    fn sign_with_url(&mut self, url: String) -> Result<ContractStatus, ContractError> {
        let status = self.contract.status;
        if !status.is_signing() {
            return Err(self.reject(ContractError::InvalidState {
                status,
                action: "signed",
            }));
        }
        if status.awaiting_party() != Some(self.current_role) {
            return Err(self.reject(ContractError::NotYourTurnToSign));
        }
        let signer = self.current_role;
        let status = self.apply(ContractAction::Sign, None, "signed")?;
        self.contract.set_signed_pdf_url(signer, url);
        Ok(status)
    }

    pub fn add_clause(&mut self, text: &str) -> Result<&Clause, ContractError> {
        self.ensure_clauses_editable()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(self.reject(ContractError::EmptyClause));
        }
        self.contract.additional_clauses.push(Clause::new(text));
        self.error = None;
        let index = self.contract.additional_clauses.len() - 1;
        Ok(&self.contract.additional_clauses[index])
    }

    pub fn update_clause(&mut self, id: &str, text: &str) -> Result<(), ContractError> {
        self.ensure_clauses_editable()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(self.reject(ContractError::EmptyClause));
        }
        match self.contract.additional_clauses.iter_mut().find(|c| c.id == id) {
            Some(clause) => {
                clause.text = text.to_string();
                self.error = None;
                Ok(())
            }
            None => Err(self.reject(ContractError::ClauseNotFound(id.to_string()))),
        }
    }

    pub fn remove_clause(&mut self, id: &str) -> Result<Clause, ContractError> {
        self.ensure_clauses_editable()?;
        match self.contract.additional_clauses.iter().position(|c| c.id == id) {
            Some(index) => {
                self.error = None;
                Ok(self.contract.additional_clauses.remove(index))
            }
            None => Err(self.reject(ContractError::ClauseNotFound(id.to_string()))),
        }
    }

    /// Replace the local contract with the server copy.
    pub async fn load<A: ContractApi + ?Sized>(&mut self, api: &A, contract_id: &str) -> Result<(), ContractError> {
        self.is_loading = true;
        let result = api.fetch_contract(contract_id).await.and_then(|r| r.into_result());
        self.is_loading = false;

        match result {
            Ok(contract) => {
                info!(contract_id = %contract.id, status = %contract.status, version = contract.version_number, "Contract loaded");
                self.contract = contract;
                self.error = None;
                Ok(())
            }
            Err(e) => Err(self.api_failure(e)),
        }
    }

    pub async fn save<A: ContractApi + ?Sized>(&mut self, api: &A) -> Result<(), ContractError> {
        self.is_loading = true;
        let result = api.save_contract(&self.contract).await.and_then(|r| r.into_result());
        self.is_loading = false;

        match result {
            Ok(saved) => {
                info!(contract_id = %saved.id, version = saved.version_number, "Contract saved");
                self.contract = saved;
                self.error = None;
                Ok(())
            }
            Err(e) => Err(self.api_failure(e)),
        }
    }

    fn ensure_clauses_editable(&mut self) -> Result<(), ContractError> {
        if self.can_edit_clauses() {
            Ok(())
        } else {
            Err(self.reject(ContractError::ClausesLocked))
        }
    }

    fn apply(
        &mut self,
        action: ContractAction,
        comment: Option<String>,
        verb: &'static str,
    ) -> Result<ContractStatus, ContractError> {
        let from = self.contract.status;
        let Some(to) = try_transition(from, action, self.current_role) else {
            return Err(self.reject(ContractError::InvalidState {
                status: from,
                action: verb,
            }));
        };

        let comment = comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        self.contract.record_transition(to, action, self.current_role, comment);
        self.error = None;

        info!(
            contract_id = %self.contract.id,
            from = %from,
            to = %to,
            action = %action,
            role = %self.current_role,
            version = self.contract.version_number,
            "Contract status transition"
        );
        Ok(to)
    }

    fn reject(&mut self, err: ContractError) -> ContractError {
        warn!(
            contract_id = %self.contract.id,
            status = %self.contract.status,
            role = %self.current_role,
            error = %err,
            "Contract action rejected"
        );
        self.error = Some(err.to_string());
        err
    }

    fn api_failure(&mut self, err: ApiError) -> ContractError {
        error!(contract_id = %self.contract.id, error = %err, "Contract backend call failed");
        self.error = Some(err.to_string());
        ContractError::Api(err)
    }
}
