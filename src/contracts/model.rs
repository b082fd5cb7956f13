// Contract entity - versioned, append-only negotiation history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{ContractAction, ContractStatus};
use crate::roles::PartyRole;

/// Free-text addendum editable by the client during review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub id: String,
    pub text: String,
}

impl Clause {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub version_number: u32,
    pub modified_by: PartyRole,
    pub modified_at: DateTime<Utc>,
    /// `None` for the entry recorded at creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ContractAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub version_number: u32,
    pub status: ContractStatus,
    pub version_history: Vec<VersionEntry>,
    /// Server-supplied, never edited client-side.
    pub standard_clauses: Vec<String>,
    pub additional_clauses: Vec<Clause>,
    pub last_negotiation_comment: Option<String>,
    #[serde(rename = "clientSignedPDF_URL")]
    pub client_signed_pdf_url: Option<String>,
    #[serde(rename = "contractorSignedPDF_URL")]
    pub contractor_signed_pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Demo contract used when a negotiation is reset.
    pub fn seed(project_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("contract-{}", Uuid::new_v4().simple()),
            project_id: project_id.into(),
            title: "Construction Services Agreement".to_string(),
            version_number: 1,
            status: ContractStatus::AwaitingClientReview,
            version_history: vec![VersionEntry {
                version_number: 1,
                modified_by: PartyRole::Contractor,
                modified_at: now,
                action: None,
                comment: Some("Initial draft generated from accepted offer".to_string()),
            }],
            standard_clauses: vec![
                "The contractor shall complete the works in accordance with the approved drawings and specifications.".to_string(),
                "Payments are released against certified progress milestones.".to_string(),
                "Either party may terminate with thirty days written notice for material breach.".to_string(),
                "Disputes are resolved by arbitration in the project's jurisdiction.".to_string(),
            ],
            additional_clauses: Vec::new(),
            last_negotiation_comment: None,
            client_signed_pdf_url: None,
            contractor_signed_pdf_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an accepted transition: bumps the version and appends exactly
    /// one history entry attributed to `by`.
    pub(crate) fn record_transition(
        &mut self,
        to: ContractStatus,
        action: ContractAction,
        by: PartyRole,
        comment: Option<String>,
    ) {
        let now = Utc::now();
        self.version_number += 1;
        self.status = to;
        self.updated_at = now;
        self.version_history.push(VersionEntry {
            version_number: self.version_number,
            modified_by: by,
            modified_at: now,
            action: Some(action),
            comment,
        });
    }

    pub fn signed_pdf_url(&self, party: PartyRole) -> Option<&str> {
        match party {
            PartyRole::Client => self.client_signed_pdf_url.as_deref(),
            PartyRole::Contractor => self.contractor_signed_pdf_url.as_deref(),
        }
    }

    pub(crate) fn set_signed_pdf_url(&mut self, party: PartyRole, url: String) {
        match party {
            PartyRole::Client => self.client_signed_pdf_url = Some(url),
            PartyRole::Contractor => self.contractor_signed_pdf_url = Some(url),
        }
    }

    pub fn latest_version(&self) -> Option<&VersionEntry> {
        self.version_history.last()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.client_signed_pdf_url.is_some() && self.contractor_signed_pdf_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_contract_starts_at_version_one() {
        let contract = Contract::seed("project-1");
        assert_eq!(contract.version_number, 1);
        assert_eq!(contract.version_history.len(), 1);
        assert_eq!(contract.status, ContractStatus::AwaitingClientReview);
        assert!(contract.additional_clauses.is_empty());
        assert!(!contract.is_fully_signed());
    }

    #[test]
    fn test_record_transition_bumps_version_and_history() {
        let mut contract = Contract::seed("project-1");
        contract.record_transition(
            ContractStatus::AwaitingContractorReview,
            ContractAction::Send,
            PartyRole::Client,
            Some("Please review".to_string()),
        );

        assert_eq!(contract.version_number, 2);
        assert_eq!(contract.version_history.len(), 2);
        let latest = contract.latest_version().unwrap();
        assert_eq!(latest.version_number, 2);
        assert_eq!(latest.modified_by, PartyRole::Client);
        assert_eq!(latest.action, Some(ContractAction::Send));
        assert_eq!(latest.comment.as_deref(), Some("Please review"));
    }

    #[test]
    fn test_contract_wire_field_names() {
        let contract = Contract::seed("project-1");
        let value = serde_json::to_value(&contract).unwrap();
        assert!(value.get("versionNumber").is_some());
        assert!(value.get("versionHistory").is_some());
        assert!(value.get("clientSignedPDF_URL").is_some());
        assert!(value.get("contractorSignedPDF_URL").is_some());
        assert_eq!(value["status"], "Awaiting Client Review");
    }
}
