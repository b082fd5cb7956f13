// Contract status table - role-gated transitions between the seven negotiation states

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::roles::PartyRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    #[serde(rename = "Waiting for Contract Draft")]
    WaitingForDraft,
    #[serde(rename = "Awaiting Client Review")]
    AwaitingClientReview,
    #[serde(rename = "Awaiting Contractor Review")]
    AwaitingContractorReview,
    #[serde(rename = "Awaiting Client Modification")]
    AwaitingClientModification,
    #[serde(rename = "Approved - Awaiting Signatures")]
    ApprovedAwaitingSignatures,
    #[serde(rename = "Awaiting Contractor Signature")]
    AwaitingContractorSignature,
    #[serde(rename = "Signed - Active")]
    SignedActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractAction {
    Send,
    RequestChanges,
    Approve,
    Sign,
}

/// (from, action, acting role, to)
const TRANSITIONS: [(ContractStatus, ContractAction, PartyRole, ContractStatus); 6] = [
    (
        ContractStatus::AwaitingClientReview,
        ContractAction::Send,
        PartyRole::Client,
        ContractStatus::AwaitingContractorReview,
    ),
    (
        ContractStatus::AwaitingContractorReview,
        ContractAction::RequestChanges,
        PartyRole::Contractor,
        ContractStatus::AwaitingClientModification,
    ),
    (
        ContractStatus::AwaitingContractorReview,
        ContractAction::Approve,
        PartyRole::Contractor,
        ContractStatus::ApprovedAwaitingSignatures,
    ),
    (
        ContractStatus::AwaitingClientModification,
        ContractAction::Send,
        PartyRole::Client,
        ContractStatus::AwaitingContractorReview,
    ),
    (
        ContractStatus::ApprovedAwaitingSignatures,
        ContractAction::Sign,
        PartyRole::Client,
        ContractStatus::AwaitingContractorSignature,
    ),
    (
        ContractStatus::AwaitingContractorSignature,
        ContractAction::Sign,
        PartyRole::Contractor,
        ContractStatus::SignedActive,
    ),
];

/// Look up the transition table. `None` when the combination is not allowed.
pub fn try_transition(
    status: ContractStatus,
    action: ContractAction,
    role: PartyRole,
) -> Option<ContractStatus> {
    TRANSITIONS
        .iter()
        .find(|(from, a, r, _)| *from == status && *a == action && *r == role)
        .map(|(_, _, _, to)| *to)
}

/// Next status for the given action, or `status` unchanged when the
/// combination is not in the table.
pub fn next_status(status: ContractStatus, action: ContractAction, role: PartyRole) -> ContractStatus {
    try_transition(status, action, role).unwrap_or(status)
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 7] = [
        ContractStatus::WaitingForDraft,
        ContractStatus::AwaitingClientReview,
        ContractStatus::AwaitingContractorReview,
        ContractStatus::AwaitingClientModification,
        ContractStatus::ApprovedAwaitingSignatures,
        ContractStatus::AwaitingContractorSignature,
        ContractStatus::SignedActive,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ContractStatus::WaitingForDraft => "Waiting for Contract Draft",
            ContractStatus::AwaitingClientReview => "Awaiting Client Review",
            ContractStatus::AwaitingContractorReview => "Awaiting Contractor Review",
            ContractStatus::AwaitingClientModification => "Awaiting Client Modification",
            ContractStatus::ApprovedAwaitingSignatures => "Approved - Awaiting Signatures",
            ContractStatus::AwaitingContractorSignature => "Awaiting Contractor Signature",
            ContractStatus::SignedActive => "Signed - Active",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ContractStatus::SignedActive)
    }

    /// States in which the client may edit additional clauses.
    pub fn allows_clause_editing(&self) -> bool {
        matches!(
            self,
            ContractStatus::AwaitingClientReview | ContractStatus::AwaitingClientModification
        )
    }

    pub fn is_signing(&self) -> bool {
        matches!(
            self,
            ContractStatus::ApprovedAwaitingSignatures | ContractStatus::AwaitingContractorSignature
        )
    }

    pub fn is_negotiating(&self) -> bool {
        matches!(
            self,
            ContractStatus::AwaitingClientReview
                | ContractStatus::AwaitingContractorReview
                | ContractStatus::AwaitingClientModification
        )
    }

    /// The party whose action the contract is waiting on, if any.
    pub fn awaiting_party(&self) -> Option<PartyRole> {
        TRANSITIONS
            .iter()
            .find(|(from, ..)| from == self)
            .map(|(_, _, role, _)| *role)
    }

    /// Actions from the table that `role` may take in this state.
    pub fn available_actions(&self, role: PartyRole) -> Vec<ContractAction> {
        TRANSITIONS
            .iter()
            .filter(|(from, _, r, _)| from == self && *r == role)
            .map(|(_, action, _, _)| *action)
            .collect()
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown contract status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ContractStatus {
    type Err = UnknownStatus;

    /// Accepts either the display label or a snake_case key
    /// (`awaiting_client_review`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let normalized = wanted.to_ascii_lowercase().replace([' ', '-'], "_");
        ContractStatus::ALL
            .iter()
            .copied()
            .find(|status| {
                let label = status.label();
                let key = label
                    .to_ascii_lowercase()
                    .replace(" - ", "_")
                    .replace([' ', '-'], "_");
                label == wanted || key == normalized
            })
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl fmt::Display for ContractAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractAction::Send => "send",
            ContractAction::RequestChanges => "request_changes",
            ContractAction::Approve => "approve",
            ContractAction::Sign => "sign",
        };
        f.write_str(name)
    }
}
