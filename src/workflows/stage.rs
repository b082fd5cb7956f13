// Project lifecycle stages - derived from project, offer and contract status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::contracts::ContractStatus;
use crate::roles::PartyRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    Published,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Draft,
    AwaitingOffers,
    ReviewingOffers,
    ContractDrafting,
    ContractNegotiation,
    ContractSigning,
    Execution,
    Closed,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for ProjectStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "draft" => Ok(ProjectStatus::Draft),
            "published" => Ok(ProjectStatus::Published),
            "in_progress" => Ok(ProjectStatus::InProgress),
            "completed" => Ok(ProjectStatus::Completed),
            "cancelled" => Ok(ProjectStatus::Cancelled),
            other => Err(ParseStatusError {
                kind: "project status",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for OfferStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(OfferStatus::Pending),
            "accepted" => Ok(OfferStatus::Accepted),
            "rejected" => Ok(OfferStatus::Rejected),
            "withdrawn" => Ok(OfferStatus::Withdrawn),
            other => Err(ParseStatusError {
                kind: "offer status",
                value: other.to_string(),
            }),
        }
    }
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Draft,
        Stage::AwaitingOffers,
        Stage::ReviewingOffers,
        Stage::ContractDrafting,
        Stage::ContractNegotiation,
        Stage::ContractSigning,
        Stage::Execution,
        Stage::Closed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Draft => "Draft",
            Stage::AwaitingOffers => "Awaiting Offers",
            Stage::ReviewingOffers => "Reviewing Offers",
            Stage::ContractDrafting => "Contract Drafting",
            Stage::ContractNegotiation => "Contract Negotiation",
            Stage::ContractSigning => "Contract Signing",
            Stage::Execution => "In Execution",
            Stage::Closed => "Closed",
        }
    }

    /// 1-based position in the lifecycle.
    pub fn position(&self) -> usize {
        Stage::ALL.iter().position(|s| s == self).map_or(0, |i| i + 1)
    }

    pub fn progress_percent(&self) -> u8 {
        ((self.position() * 100) / Stage::ALL.len()) as u8
    }

    pub fn involves_contract(&self) -> bool {
        matches!(
            self,
            Stage::ContractDrafting | Stage::ContractNegotiation | Stage::ContractSigning
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the stage derivation looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub project_id: String,
    pub project_status: ProjectStatus,
    /// Status of the most relevant offer (the accepted one, if any).
    pub offer_status: Option<OfferStatus>,
    pub pending_offers: u32,
    pub contract_id: Option<String>,
    pub contract_status: Option<ContractStatus>,
}

impl ProjectContext {
    pub fn new(project_id: impl Into<String>, project_status: ProjectStatus) -> Self {
        Self {
            project_id: project_id.into(),
            project_status,
            offer_status: None,
            pending_offers: 0,
            contract_id: None,
            contract_status: None,
        }
    }

    pub fn with_offer(mut self, status: OfferStatus, pending_offers: u32) -> Self {
        self.offer_status = Some(status);
        self.pending_offers = pending_offers;
        self
    }

    pub fn with_contract(mut self, contract_id: impl Into<String>, status: ContractStatus) -> Self {
        self.contract_id = Some(contract_id.into());
        self.contract_status = Some(status);
        self
    }
}

/// First matching rule wins.
pub fn derive_stage(ctx: &ProjectContext) -> Stage {
    use ContractStatus as C;

    match ctx.project_status {
        ProjectStatus::Completed | ProjectStatus::Cancelled => return Stage::Closed,
        ProjectStatus::Draft => return Stage::Draft,
        ProjectStatus::InProgress => return Stage::Execution,
        ProjectStatus::Published => {}
    }

    match ctx.contract_status {
        Some(C::SignedActive) => return Stage::Execution,
        Some(C::ApprovedAwaitingSignatures | C::AwaitingContractorSignature) => {
            return Stage::ContractSigning
        }
        Some(C::AwaitingClientReview | C::AwaitingContractorReview | C::AwaitingClientModification) => {
            return Stage::ContractNegotiation
        }
        Some(C::WaitingForDraft) | None => {}
    }

    if ctx.offer_status == Some(OfferStatus::Accepted) || ctx.contract_status == Some(C::WaitingForDraft) {
        return Stage::ContractDrafting;
    }
    if ctx.pending_offers > 0 {
        return Stage::ReviewingOffers;
    }
    Stage::AwaitingOffers
}

/// Navigation target for `viewer` at `stage`.
pub fn route_for(stage: Stage, viewer: PartyRole, ctx: &ProjectContext) -> String {
    let project = format!("/projects/{}", ctx.project_id);
    let contract = ctx.contract_id.as_ref().map(|id| format!("/contracts/{id}"));

    match (stage, viewer) {
        (Stage::Draft, PartyRole::Client) => format!("{project}/edit"),
        (Stage::Draft, PartyRole::Contractor) => "/projects".to_string(),
        (Stage::AwaitingOffers, PartyRole::Client) => project,
        (Stage::AwaitingOffers, PartyRole::Contractor) => format!("{project}/submit-offer"),
        (Stage::ReviewingOffers, PartyRole::Client) => format!("{project}/offers"),
        (Stage::ReviewingOffers, PartyRole::Contractor) => format!("{project}/my-offer"),
        (Stage::ContractDrafting, _) => contract.unwrap_or_else(|| format!("{project}/contract")),
        (Stage::ContractNegotiation, _) => contract.unwrap_or(project),
        (Stage::ContractSigning, _) => {
            let awaiting = ctx.contract_status.and_then(|s| s.awaiting_party());
            match contract {
                Some(contract) if awaiting == Some(viewer) => format!("{contract}/sign"),
                Some(contract) => contract,
                None => project,
            }
        }
        (Stage::Execution, _) => format!("{project}/execution"),
        (Stage::Closed, _) => format!("{project}/summary"),
    }
}
