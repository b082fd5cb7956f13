// Workflow orchestrator - turns a project context into a display snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use super::stage::{derive_stage, route_for, ProjectContext, Stage};
use crate::contracts::ContractAction;
use crate::roles::PartyRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    EditProject,
    PublishProject,
    BrowseProjects,
    SubmitOffer,
    ReviewOffers,
    WithdrawOffer,
    Contract(ContractAction),
    ViewContract,
    TrackProgress,
    ViewSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSnapshot {
    pub project_id: String,
    pub stage: Stage,
    pub label: String,
    pub step_index: usize,
    pub progress_percent: u8,
    pub route: String,
    /// Party expected to act next, when the stage waits on someone.
    pub pending_party: Option<PartyRole>,
    pub actions: Vec<WorkflowAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageChangeRecord {
    pub project_id: String,
    pub from_stage: Option<Stage>,
    pub to_stage: Stage,
    pub observed_at: DateTime<Utc>,
}

/// Derives snapshots for one viewer and remembers the last stage seen per
/// project so stage changes can be reported.
#[derive(Debug)]
pub struct WorkflowOrchestrator {
    viewer: PartyRole,
    last_stage: HashMap<String, Stage>,
    history: Vec<StageChangeRecord>,
}

impl WorkflowOrchestrator {
    pub fn new(viewer: PartyRole) -> Self {
        Self {
            viewer,
            last_stage: HashMap::new(),
            history: Vec::new(),
        }
    }

    pub fn viewer(&self) -> PartyRole {
        self.viewer
    }

    pub fn history(&self) -> &[StageChangeRecord] {
        &self.history
    }

    /// Pure derivation; no history is recorded.
    pub fn snapshot(&self, ctx: &ProjectContext) -> WorkflowSnapshot {
        let stage = derive_stage(ctx);
        let snapshot = WorkflowSnapshot {
            project_id: ctx.project_id.clone(),
            stage,
            label: stage.label().to_string(),
            step_index: stage.position(),
            progress_percent: stage.progress_percent(),
            route: route_for(stage, self.viewer, ctx),
            pending_party: pending_party(stage, ctx),
            actions: actions_for(stage, self.viewer, ctx),
        };
        debug!(
            project_id = %snapshot.project_id,
            stage = %snapshot.stage,
            route = %snapshot.route,
            "Workflow snapshot derived"
        );
        snapshot
    }

    /// Derive a snapshot and record a stage change if the project moved.
    pub fn observe(&mut self, ctx: &ProjectContext) -> WorkflowSnapshot {
        let snapshot = self.snapshot(ctx);
        let previous = self.last_stage.insert(ctx.project_id.clone(), snapshot.stage);
        if previous != Some(snapshot.stage) {
            info!(
                project_id = %ctx.project_id,
                from_stage = ?previous,
                to_stage = %snapshot.stage,
                "Project stage changed"
            );
            self.history.push(StageChangeRecord {
                project_id: ctx.project_id.clone(),
                from_stage: previous,
                to_stage: snapshot.stage,
                observed_at: Utc::now(),
            });
        }
        snapshot
    }
}

fn pending_party(stage: Stage, ctx: &ProjectContext) -> Option<PartyRole> {
    match stage {
        Stage::Draft | Stage::ReviewingOffers => Some(PartyRole::Client),
        Stage::AwaitingOffers => Some(PartyRole::Contractor),
        Stage::ContractNegotiation | Stage::ContractSigning => {
            ctx.contract_status.and_then(|s| s.awaiting_party())
        }
        Stage::ContractDrafting | Stage::Execution | Stage::Closed => None,
    }
}

fn actions_for(stage: Stage, viewer: PartyRole, ctx: &ProjectContext) -> Vec<WorkflowAction> {
    match (stage, viewer) {
        (Stage::Draft, PartyRole::Client) => vec![WorkflowAction::EditProject, WorkflowAction::PublishProject],
        (Stage::Draft, PartyRole::Contractor) => vec![WorkflowAction::BrowseProjects],
        (Stage::AwaitingOffers, PartyRole::Client) => vec![WorkflowAction::EditProject],
        (Stage::AwaitingOffers, PartyRole::Contractor) => vec![WorkflowAction::SubmitOffer],
        (Stage::ReviewingOffers, PartyRole::Client) => vec![WorkflowAction::ReviewOffers],
        (Stage::ReviewingOffers, PartyRole::Contractor) => vec![WorkflowAction::WithdrawOffer],
        (Stage::ContractDrafting, _) => vec![WorkflowAction::ViewContract],
        (Stage::ContractNegotiation | Stage::ContractSigning, _) => {
            let mut actions = vec![WorkflowAction::ViewContract];
            if let Some(status) = ctx.contract_status {
                actions.extend(
                    status
                        .available_actions(viewer)
                        .into_iter()
                        .map(WorkflowAction::Contract),
                );
            }
            actions
        }
        (Stage::Execution, _) => vec![WorkflowAction::TrackProgress, WorkflowAction::ViewContract],
        (Stage::Closed, _) => vec![WorkflowAction::ViewSummary],
    }
}
