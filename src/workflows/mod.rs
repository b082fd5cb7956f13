// Workflow orchestration modules
// Project lifecycle stages and navigation targets

pub mod orchestrator;
pub mod stage;

pub use orchestrator::{StageChangeRecord, WorkflowAction, WorkflowOrchestrator, WorkflowSnapshot};
pub use stage::{derive_stage, route_for, OfferStatus, ProjectContext, ProjectStatus, Stage};
