// BuildBridge Library - contract negotiation, onboarding and project workflow state
// This exposes the core components for the CLI, demos and integration tests

pub mod api;
pub mod config;
pub mod contracts;
pub mod otp;
pub mod registration;
pub mod roles;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use api::{ApiError, ApiResponse, ContractApi, MockBackend, RegistrationApi};
pub use config::{config, BuildBridgeConfig};
pub use contracts::{
    next_status, Contract, ContractAction, ContractError, ContractNegotiation, ContractStatus,
    SignedDocument, SignedUploadFlow, SigningError,
};
pub use otp::{OtpTicket, ResendCooldown};
pub use registration::{RegistrationError, RegistrationFlow, RoleData, StepKey};
pub use roles::{PartyRole, Role};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use workflows::{ProjectContext, Stage, WorkflowOrchestrator, WorkflowSnapshot};
