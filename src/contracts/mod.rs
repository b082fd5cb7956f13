// Contract negotiation and signing

pub mod model;
pub mod negotiation;
pub mod signing;
pub mod status;

pub use model::{Clause, Contract, VersionEntry};
pub use negotiation::{ContractError, ContractNegotiation};
pub use signing::{SignedDocument, SignedUploadFlow, SigningError};
pub use status::{next_status, try_transition, ContractAction, ContractStatus};
