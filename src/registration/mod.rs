// Multi-role registration / onboarding

pub mod flow;
pub mod steps;
pub mod validation;

pub use flow::{RegistrationError, RegistrationFlow, RegistrationSubmission, StepProgress};
pub use steps::{step_index, steps_for, StepKey};
pub use validation::{missing_fields, required_fields, validate_step, FieldIssue, RoleData};
