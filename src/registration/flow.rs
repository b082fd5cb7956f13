// Registration flow store - role selection, step navigation, verification, submission

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use super::steps::{step_index, steps_for, StepKey};
use super::validation::{validate_step, FieldIssue, RoleData};
use crate::api::{ApiError, RegistrationApi, RegistrationReceipt};
use crate::otp::{OtpTicket, ResendCooldown};
use crate::roles::Role;

/// Fields never sent to the backend.
const LOCAL_ONLY_FIELDS: &[&str] = &["confirm_password"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSubmission {
    pub role: Role,
    pub data: RoleData,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepProgress {
    /// 1-based position of the current step.
    pub index: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Please select an account type first")]
    NoRoleSelected,
    #[error("Please complete the required fields: {}", format_issues(.0))]
    StepIncomplete(Vec<FieldIssue>),
    #[error("Step {step} is not part of this registration")]
    UnknownStep { step: StepKey },
    #[error("You can only go back to steps you have already visited")]
    StepNotReached,
    #[error("Registration can only be submitted from the last step")]
    NotOnLastStep,
    #[error("Please verify your phone number or email first")]
    NotVerified,
    #[error("Add a phone number or email to receive the verification code")]
    NoVerificationTarget,
    #[error("Please wait {}s before requesting a new code", .0.as_secs().max(1))]
    CooldownActive(Duration),
    #[error("Request a verification code first")]
    NoActiveCode,
    #[error("Verification code is required")]
    EmptyCode,
    #[error("{0}")]
    Api(ApiError),
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug)]
pub struct RegistrationFlow {
    current_role: Option<Role>,
    current_step: usize,
    role_data: RoleData,
    ticket: Option<OtpTicket>,
    cooldown: ResendCooldown,
    verified: bool,
    receipt: Option<RegistrationReceipt>,
    pub error: Option<String>,
    pub is_loading: bool,
}

impl RegistrationFlow {
    pub fn new(resend_cooldown: Duration) -> Self {
        Self {
            current_role: None,
            current_step: 0,
            role_data: RoleData::new(),
            ticket: None,
            cooldown: ResendCooldown::new(resend_cooldown),
            verified: false,
            receipt: None,
            error: None,
            is_loading: false,
        }
    }

    pub fn current_role(&self) -> Option<Role> {
        self.current_role
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn role_data(&self) -> &RoleData {
        &self.role_data
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn ticket(&self) -> Option<&OtpTicket> {
        self.ticket.as_ref()
    }

    pub fn receipt(&self) -> Option<&RegistrationReceipt> {
        self.receipt.as_ref()
    }

    pub fn resend_available_in(&self) -> Duration {
        self.cooldown.remaining()
    }

    pub fn steps(&self) -> &'static [StepKey] {
        self.current_role.map(steps_for).unwrap_or(&[])
    }

    pub fn step_count(&self) -> usize {
        self.steps().len()
    }

    pub fn current_step_key(&self) -> Option<StepKey> {
        self.steps().get(self.current_step).copied()
    }

    pub fn is_last_step(&self) -> bool {
        self.step_count() > 0 && self.current_step + 1 == self.step_count()
    }

    pub fn progress(&self) -> Option<StepProgress> {
        let total = self.step_count();
        if total == 0 {
            return None;
        }
        let index = self.current_step + 1;
        Some(StepProgress {
            index,
            total,
            percent: ((index * 100) / total) as u8,
        })
    }

    /// Start over with `role`. Data entered for a previous role is dropped.
    pub fn select_role(&mut self, role: Role) {
        self.reset();
        self.current_role = Some(role);
        info!(role = %role.key(), steps = steps_for(role).len(), "Registration role selected");
    }

    /// Back to the unselected-role state.
    pub fn reset(&mut self) {
        self.current_role = None;
        self.current_step = 0;
        self.role_data.clear();
        self.ticket = None;
        self.cooldown.clear();
        self.verified = false;
        self.receipt = None;
        self.error = None;
        self.is_loading = false;
    }

    /// Move forward one step, staying on the last step.
    pub fn advance(&mut self) {
        let total = self.step_count();
        if total == 0 {
            return;
        }
        self.current_step = (self.current_step + 1).min(total - 1);
        self.error = None;
    }

    /// Move back one step. Going back from the first step abandons the role.
    pub fn retreat(&mut self) {
        if self.current_step == 0 {
            self.reset();
            return;
        }
        self.current_step -= 1;
        self.error = None;
    }

    /// Jump back to a step already reached.
    pub fn go_to(&mut self, step: StepKey) -> Result<(), RegistrationError> {
        let Some(role) = self.current_role else {
            return Err(self.reject(RegistrationError::NoRoleSelected));
        };
        match step_index(role, step) {
            None => Err(self.reject(RegistrationError::UnknownStep { step })),
            Some(index) if index > self.current_step => Err(self.reject(RegistrationError::StepNotReached)),
            Some(index) => {
                self.current_step = index;
                self.error = None;
                Ok(())
            }
        }
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let is_contact = matches!(
            key.as_str(),
            "phone" | "contact_phone" | "email" | "contact_email" | "country_code"
        );
        // A new delivery target invalidates the verification and any code in flight
        if is_contact && self.role_data.get(&key) != Some(&value) {
            if self.verified || self.ticket.is_some() {
                info!(field = %key, "Contact changed, verification restarted");
            }
            self.verified = false;
            self.ticket = None;
            self.cooldown.clear();
        }
        self.role_data.set(key, value);
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.role_data.get(key)
    }

    /// Problems blocking the current step.
    pub fn current_step_issues(&self) -> Vec<FieldIssue> {
        match (self.current_role, self.current_step_key()) {
            (Some(role), Some(step)) => validate_step(role, step, &self.role_data),
            _ => Vec::new(),
        }
    }

    pub fn is_step_complete(&self, step: StepKey) -> bool {
        let Some(role) = self.current_role else {
            return false;
        };
        if step == StepKey::Verification {
            return self.verified;
        }
        validate_step(role, step, &self.role_data).is_empty()
    }

    /// Advance only when the current step validates.
    pub fn advance_if_complete(&mut self) -> Result<(), RegistrationError> {
        let Some(step) = self.current_step_key() else {
            return Err(self.reject(RegistrationError::NoRoleSelected));
        };
        if step == StepKey::Verification && !self.verified {
            return Err(self.reject(RegistrationError::NotVerified));
        }
        let issues = self.current_step_issues();
        if !issues.is_empty() {
            return Err(self.reject(RegistrationError::StepIncomplete(issues)));
        }
        self.advance();
        Ok(())
    }

    /// Phone (with country code) when present, otherwise email.
    fn verification_target(&self) -> Option<String> {
        let code = self.role_data.get_str("country_code").unwrap_or("");
        for key in ["phone", "contact_phone"] {
            if let Some(phone) = self.role_data.get_str(key).filter(|p| !p.is_empty()) {
                return Some(format!("{code}{}", phone.replace([' ', '-'], "")));
            }
        }
        ["email", "contact_email"]
            .iter()
            .find_map(|key| self.role_data.get_str(key).filter(|e| !e.is_empty()))
            .map(str::to_string)
    }

    pub async fn send_code<A: RegistrationApi + ?Sized>(&mut self, api: &A) -> Result<&OtpTicket, RegistrationError> {
        let Some(role) = self.current_role else {
            return Err(self.reject(RegistrationError::NoRoleSelected));
        };
        if !self.cooldown.is_ready() {
            return Err(self.reject(RegistrationError::CooldownActive(self.cooldown.remaining())));
        }
        let Some(target) = self.verification_target() else {
            return Err(self.reject(RegistrationError::NoVerificationTarget));
        };

        self.is_loading = true;
        let result = api
            .send_verification_code(role, &target)
            .await
            .and_then(|r| r.into_result());
        self.is_loading = false;

        match result {
            Ok(ticket) => {
                info!(role = %role.key(), ticket_id = %ticket.ticket_id, destination = %ticket.destination, "Verification code sent");
                self.cooldown.start();
                self.verified = false;
                self.error = None;
                Ok(&*self.ticket.insert(ticket))
            }
            Err(e) => Err(self.api_failure(e)),
        }
    }

    pub async fn verify_code<A: RegistrationApi + ?Sized>(&mut self, api: &A, code: &str) -> Result<(), RegistrationError> {
        let Some(ticket_id) = self.ticket.as_ref().map(|t| t.ticket_id.clone()) else {
            return Err(self.reject(RegistrationError::NoActiveCode));
        };
        if code.trim().is_empty() {
            return Err(self.reject(RegistrationError::EmptyCode));
        }

        self.is_loading = true;
        let result = api.verify_code(&ticket_id, code).await.and_then(|r| r.into_ack());
        self.is_loading = false;

        match result {
            Ok(_) => {
                info!(ticket_id = %ticket_id, "Registration contact verified");
                self.verified = true;
                self.ticket = None;
                self.error = None;
                Ok(())
            }
            // The ticket stays so the user can retry until a new code is requested
            Err(e) => Err(self.api_failure(e)),
        }
    }

    /// Submit everything collected. Only allowed from the last step once every
    /// step validates.
    pub async fn submit<A: RegistrationApi + ?Sized>(&mut self, api: &A) -> Result<&RegistrationReceipt, RegistrationError> {
        let Some(role) = self.current_role else {
            return Err(self.reject(RegistrationError::NoRoleSelected));
        };
        if !self.is_last_step() {
            return Err(self.reject(RegistrationError::NotOnLastStep));
        }

        let mut issues = Vec::new();
        for step in steps_for(role) {
            if *step == StepKey::Verification {
                if !self.verified {
                    return Err(self.reject(RegistrationError::NotVerified));
                }
                continue;
            }
            issues.extend(validate_step(role, *step, &self.role_data));
        }
        if !issues.is_empty() {
            return Err(self.reject(RegistrationError::StepIncomplete(issues)));
        }

        let mut data = self.role_data.clone();
        for field in LOCAL_ONLY_FIELDS {
            data.remove(field);
        }
        let submission = RegistrationSubmission {
            role,
            data,
            submitted_at: Utc::now(),
        };

        self.is_loading = true;
        let result = api
            .submit_registration(&submission)
            .await
            .and_then(|r| r.into_result());
        self.is_loading = false;

        match result {
            Ok(receipt) => {
                info!(role = %role.key(), account_id = %receipt.account_id, pending_review = receipt.pending_review, "Registration submitted");
                self.error = None;
                Ok(&*self.receipt.insert(receipt))
            }
            Err(e) => Err(self.api_failure(e)),
        }
    }

    fn reject(&mut self, err: RegistrationError) -> RegistrationError {
        warn!(
            role = ?self.current_role,
            step = ?self.current_step_key(),
            error = %err,
            "Registration action rejected"
        );
        self.error = Some(err.to_string());
        err
    }

    fn api_failure(&mut self, err: ApiError) -> RegistrationError {
        error!(
            role = ?self.current_role,
            transient = err.is_transient(),
            error = %err,
            "Registration backend call failed"
        );
        self.error = Some(err.to_string());
        RegistrationError::Api(err)
    }
}
