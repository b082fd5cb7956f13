// Step completion predicates and field format checks

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

use super::steps::StepKey;
use crate::roles::Role;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("valid email regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{7,14}$").expect("valid phone regex"));
static COUNTRY_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\d{1,4}$").expect("valid country code regex"));
static COMMERCIAL_REGISTRATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("valid registration regex"));
static IBAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}\d{2}[A-Z0-9]{10,30}$").expect("valid iban regex"));

pub const MIN_PASSWORD_LEN: usize = 8;

/// Free-form key/value bag collected across steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleData(BTreeMap<String, Value>);

impl RoleData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str).map(str::trim)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether the value counts as filled in.
    pub fn is_filled(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(_)) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FieldIssue {
    #[error("{0} is required")]
    Missing(String),
    #[error("{field} {reason}")]
    Invalid { field: String, reason: String },
}

impl FieldIssue {
    pub fn field(&self) -> &str {
        match self {
            FieldIssue::Missing(field) => field,
            FieldIssue::Invalid { field, .. } => field,
        }
    }

    fn invalid(field: &str, reason: &str) -> Self {
        FieldIssue::Invalid {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Fields that must be filled before leaving `step`. The verification step
/// has no fields; it is gated on a confirmed code instead.
pub fn required_fields(role: Role, step: StepKey) -> &'static [&'static str] {
    match step {
        StepKey::PersonalInfo if role == Role::Individual => {
            &["full_name", "email", "country_code", "phone", "national_id"]
        }
        StepKey::PersonalInfo => &["full_name", "email", "country_code", "phone"],
        StepKey::ProfessionalInfo => &[
            "engineering_license_number",
            "specialization",
            "years_of_experience",
        ],
        StepKey::Portfolio => &[],
        StepKey::CompanyInfo => &["company_name", "commercial_registration", "city", "country"],
        StepKey::OfficeInfo => &["office_name", "commercial_registration", "city", "country"],
        StepKey::OrganizationInfo => &[
            "organization_name",
            "organization_type",
            "email",
            "country_code",
            "phone",
        ],
        StepKey::ContactPerson => &["contact_name", "contact_email", "country_code", "contact_phone"],
        StepKey::CommercialDocuments => &["commercial_registration_document", "tax_certificate"],
        StepKey::ProductCategories => &["product_categories"],
        StepKey::BankDetails => &["bank_name", "iban"],
        StepKey::Classification => &["classification_grade", "specialties"],
        StepKey::PreviousProjects => &["previous_projects"],
        StepKey::Licenses => &["engineering_license_number", "license_document"],
        StepKey::Specializations => &["specializations"],
        StepKey::AccountSecurity => &["password", "confirm_password", "terms_accepted"],
        StepKey::Verification => &[],
    }
}

pub fn missing_fields(role: Role, step: StepKey, data: &RoleData) -> Vec<&'static str> {
    required_fields(role, step)
        .iter()
        .copied()
        .filter(|field| !data.is_filled(field))
        .collect()
}

/// All problems blocking `step`: missing fields first, then format errors
/// on the fields that are present.
pub fn validate_step(role: Role, step: StepKey, data: &RoleData) -> Vec<FieldIssue> {
    let mut issues: Vec<FieldIssue> = missing_fields(role, step, data)
        .into_iter()
        .map(|field| FieldIssue::Missing(field.to_string()))
        .collect();

    for field in required_fields(role, step) {
        if data.is_filled(field) {
            if let Some(issue) = check_format(field, data) {
                issues.push(issue);
            }
        }
    }
    issues
}

fn check_format(field: &str, data: &RoleData) -> Option<FieldIssue> {
    let text = data.get_str(field);
    match field {
        "email" | "contact_email" => match text {
            Some(value) if EMAIL_RE.is_match(value) => None,
            _ => Some(FieldIssue::invalid(field, "must be a valid email address")),
        },
        "phone" | "contact_phone" => match text {
            Some(value) if PHONE_RE.is_match(&normalize_digits(value)) => None,
            _ => Some(FieldIssue::invalid(field, "must be a valid phone number")),
        },
        "country_code" => match text {
            Some(value) if COUNTRY_CODE_RE.is_match(value) => None,
            _ => Some(FieldIssue::invalid(field, "must look like +966")),
        },
        "commercial_registration" => match text {
            Some(value) if COMMERCIAL_REGISTRATION_RE.is_match(value) => None,
            _ => Some(FieldIssue::invalid(field, "must be exactly 10 digits")),
        },
        "iban" => match text {
            Some(value) if IBAN_RE.is_match(&normalize_iban(value)) => None,
            _ => Some(FieldIssue::invalid(field, "must be a valid IBAN")),
        },
        "password" => match text {
            Some(value) if is_strong_password(value) => None,
            _ => Some(FieldIssue::invalid(
                field,
                "must be at least 8 characters and contain a letter and a digit",
            )),
        },
        "confirm_password" => {
            if data.get("confirm_password") == data.get("password") {
                None
            } else {
                Some(FieldIssue::invalid(field, "does not match the password"))
            }
        }
        "years_of_experience" => {
            let years = data
                .get(field)
                .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())));
            match years {
                Some(years) if years <= 60 => None,
                _ => Some(FieldIssue::invalid(field, "must be a number between 0 and 60")),
            }
        }
        _ => None,
    }
}

fn normalize_digits(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect()
}

fn normalize_iban(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

fn is_strong_password(value: &str) -> bool {
    value.chars().count() >= MIN_PASSWORD_LEN
        && value.chars().any(|c| c.is_alphabetic())
        && value.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_filled_semantics() {
        let mut data = RoleData::new();
        data.set("blank", "   ");
        data.set("list", json!([]));
        data.set("terms", false);
        data.set("null", Value::Null);
        data.set("years", 0);
        assert!(!data.is_filled("blank"));
        assert!(!data.is_filled("list"));
        assert!(!data.is_filled("terms"));
        assert!(!data.is_filled("null"));
        assert!(!data.is_filled("absent"));
        assert!(data.is_filled("years"));
    }

    #[test]
    fn test_missing_fields_for_personal_info() {
        let mut data = RoleData::new();
        data.set("full_name", "Sara Ahmed");
        data.set("email", "sara@example.com");
        let missing = missing_fields(Role::FreelanceEngineer, StepKey::PersonalInfo, &data);
        assert_eq!(missing, vec!["country_code", "phone"]);

        let missing = missing_fields(Role::Individual, StepKey::PersonalInfo, &data);
        assert_eq!(missing, vec!["country_code", "phone", "national_id"]);
    }

    #[test]
    fn test_format_checks() {
        let mut data = RoleData::new();
        data.set("full_name", "Sara Ahmed");
        data.set("email", "not-an-email");
        data.set("country_code", "966");
        data.set("phone", "50 123 4567");
        let issues = validate_step(Role::FreelanceEngineer, StepKey::PersonalInfo, &data);
        let fields: Vec<&str> = issues.iter().map(FieldIssue::field).collect();
        assert_eq!(fields, vec!["email", "country_code"]);
    }

    #[test]
    fn test_account_security_checks() {
        let mut data = RoleData::new();
        data.set("password", "short1");
        data.set("confirm_password", "short2");
        data.set("terms_accepted", true);
        let issues = validate_step(Role::Individual, StepKey::AccountSecurity, &data);
        assert_eq!(issues.len(), 2);

        data.set("password", "buildbridge2026");
        data.set("confirm_password", "buildbridge2026");
        assert!(validate_step(Role::Individual, StepKey::AccountSecurity, &data).is_empty());

        data.set("terms_accepted", false);
        assert_eq!(
            validate_step(Role::Individual, StepKey::AccountSecurity, &data),
            vec![FieldIssue::Missing("terms_accepted".to_string())]
        );
    }

    #[test]
    fn test_business_identifiers() {
        let mut data = RoleData::new();
        data.set("bank_name", "National Bank");
        data.set("iban", "sa03 8000 0000 6080 1016 7519");
        assert!(validate_step(Role::Supplier, StepKey::BankDetails, &data).is_empty());

        data.set("iban", "12345");
        assert_eq!(validate_step(Role::Supplier, StepKey::BankDetails, &data).len(), 1);

        let mut company = RoleData::new();
        company.set("company_name", "Al Bina Co.");
        company.set("commercial_registration", "10102030");
        company.set("city", "Riyadh");
        company.set("country", "SA");
        let issues = validate_step(Role::Contractor, StepKey::CompanyInfo, &company);
        assert_eq!(issues[0].field(), "commercial_registration");
    }

    #[test]
    fn test_years_of_experience_accepts_numbers_and_strings() {
        let mut data = RoleData::new();
        data.set("engineering_license_number", "ENG-5521");
        data.set("specialization", "structural");
        data.set("years_of_experience", "12");
        assert!(validate_step(Role::FreelanceEngineer, StepKey::ProfessionalInfo, &data).is_empty());
        data.set("years_of_experience", 99);
        assert_eq!(
            validate_step(Role::FreelanceEngineer, StepKey::ProfessionalInfo, &data).len(),
            1
        );
    }
}
