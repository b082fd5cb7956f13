// Onboarding steps per role
//
// One table drives both the step counts shown to the user and navigation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKey {
    PersonalInfo,
    ProfessionalInfo,
    Portfolio,
    CompanyInfo,
    OfficeInfo,
    OrganizationInfo,
    ContactPerson,
    CommercialDocuments,
    ProductCategories,
    BankDetails,
    Classification,
    PreviousProjects,
    Licenses,
    Specializations,
    AccountSecurity,
    Verification,
}

impl StepKey {
    pub fn key(&self) -> &'static str {
        match self {
            StepKey::PersonalInfo => "personal_info",
            StepKey::ProfessionalInfo => "professional_info",
            StepKey::Portfolio => "portfolio",
            StepKey::CompanyInfo => "company_info",
            StepKey::OfficeInfo => "office_info",
            StepKey::OrganizationInfo => "organization_info",
            StepKey::ContactPerson => "contact_person",
            StepKey::CommercialDocuments => "commercial_documents",
            StepKey::ProductCategories => "product_categories",
            StepKey::BankDetails => "bank_details",
            StepKey::Classification => "classification",
            StepKey::PreviousProjects => "previous_projects",
            StepKey::Licenses => "licenses",
            StepKey::Specializations => "specializations",
            StepKey::AccountSecurity => "account_security",
            StepKey::Verification => "verification",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StepKey::PersonalInfo => "Personal Information",
            StepKey::ProfessionalInfo => "Professional Information",
            StepKey::Portfolio => "Portfolio",
            StepKey::CompanyInfo => "Company Information",
            StepKey::OfficeInfo => "Office Information",
            StepKey::OrganizationInfo => "Organization Information",
            StepKey::ContactPerson => "Contact Person",
            StepKey::CommercialDocuments => "Commercial Documents",
            StepKey::ProductCategories => "Product Categories",
            StepKey::BankDetails => "Bank Details",
            StepKey::Classification => "Contractor Classification",
            StepKey::PreviousProjects => "Previous Projects",
            StepKey::Licenses => "Licenses",
            StepKey::Specializations => "Specializations",
            StepKey::AccountSecurity => "Account Security",
            StepKey::Verification => "Verification",
        }
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

const INDIVIDUAL: &[StepKey] = &[
    StepKey::PersonalInfo,
    StepKey::AccountSecurity,
    StepKey::Verification,
];

const SUPPLIER: &[StepKey] = &[
    StepKey::CompanyInfo,
    StepKey::ContactPerson,
    StepKey::CommercialDocuments,
    StepKey::ProductCategories,
    StepKey::BankDetails,
    StepKey::AccountSecurity,
    StepKey::Verification,
];

const CONTRACTOR: &[StepKey] = &[
    StepKey::CompanyInfo,
    StepKey::ContactPerson,
    StepKey::Classification,
    StepKey::CommercialDocuments,
    StepKey::PreviousProjects,
    StepKey::AccountSecurity,
    StepKey::Verification,
];

const ENGINEERING_OFFICE: &[StepKey] = &[
    StepKey::OfficeInfo,
    StepKey::ContactPerson,
    StepKey::Licenses,
    StepKey::Specializations,
    StepKey::AccountSecurity,
    StepKey::Verification,
];

const FREELANCE_ENGINEER: &[StepKey] = &[
    StepKey::PersonalInfo,
    StepKey::ProfessionalInfo,
    StepKey::Portfolio,
    StepKey::AccountSecurity,
    StepKey::Verification,
];

const ORGANIZATION: &[StepKey] = &[StepKey::OrganizationInfo, StepKey::AccountSecurity];

pub fn steps_for(role: Role) -> &'static [StepKey] {
    match role {
        Role::Individual => INDIVIDUAL,
        Role::Supplier => SUPPLIER,
        Role::Contractor => CONTRACTOR,
        Role::EngineeringOffice => ENGINEERING_OFFICE,
        Role::FreelanceEngineer => FREELANCE_ENGINEER,
        Role::Organization => ORGANIZATION,
    }
}

pub fn step_index(role: Role, step: StepKey) -> Option<usize> {
    steps_for(role).iter().position(|s| *s == step)
}
