// Participant roles - registration personas and contract parties

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Registration persona. Each role has its own onboarding step list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Individual,
    Supplier,
    Contractor,
    EngineeringOffice,
    FreelanceEngineer,
    Organization,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Individual,
        Role::Supplier,
        Role::Contractor,
        Role::EngineeringOffice,
        Role::FreelanceEngineer,
        Role::Organization,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Role::Individual => "individual",
            Role::Supplier => "supplier",
            Role::Contractor => "contractor",
            Role::EngineeringOffice => "engineering_office",
            Role::FreelanceEngineer => "freelance_engineer",
            Role::Organization => "organization",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Individual => "Individual",
            Role::Supplier => "Supplier",
            Role::Contractor => "Contractor",
            Role::EngineeringOffice => "Engineering Office",
            Role::FreelanceEngineer => "Freelance Engineer",
            Role::Organization => "Organization",
        }
    }

    /// Roles registering a legal entity rather than a natural person.
    pub fn is_business(&self) -> bool {
        !matches!(self, Role::Individual | Role::FreelanceEngineer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.key() == s.trim())
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// One side of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    Client,
    Contractor,
}

impl PartyRole {
    pub fn other(&self) -> PartyRole {
        match self {
            PartyRole::Client => PartyRole::Contractor,
            PartyRole::Contractor => PartyRole::Client,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            PartyRole::Client => "client",
            PartyRole::Contractor => "contractor",
        }
    }
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PartyRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "client" => Ok(PartyRole::Client),
            "contractor" => Ok(PartyRole::Contractor),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_keys_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.key().parse::<Role>().unwrap(), role);
        }
        assert!("architect".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_as_snake_case() {
        let json = serde_json::to_string(&Role::EngineeringOffice).unwrap();
        assert_eq!(json, "\"engineering_office\"");
    }

    #[test]
    fn test_party_role_other() {
        assert_eq!(PartyRole::Client.other(), PartyRole::Contractor);
        assert_eq!(PartyRole::Contractor.other(), PartyRole::Client);
        assert_eq!("contractor".parse::<PartyRole>().unwrap(), PartyRole::Contractor);
    }
}
