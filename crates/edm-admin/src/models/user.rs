//! User assignment model

use serde::{Deserialize, Serialize};

use super::role::Role;

/// Trim and lower-case an email before any lookup or upsert
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A directory entry binding an email to a role and, depending on the role,
/// a company/area scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAssignment {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
}

impl UserAssignment {
    pub fn company(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    pub fn area(&self) -> Option<&str> {
        self.area_name.as_deref()
    }

    /// Exact company match, as used by the role rules and cascades
    pub fn belongs_to_company(&self, company: &str) -> bool {
        self.company_name.as_deref() == Some(company)
    }

    /// Case-insensitive, trimmed match on both halves of the scope
    pub fn in_area(&self, company: &str, area: &str) -> bool {
        fn same(a: Option<&str>, b: &str) -> bool {
            a.is_some_and(|a| a.trim().eq_ignore_ascii_case(b.trim()))
        }
        same(self.company(), company) && same(self.area(), area)
    }
}

/// Scope attached to a role. Building a `UserInput` from this keeps the
/// role and the company/area fields consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    GeneralAdmin,
    CompanyAdmin { company: String },
    AreaResponsible { company: String, area: String },
    AreaMember { company: String, area: String },
    NoAccess,
}

impl Assignment {
    pub fn role(&self) -> Role {
        match self {
            Assignment::GeneralAdmin => Role::GeneralAdmin,
            Assignment::CompanyAdmin { .. } => Role::CompanyAdmin,
            Assignment::AreaResponsible { .. } => Role::AreaResponsible,
            Assignment::AreaMember { .. } => Role::AreaMember,
            Assignment::NoAccess => Role::NoAccess,
        }
    }

    pub fn company(&self) -> Option<&str> {
        match self {
            Assignment::CompanyAdmin { company }
            | Assignment::AreaResponsible { company, .. }
            | Assignment::AreaMember { company, .. } => Some(company.as_str()),
            Assignment::GeneralAdmin | Assignment::NoAccess => None,
        }
    }

    pub fn area(&self) -> Option<&str> {
        match self {
            Assignment::AreaResponsible { area, .. } | Assignment::AreaMember { area, .. } => {
                Some(area.as_str())
            }
            _ => None,
        }
    }

    /// Rebuild the scope of a stored record. Records whose role needs a scope
    /// the record lacks are treated as `NoAccess`.
    pub fn from_record(user: &UserAssignment) -> Self {
        let company = user.company_name.clone().filter(|c| !c.trim().is_empty());
        let area = user.area_name.clone().filter(|a| !a.trim().is_empty());
        match (user.role, company, area) {
            (Role::GeneralAdmin, _, _) => Assignment::GeneralAdmin,
            (Role::CompanyAdmin, Some(company), _) => Assignment::CompanyAdmin { company },
            (Role::AreaResponsible, Some(company), Some(area)) => {
                Assignment::AreaResponsible { company, area }
            }
            (Role::AreaMember, Some(company), Some(area)) => Assignment::AreaMember { company, area },
            _ => Assignment::NoAccess,
        }
    }

    /// Same role, company replaced. Scopeless roles are unchanged.
    pub fn with_company(self, new_company: &str) -> Self {
        let company = new_company.to_string();
        match self {
            Assignment::CompanyAdmin { .. } => Assignment::CompanyAdmin { company },
            Assignment::AreaResponsible { area, .. } => Assignment::AreaResponsible { company, area },
            Assignment::AreaMember { area, .. } => Assignment::AreaMember { company, area },
            other => other,
        }
    }

    /// Same role, area replaced. Roles without an area are unchanged.
    pub fn with_area(self, new_area: &str) -> Self {
        let area = new_area.to_string();
        match self {
            Assignment::AreaResponsible { company, .. } => Assignment::AreaResponsible { company, area },
            Assignment::AreaMember { company, .. } => Assignment::AreaMember { company, area },
            other => other,
        }
    }
}

/// Payload for an upsert-by-email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub assignment: Assignment,
}

impl UserInput {
    pub fn new(name: impl Into<String>, email: &str, assignment: Assignment) -> Self {
        Self {
            name: name.into(),
            email: normalize_email(email),
            assignment,
        }
    }

    pub fn company_admin(name: impl Into<String>, email: &str, company: &str) -> Self {
        Self::new(
            name,
            email,
            Assignment::CompanyAdmin {
                company: company.to_string(),
            },
        )
    }

    pub fn area_responsible(name: impl Into<String>, email: &str, company: &str, area: &str) -> Self {
        Self::new(
            name,
            email,
            Assignment::AreaResponsible {
                company: company.to_string(),
                area: area.to_string(),
            },
        )
    }

    pub fn area_member(name: impl Into<String>, email: &str, company: &str, area: &str) -> Self {
        Self::new(
            name,
            email,
            Assignment::AreaMember {
                company: company.to_string(),
                area: area.to_string(),
            },
        )
    }

    pub fn no_access(name: impl Into<String>, email: &str) -> Self {
        Self::new(name, email, Assignment::NoAccess)
    }

    /// Start from an existing record, keeping its role and scope
    pub fn from_existing(user: &UserAssignment) -> Self {
        Self::new(user.name.clone(), &user.email, Assignment::from_record(user))
    }

    pub fn with_company(mut self, company: &str) -> Self {
        self.assignment = self.assignment.with_company(company);
        self
    }

    pub fn with_area(mut self, area: &str) -> Self {
        self.assignment = self.assignment.with_area(area);
        self
    }

    pub fn role(&self) -> Role {
        self.assignment.role()
    }

    /// Materialize as a stored record under the given id
    pub fn into_record(self, id: String) -> UserAssignment {
        UserAssignment {
            id,
            role: self.assignment.role(),
            company_name: self.assignment.company().map(str::to_string),
            area_name: self.assignment.area().map(str::to_string),
            name: self.name,
            email: self.email,
        }
    }
}

/// A person returned by the external directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub name: String,
    pub email: String,
}

impl DirectoryUser {
    pub fn new(name: impl Into<String>, email: &str) -> Self {
        Self {
            name: name.into(),
            email: normalize_email(email),
        }
    }
}

/// The resolved identity of whoever is calling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
}

impl UserContext {
    /// Identity of someone with no registration
    pub fn unregistered(email: &str) -> Self {
        Self {
            email: normalize_email(email),
            name: None,
            role: Role::NoAccess,
            company_name: None,
            area_name: None,
        }
    }

    pub fn from_record(user: &UserAssignment) -> Self {
        let assignment = Assignment::from_record(user);
        Self {
            email: user.email.clone(),
            name: Some(user.name.clone()),
            role: assignment.role(),
            company_name: assignment.company().map(str::to_string),
            area_name: assignment.area().map(str::to_string),
        }
    }

    pub fn company(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    pub fn area(&self) -> Option<&str> {
        self.area_name.as_deref()
    }
}
