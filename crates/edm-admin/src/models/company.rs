//! Company model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::area::Area;
use super::user::UserAssignment;

/// Top-level tenant grouping. `name` doubles as the root folder name and as
/// the foreign key areas and users refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub admin_email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Record to create in the company list
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub admin_email: String,
}

/// Partial update of a company record
#[derive(Debug, Clone, Default)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub admin_email: Option<String>,
    pub active: Option<bool>,
}

impl CompanyPatch {
    pub fn apply(&self, company: &mut Company) {
        if let Some(ref name) = self.name {
            company.name = name.clone();
        }
        if let Some(ref admin_email) = self.admin_email {
            company.admin_email = admin_email.clone();
        }
        if let Some(active) = self.active {
            company.active = active;
        }
    }
}

/// What still points at a company, shown before deleting it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyAssociations {
    pub company: Company,
    pub areas: Vec<Area>,
    pub users: Vec<UserAssignment>,
}

impl CompanyAssociations {
    pub fn can_delete(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn needs_confirmation(&self) -> bool {
        !self.users.is_empty()
    }
}
