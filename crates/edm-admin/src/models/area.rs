//! Area model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sub-unit of a company. Linked to its company by name, not id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: String,
    pub name: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_email: Option<String>,
    /// Company admin at the time the area was created
    pub admin_email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Area {
    /// Exact company match, used for ownership checks and cascades
    pub fn belongs_to(&self, company: &str) -> bool {
        self.company_name == company
    }

    /// Case-insensitive, trimmed match on the (company, name) pair
    pub fn matches(&self, company: &str, name: &str) -> bool {
        self.company_name.trim().eq_ignore_ascii_case(company.trim())
            && self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

#[derive(Debug, Clone)]
pub struct NewArea {
    pub name: String,
    pub company_name: String,
    pub responsible_email: Option<String>,
    pub admin_email: String,
}

/// Partial update of an area record. `responsible_email: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct AreaPatch {
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub responsible_email: Option<Option<String>>,
    pub active: Option<bool>,
}

impl AreaPatch {
    pub fn company(company_name: &str) -> Self {
        Self {
            company_name: Some(company_name.to_string()),
            ..Default::default()
        }
    }

    pub fn apply(&self, area: &mut Area) {
        if let Some(ref name) = self.name {
            area.name = name.clone();
        }
        if let Some(ref company_name) = self.company_name {
            area.company_name = company_name.clone();
        }
        if let Some(ref responsible) = self.responsible_email {
            area.responsible_email = responsible.clone();
        }
        if let Some(active) = self.active {
            area.active = active;
        }
    }
}
