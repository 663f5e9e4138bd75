//! Administrative roles

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Role held by a user, ordered from widest to narrowest scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    GeneralAdmin,
    CompanyAdmin,
    AreaResponsible,
    AreaMember,
    NoAccess,
}

impl Default for Role {
    fn default() -> Self {
        Role::NoAccess
    }
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::GeneralAdmin,
        Role::CompanyAdmin,
        Role::AreaResponsible,
        Role::AreaMember,
        Role::NoAccess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::GeneralAdmin => "GeneralAdmin",
            Role::CompanyAdmin => "CompanyAdmin",
            Role::AreaResponsible => "AreaResponsible",
            Role::AreaMember => "AreaMember",
            Role::NoAccess => "NoAccess",
        }
    }

    /// Lenient parse for values coming out of the list store.
    /// Unknown or empty values become `NoAccess`.
    pub fn normalize(raw: &str) -> Role {
        raw.parse().unwrap_or_default()
    }

    /// Role carries a company scope
    pub fn has_company(&self) -> bool {
        matches!(
            self,
            Role::CompanyAdmin | Role::AreaResponsible | Role::AreaMember
        )
    }

    /// Role carries an area scope
    pub fn has_area(&self) -> bool {
        matches!(self, Role::AreaResponsible | Role::AreaMember)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    /// Accepts the canonical names plus the legacy Spanish labels still found
    /// in older list records, ignoring case, accents, spaces and separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .nfd()
            .filter(|c| !is_combining_mark(*c))
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "generaladmin" | "administradorgeneral" | "admingeneral" => Ok(Role::GeneralAdmin),
            "companyadmin" | "administradorcom" | "administradorcompania"
            | "admincompania" => Ok(Role::CompanyAdmin),
            "arearesponsible" | "responsablearea" | "responsable" => Ok(Role::AreaResponsible),
            "areamember" | "usuarioarea" | "miembroarea" => Ok(Role::AreaMember),
            "noaccess" | "sinacceso" => Ok(Role::NoAccess),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::normalize(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}
