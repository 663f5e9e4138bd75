//! Permission checking utilities

use crate::error::{AdminError, AdminResult};
use crate::models::{Role, UserContext};

use super::validator::names_match;

/// Something a caller wants to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    ManageCompanies,
    ManageAreas { company: &'a str },
    ManageResponsible { company: &'a str },
    ManageMembers { company: &'a str, area: &'a str },
    BrowseDocuments { company: &'a str, area: &'a str },
    SearchDirectory,
}

impl Action<'_> {
    pub fn describe(&self) -> String {
        match self {
            Action::ManageCompanies => "manage companies".to_string(),
            Action::ManageAreas { company } => format!("manage areas of {}", company),
            Action::ManageResponsible { company } => {
                format!("manage area responsibles of {}", company)
            }
            Action::ManageMembers { company, area } => {
                format!("manage members of {}/{}", company, area)
            }
            Action::BrowseDocuments { company, area } => {
                format!("browse documents of {}/{}", company, area)
            }
            Action::SearchDirectory => "search the directory".to_string(),
        }
    }
}

fn owns_company(user: &UserContext, company: &str) -> bool {
    user.company().is_some_and(|own| names_match(own, company))
}

fn owns_area(user: &UserContext, company: &str, area: &str) -> bool {
    owns_company(user, company) && user.area().is_some_and(|own| names_match(own, area))
}

/// Check if a caller can perform an action
pub fn check_permission(user: &UserContext, action: &Action<'_>) -> bool {
    match (user.role, action) {
        (Role::GeneralAdmin, _) => true,
        (Role::NoAccess, _) => false,

        (_, Action::ManageCompanies) => false,

        (Role::CompanyAdmin, Action::ManageAreas { company })
        | (Role::CompanyAdmin, Action::ManageResponsible { company }) => owns_company(user, company),
        (_, Action::ManageAreas { .. }) | (_, Action::ManageResponsible { .. }) => false,

        (Role::CompanyAdmin, Action::ManageMembers { company, .. })
        | (Role::CompanyAdmin, Action::BrowseDocuments { company, .. }) => owns_company(user, company),
        (Role::AreaResponsible, Action::ManageMembers { company, area }) => {
            owns_area(user, company, area)
        }
        (Role::AreaMember, Action::ManageMembers { .. }) => false,

        (Role::AreaResponsible | Role::AreaMember, Action::BrowseDocuments { company, area }) => {
            owns_area(user, company, area)
        }

        (Role::CompanyAdmin | Role::AreaResponsible, Action::SearchDirectory) => true,
        (Role::AreaMember, Action::SearchDirectory) => false,
    }
}

/// Permission denied error message
pub fn permission_denied_message(action: &Action<'_>) -> String {
    format!("You don't have permission to {}", action.describe())
}

/// `check_permission` as a `Result`
pub fn require_permission(user: &UserContext, action: &Action<'_>) -> AdminResult<()> {
    if check_permission(user, action) {
        Ok(())
    } else {
        tracing::debug!(email = %user.email, role = %user.role, action = %action.describe(), "Permission denied");
        Err(AdminError::PermissionDenied {
            action: action.describe(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: Role, company: Option<&str>, area: Option<&str>) -> UserContext {
        UserContext {
            email: "someone@acme.com".to_string(),
            name: None,
            role,
            company_name: company.map(str::to_string),
            area_name: area.map(str::to_string),
        }
    }

    #[test]
    fn test_only_general_admin_manages_companies() {
        assert!(check_permission(&ctx(Role::GeneralAdmin, None, None), &Action::ManageCompanies));
        assert!(!check_permission(
            &ctx(Role::CompanyAdmin, Some("Acme"), None),
            &Action::ManageCompanies
        ));
    }

    #[test]
    fn test_company_admin_is_scoped_to_own_company() {
        let admin = ctx(Role::CompanyAdmin, Some("Acme"), None);
        assert!(check_permission(&admin, &Action::ManageAreas { company: "acme" }));
        assert!(!check_permission(&admin, &Action::ManageAreas { company: "Globex" }));
        assert!(check_permission(
            &admin,
            &Action::ManageMembers { company: "Acme", area: "Ventas" }
        ));
    }

    #[test]
    fn test_area_responsible_manages_only_own_area_members() {
        let responsible = ctx(Role::AreaResponsible, Some("Acme"), Some("Ventas"));
        assert!(check_permission(
            &responsible,
            &Action::ManageMembers { company: "Acme", area: "Ventas" }
        ));
        assert!(!check_permission(
            &responsible,
            &Action::ManageMembers { company: "Acme", area: "Compras" }
        ));
        assert!(!check_permission(&responsible, &Action::ManageAreas { company: "Acme" }));
    }

    #[test]
    fn test_members_only_browse() {
        let member = ctx(Role::AreaMember, Some("Acme"), Some("Ventas"));
        assert!(check_permission(
            &member,
            &Action::BrowseDocuments { company: "Acme", area: "Ventas" }
        ));
        assert!(!check_permission(
            &member,
            &Action::ManageMembers { company: "Acme", area: "Ventas" }
        ));
        assert!(require_permission(&member, &Action::SearchDirectory).is_err());
    }

    #[test]
    fn test_no_access_is_denied_everything() {
        let nobody = ctx(Role::NoAccess, None, None);
        assert!(!check_permission(&nobody, &Action::SearchDirectory));
    }
}
