//! Role transition rules
//!
//! Pure decisions over the candidate's current assignment. `None` means the
//! candidate is not registered yet, which is always allowed.

use crate::error::{AdminError, AdminResult};
use crate::models::{Role, UserAssignment};

/// May `candidate` become the admin of `company`?
///
/// Company names compare exactly. The create flow passes the new name, so an
/// existing admin of any other company is rejected.
pub fn validate_company_admin(candidate: Option<&UserAssignment>, company: &str) -> AdminResult<()> {
    let Some(user) = candidate else {
        return Ok(());
    };

    match user.role {
        Role::CompanyAdmin if user.belongs_to_company(company) => Ok(()),
        Role::CompanyAdmin => Err(AdminError::role_rejected(
            "This user is already the administrator of another company.",
        )),
        Role::GeneralAdmin => Err(AdminError::role_rejected(
            "A general administrator cannot administer a company.",
        )),
        Role::AreaResponsible | Role::AreaMember | Role::NoAccess => Ok(()),
    }
}

/// May `candidate` become the responsible of area `(company, area)`?
pub fn validate_area_responsible(
    candidate: Option<&UserAssignment>,
    company: &str,
    area: &str,
) -> AdminResult<()> {
    let Some(user) = candidate else {
        return Ok(());
    };

    match user.role {
        Role::CompanyAdmin => Err(AdminError::role_rejected(
            "This user administers a company and cannot be responsible for an area.",
        )),
        Role::GeneralAdmin => Err(AdminError::role_rejected(
            "A general administrator cannot be responsible for an area.",
        )),
        Role::AreaResponsible
            if user.company() == Some(company) && user.area() == Some(area) =>
        {
            Ok(())
        }
        Role::AreaResponsible => Err(AdminError::role_rejected(format!(
            "This user is already responsible for area \"{}\" in company \"{}\".",
            user.area().unwrap_or_default(),
            user.company().unwrap_or_default()
        ))),
        Role::AreaMember | Role::NoAccess => Ok(()),
    }
}

/// May `candidate` be added as a plain member of an area?
///
/// Only unregistered users and existing area members qualify. Every other
/// role, `NoAccess` included, is changed through its own flow.
pub fn validate_area_member(candidate: Option<&UserAssignment>) -> AdminResult<()> {
    let Some(user) = candidate else {
        return Ok(());
    };

    match user.role {
        Role::AreaMember => Ok(()),
        Role::NoAccess => Err(AdminError::role_rejected(
            "This user is registered without access. Assign them from user management.",
        )),
        Role::GeneralAdmin => Err(AdminError::role_rejected(
            "This user is a general administrator and cannot be added from here.",
        )),
        Role::CompanyAdmin => Err(AdminError::role_rejected(
            "This user already administers a company and cannot be added as an area member.",
        )),
        Role::AreaResponsible => Err(AdminError::role_rejected(
            "This user is already responsible for an area. Reassign them from responsible management.",
        )),
    }
}

/// Members may only be moved between areas of the same company
pub fn validate_company_move(current_company: &str, target_company: &str) -> AdminResult<()> {
    if current_company.trim().to_lowercase() != target_company.trim().to_lowercase() {
        return Err(AdminError::CrossCompanyMove {
            from: current_company.to_string(),
            to: target_company.to_string(),
        });
    }
    Ok(())
}
