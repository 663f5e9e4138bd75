//! Company lifecycle: creation, update with rename cascade, guarded deletion

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::folder_service::FolderOutcome;
use super::guard::OperationKey;
use super::report::OperationReport;
use super::status::ActionStatus;
use super::{tracked, AdminContext};
use crate::error::{AdminError, AdminResult};
use crate::models::{
    normalize_email, AreaPatch, Company, CompanyAssociations, CompanyPatch, DirectoryUser,
    NewCompany, UserAssignment, UserInput,
};
use crate::security::{names_match, validate_company_admin, validate_email, validate_entity_name};

/// Create company request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyRequest {
    pub name: String,
    pub admin: Option<DirectoryUser>,
}

/// Update company request. `admin` is the administrator after the update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyRequest {
    pub name: String,
    pub admin: Option<DirectoryUser>,
}

/// Result of a deletion attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CompanyDeletion {
    /// Users still belong to the company; nothing was changed
    #[serde(rename_all = "camelCase")]
    ConfirmationRequired { company: String, users: Vec<String> },
    #[serde(rename_all = "camelCase")]
    Deleted { company: String, users_reset: usize },
}

pub(crate) fn display_name(user: &DirectoryUser, email: &str) -> String {
    let name = user.name.trim();
    if name.is_empty() {
        email.to_string()
    } else {
        name.to_string()
    }
}

/// Company orchestrator
pub struct CompanyService {
    ctx: AdminContext,
    status: ActionStatus,
    /// Company id -> associated users seen when confirmation was requested
    pending_deletions: Mutex<HashMap<String, BTreeSet<String>>>,
}

impl CompanyService {
    pub fn new(ctx: AdminContext) -> Self {
        Self {
            ctx,
            status: ActionStatus::new(),
            pending_deletions: Mutex::new(HashMap::new()),
        }
    }

    pub fn status(&self) -> &ActionStatus {
        &self.status
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, BTreeSet<String>>> {
        self.pending_deletions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn list(&self) -> AdminResult<Vec<Company>> {
        self.ctx.companies.list().await
    }

    pub async fn get(&self, id: &str) -> AdminResult<Company> {
        self.ctx.company_by_id(id).await
    }

    async fn users_of(&self, company: &str) -> AdminResult<Vec<UserAssignment>> {
        Ok(self
            .ctx
            .users
            .list()
            .await?
            .into_iter()
            .filter(|u| u.belongs_to_company(company))
            .collect())
    }

    async fn ensure_unique_name(&self, name: &str, except_id: Option<&str>) -> AdminResult<()> {
        let taken = self
            .ctx
            .companies
            .list()
            .await?
            .iter()
            .any(|c| Some(c.id.as_str()) != except_id && names_match(&c.name, name));
        if taken {
            return Err(AdminError::Validation(format!(
                "A company named '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    /// Areas and users that still point at the company
    pub async fn associations(&self, id: &str) -> AdminResult<CompanyAssociations> {
        let company = self.ctx.company_by_id(id).await?;
        let areas = self.ctx.areas_of(&company.name).await?;
        let users = self.users_of(&company.name).await?;
        Ok(CompanyAssociations {
            company,
            areas,
            users,
        })
    }

    /// Create a company with its administrator and root folder
    pub async fn create(&self, request: CreateCompanyRequest) -> AdminResult<Company> {
        tracked(&self.status, &self.ctx.refresh, self.create_inner(request)).await
    }

    async fn create_inner(&self, request: CreateCompanyRequest) -> AdminResult<Company> {
        let name = validate_entity_name("Company", &request.name)?;
        let admin = request
            .admin
            .ok_or_else(|| AdminError::Validation("A company administrator must be selected".to_string()))?;
        let admin_email = validate_email(&admin.email)?;

        let _permit = self.ctx.guard.acquire_all([
            OperationKey::company(&name),
            OperationKey::user(&admin_email),
        ])?;

        self.ensure_unique_name(&name, None).await?;
        let existing = self.ctx.users.get_by_email(&admin_email).await?;
        validate_company_admin(existing.as_ref(), &name)?;

        let mut report = OperationReport::new(format!("create company {}", name));
        report
            .step(
                "assign company administrator",
                self.ctx.users.upsert_by_email(UserInput::company_admin(
                    display_name(&admin, &admin_email),
                    &admin_email,
                    &name,
                )),
            )
            .await?;

        let company = report
            .step(
                "create company record",
                self.ctx.companies.create(NewCompany {
                    name: name.clone(),
                    admin_email: admin_email.clone(),
                }),
            )
            .await?;

        let step = "create company folder";
        let drive_id = self
            .ctx
            .library
            .drive_id()
            .await
            .map_err(|e| report.fail(step, e))?;
        let (_, outcome) = self
            .ctx
            .folders
            .ensure_company(&drive_id, &name)
            .await
            .map_err(|e| report.fail(step, e))?;
        match outcome {
            FolderOutcome::AlreadyExisted => report.tolerated(step, "folder already existed"),
            _ => report.applied(step),
        }

        tracing::info!(company = %company.name, admin = %admin_email, "Company created");
        Ok(company)
    }

    /// Update name and administrator; a rename cascades to the folder, the
    /// users and the areas of the company
    pub async fn update(&self, id: &str, request: UpdateCompanyRequest) -> AdminResult<Company> {
        tracked(&self.status, &self.ctx.refresh, self.update_inner(id, request)).await
    }

    async fn update_inner(&self, id: &str, request: UpdateCompanyRequest) -> AdminResult<Company> {
        let name = validate_entity_name("Company", &request.name)?;
        let admin = request
            .admin
            .ok_or_else(|| AdminError::Validation("A company administrator must be selected".to_string()))?;
        let admin_email = validate_email(&admin.email)?;

        let company = self.ctx.company_by_id(id).await?;
        let renamed = name != company.name;
        let previous_admin = normalize_email(&company.admin_email);
        let admin_changed = admin_email != previous_admin;

        let mut keys = vec![OperationKey::company(&company.id), OperationKey::user(&admin_email)];
        if renamed {
            keys.push(OperationKey::company(&name));
        }
        let _permit = self.ctx.guard.acquire_all(keys)?;

        if renamed {
            self.ensure_unique_name(&name, Some(&company.id)).await?;
        }
        if admin_changed {
            let existing = self.ctx.users.get_by_email(&admin_email).await?;
            validate_company_admin(existing.as_ref(), &company.name)?;
        }

        let mut report = OperationReport::new(format!("update company {}", company.name));

        if admin_changed && !previous_admin.is_empty() {
            let step = "reset previous administrator";
            let old = self
                .ctx
                .users
                .get_by_email(&previous_admin)
                .await
                .map_err(|e| report.fail(step, e))?;
            match old {
                Some(old) => {
                    report
                        .step(
                            step,
                            self.ctx
                                .users
                                .upsert_by_email(UserInput::no_access(old.name.clone(), &old.email)),
                        )
                        .await?;
                }
                None => report.tolerated(step, "previous administrator not registered"),
            }
        }

        report
            .step(
                "assign company administrator",
                self.ctx.users.upsert_by_email(UserInput::company_admin(
                    display_name(&admin, &admin_email),
                    &admin_email,
                    &name,
                )),
            )
            .await?;

        report
            .step(
                "update company record",
                self.ctx.companies.update(
                    &company.id,
                    CompanyPatch {
                        name: Some(name.clone()),
                        admin_email: Some(admin_email.clone()),
                        active: None,
                    },
                ),
            )
            .await?;

        if renamed {
            self.cascade_rename(&company.name, &name, &mut report).await?;
        }

        tracing::info!(company = %name, renamed, admin_changed, "Company updated");
        Ok(Company {
            name,
            admin_email,
            ..company
        })
    }

    async fn cascade_rename(&self, old: &str, new: &str, report: &mut OperationReport) -> AdminResult<()> {
        let step = "rename company folder";
        let drive_id = self
            .ctx
            .library
            .drive_id()
            .await
            .map_err(|e| report.fail(step, e))?;
        let folder = self
            .ctx
            .folders
            .find_company(&drive_id, old)
            .await
            .map_err(|e| report.fail(step, e))?;
        match self
            .ctx
            .folders
            .rename(&drive_id, folder, new)
            .await
            .map_err(|e| report.fail(step, e))?
        {
            FolderOutcome::Missing => report.tolerated(step, format!("folder '{}' not found", old)),
            _ => report.applied(step),
        }

        let users = self
            .users_of(old)
            .await
            .map_err(|e| report.fail("load company users", e))?;
        for user in users {
            report
                .step(
                    &format!("move user {} to {}", user.email, new),
                    self.ctx
                        .users
                        .upsert_by_email(UserInput::from_existing(&user).with_company(new)),
                )
                .await?;
        }

        let areas = self
            .ctx
            .areas_of(old)
            .await
            .map_err(|e| report.fail("load company areas", e))?;
        for area in areas {
            report
                .step(
                    &format!("move area {} to {}", area.name, new),
                    self.ctx.areas.update(&area.id, AreaPatch::company(new)),
                )
                .await?;
        }
        Ok(())
    }

    /// Delete a company. Companies with areas are refused. If users still
    /// belong to the company the first call only asks for confirmation; a
    /// later call with `confirmed` resets them and deletes.
    pub async fn delete(&self, id: &str, confirmed: bool) -> AdminResult<CompanyDeletion> {
        self.status.begin();
        let result = self.delete_inner(id, confirmed).await;
        self.status.finish(&result);
        match &result {
            Ok(CompanyDeletion::ConfirmationRequired { .. }) => {
                self.status.set_confirmation_pending(true);
            }
            Ok(CompanyDeletion::Deleted { .. }) => {
                self.status.set_confirmation_pending(false);
                self.ctx.refresh.trigger();
            }
            Err(_) => {}
        }
        result
    }

    /// Forget a pending confirmation, e.g. when the user dismisses it
    pub fn cancel_deletion(&self, id: &str) {
        if self.pending().remove(id).is_some() {
            self.status.set_confirmation_pending(false);
        }
    }

    async fn delete_inner(&self, id: &str, confirmed: bool) -> AdminResult<CompanyDeletion> {
        let company = self.ctx.company_by_id(id).await?;
        let _permit = self
            .ctx
            .guard
            .acquire(OperationKey::company(&company.id))?;

        let areas = self.ctx.areas_of(&company.name).await?;
        if !areas.is_empty() {
            self.pending().remove(id);
            return Err(AdminError::CompanyHasAreas {
                company: company.name.clone(),
                count: areas.len(),
            });
        }

        let users = self.users_of(&company.name).await?;
        let emails: BTreeSet<String> = users.iter().map(|u| u.email.clone()).collect();

        if !users.is_empty() && self.ctx.config.confirm_company_deletion {
            let armed = self.pending().get(id).cloned();
            let proceed = confirmed && armed.as_ref() == Some(&emails);
            if !proceed {
                if confirmed && armed.is_some() {
                    tracing::warn!(company = %company.name, "Associated users changed since confirmation was requested");
                }
                self.pending().insert(id.to_string(), emails.clone());
                tracing::info!(company = %company.name, users = emails.len(), "Company deletion needs confirmation");
                return Ok(CompanyDeletion::ConfirmationRequired {
                    company: company.name,
                    users: emails.into_iter().collect(),
                });
            }
        }

        let mut report = OperationReport::new(format!("delete company {}", company.name));
        for user in &users {
            report
                .step(
                    &format!("reset user {}", user.email),
                    self.ctx
                        .users
                        .upsert_by_email(UserInput::no_access(user.name.clone(), &user.email)),
                )
                .await?;
        }

        let step = "delete company folder";
        let drive_id = self
            .ctx
            .library
            .drive_id()
            .await
            .map_err(|e| report.fail(step, e))?;
        let folder = self
            .ctx
            .folders
            .find_company(&drive_id, &company.name)
            .await
            .map_err(|e| report.fail(step, e))?;
        match self
            .ctx
            .folders
            .delete(&drive_id, folder)
            .await
            .map_err(|e| report.fail(step, e))?
        {
            FolderOutcome::Missing => report.tolerated(step, format!("folder '{}' not found", company.name)),
            _ => report.applied(step),
        }

        report
            .step("delete company record", self.ctx.companies.delete(&company.id))
            .await?;
        self.pending().remove(id);

        tracing::info!(company = %company.name, users_reset = users.len(), "Company deleted");
        Ok(CompanyDeletion::Deleted {
            company: company.name,
            users_reset: users.len(),
        })
    }
}
