//! Area lifecycle: creation, responsible reassignment, rename, deletion

use serde::Deserialize;

use super::company_service::display_name;
use super::folder_service::FolderOutcome;
use super::guard::OperationKey;
use super::report::OperationReport;
use super::status::ActionStatus;
use super::{tracked, AdminContext};
use crate::error::{AdminError, AdminResult};
use crate::models::{normalize_email, Area, AreaPatch, DirectoryUser, NewArea, UserInput};
use crate::security::{names_match, validate_area_responsible, validate_email, validate_entity_name};

/// How to address an area: by id, with the (company, name) pair as fallback
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRef {
    pub id: String,
    pub company_name: Option<String>,
    pub name: Option<String>,
}

impl AreaRef {
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_names(id: impl Into<String>, company: &str, name: &str) -> Self {
        Self {
            id: id.into(),
            company_name: Some(company.to_string()),
            name: Some(name.to_string()),
        }
    }

    pub(crate) fn fallback(&self) -> Option<(&str, &str)> {
        Some((self.company_name.as_deref()?, self.name.as_deref()?))
    }
}

/// Create area request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAreaRequest {
    pub company_name: String,
    pub name: String,
    pub responsible: Option<DirectoryUser>,
}

/// What happens to the outgoing responsible
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PreviousResponsible {
    #[default]
    NoAccess,
    /// Becomes a plain member of another area of the same company
    #[serde(rename_all = "camelCase")]
    MoveToArea { area_name: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignResponsibleRequest {
    pub responsible: Option<DirectoryUser>,
    #[serde(default)]
    pub previous: PreviousResponsible,
}

/// Area orchestrator
pub struct AreaService {
    ctx: AdminContext,
    status: ActionStatus,
}

impl AreaService {
    pub fn new(ctx: AdminContext) -> Self {
        Self {
            ctx,
            status: ActionStatus::new(),
        }
    }

    pub fn status(&self) -> &ActionStatus {
        &self.status
    }

    pub async fn get(&self, area: &AreaRef) -> AdminResult<Area> {
        self.ctx.find_area(&area.id, area.fallback()).await
    }

    /// All areas, or those of one company
    pub async fn list(&self, company: Option<&str>) -> AdminResult<Vec<Area>> {
        let areas = self.ctx.areas.list().await?;
        Ok(match company {
            Some(company) => areas
                .into_iter()
                .filter(|a| names_match(&a.company_name, company))
                .collect(),
            None => areas,
        })
    }

    /// Create an area, its optional responsible and its folder
    pub async fn create(&self, request: CreateAreaRequest) -> AdminResult<Area> {
        tracked(&self.status, &self.ctx.refresh, self.create_inner(request)).await
    }

    async fn create_inner(&self, request: CreateAreaRequest) -> AdminResult<Area> {
        let company_name = request.company_name.trim().to_string();
        if company_name.is_empty() {
            return Err(AdminError::Validation("A company must be selected".to_string()));
        }
        let name = validate_entity_name("Area", &request.name)?;
        let responsible = match request.responsible {
            Some(user) => {
                let email = validate_email(&user.email)?;
                Some((display_name(&user, &email), email))
            }
            None => None,
        };

        let mut keys = vec![OperationKey::area(&company_name, &name)];
        if let Some((_, ref email)) = responsible {
            keys.push(OperationKey::user(email));
        }
        let _permit = self.ctx.guard.acquire_all(keys)?;

        let company = self.ctx.company_by_name(&company_name).await?;
        let duplicate = self
            .ctx
            .areas_of(&company.name)
            .await?
            .iter()
            .any(|a| names_match(&a.name, &name));
        if duplicate {
            return Err(AdminError::Validation(format!(
                "Area '{}' already exists in {}",
                name, company.name
            )));
        }
        if let Some((_, ref email)) = responsible {
            let existing = self.ctx.users.get_by_email(email).await?;
            validate_area_responsible(existing.as_ref(), &company.name, &name)?;
        }

        let mut report = OperationReport::new(format!("create area {}/{}", company.name, name));
        let area = report
            .step(
                "create area record",
                self.ctx.areas.create(NewArea {
                    name: name.clone(),
                    company_name: company.name.clone(),
                    responsible_email: responsible.as_ref().map(|(_, email)| email.clone()),
                    admin_email: company.admin_email.clone(),
                }),
            )
            .await?;

        if let Some((display, email)) = responsible {
            report
                .step(
                    "assign area responsible",
                    self.ctx.users.upsert_by_email(UserInput::area_responsible(
                        display,
                        &email,
                        &company.name,
                        &name,
                    )),
                )
                .await?;
        }

        let step = "create area folder";
        let drive_id = self
            .ctx
            .library
            .drive_id()
            .await
            .map_err(|e| report.fail(step, e))?;
        let (_, outcome) = self
            .ctx
            .folders
            .ensure_area(&drive_id, &company.name, &name)
            .await
            .map_err(|e| report.fail(step, e))?;
        match outcome {
            FolderOutcome::AlreadyExisted => report.tolerated(step, "folder already existed"),
            _ => report.applied(step),
        }

        tracing::info!(company = %company.name, area = %name, "Area created");
        Ok(area)
    }

    /// Hand the area to a new responsible and dispose of the previous one
    pub async fn reassign_responsible(&self, area: &AreaRef, request: ReassignResponsibleRequest) -> AdminResult<Area> {
        tracked(
            &self.status,
            &self.ctx.refresh,
            self.reassign_inner(area, request),
        )
        .await
    }

    async fn reassign_inner(&self, area_ref: &AreaRef, request: ReassignResponsibleRequest) -> AdminResult<Area> {
        let candidate = request
            .responsible
            .ok_or_else(|| AdminError::Validation("A user must be selected".to_string()))?;
        let email = validate_email(&candidate.email)?;
        let area = self.get(area_ref).await?;

        let previous = area
            .responsible_email
            .as_deref()
            .map(normalize_email)
            .filter(|p| !p.is_empty() && *p != email);

        let mut keys = vec![
            OperationKey::area(&area.company_name, &area.name),
            OperationKey::user(&email),
        ];
        if let Some(ref prev) = previous {
            keys.push(OperationKey::user(prev));
        }
        let _permit = self.ctx.guard.acquire_all(keys)?;

        let existing = self.ctx.users.get_by_email(&email).await?;
        validate_area_responsible(existing.as_ref(), &area.company_name, &area.name)?;

        // Resolve where the previous responsible goes before touching anything
        let destination = match (&previous, &request.previous) {
            (Some(_), PreviousResponsible::MoveToArea { area_name }) => {
                if area_name.trim().is_empty() {
                    return Err(AdminError::Validation(
                        "An area must be selected to reassign the previous responsible".to_string(),
                    ));
                }
                let target = self
                    .ctx
                    .areas_of(&area.company_name)
                    .await?
                    .into_iter()
                    .find(|a| names_match(&a.name, area_name))
                    .ok_or_else(|| AdminError::AreaNotFound(area_name.clone()))?;
                if target.id == area.id {
                    return Err(AdminError::Validation(
                        "The previous responsible must be moved to a different area".to_string(),
                    ));
                }
                Some(target.name)
            }
            _ => None,
        };

        let mut report = OperationReport::new(format!(
            "reassign responsible of {}/{}",
            area.company_name, area.name
        ));

        if let Some(ref prev) = previous {
            let step = "dispose previous responsible";
            let prev_user = self
                .ctx
                .users
                .get_by_email(prev)
                .await
                .map_err(|e| report.fail(step, e))?;
            match prev_user {
                Some(user) => {
                    let input = match destination {
                        Some(ref target) => UserInput::area_member(
                            user.name.clone(),
                            &user.email,
                            &area.company_name,
                            target,
                        ),
                        None => UserInput::no_access(user.name.clone(), &user.email),
                    };
                    report.step(step, self.ctx.users.upsert_by_email(input)).await?;
                }
                None => report.tolerated(step, "previous responsible not registered"),
            }
        }

        report
            .step(
                "assign area responsible",
                self.ctx.users.upsert_by_email(UserInput::area_responsible(
                    display_name(&candidate, &email),
                    &email,
                    &area.company_name,
                    &area.name,
                )),
            )
            .await?;

        report
            .step(
                "update area record",
                self.ctx.areas.update(
                    &area.id,
                    AreaPatch {
                        responsible_email: Some(Some(email.clone())),
                        ..Default::default()
                    },
                ),
            )
            .await?;

        tracing::info!(
            company = %area.company_name,
            area = %area.name,
            responsible = %email,
            previous = ?previous,
            "Area responsible reassigned"
        );
        Ok(Area {
            responsible_email: Some(email),
            ..area
        })
    }

    /// Rename an area, its folder and the scope of its users
    pub async fn rename(&self, area: &AreaRef, new_name: &str) -> AdminResult<Area> {
        tracked(&self.status, &self.ctx.refresh, self.rename_inner(area, new_name)).await
    }

    async fn rename_inner(&self, area_ref: &AreaRef, new_name: &str) -> AdminResult<Area> {
        let new_name = validate_entity_name("Area", new_name)?;
        let area = self.get(area_ref).await?;
        if area.name == new_name {
            return Ok(area);
        }

        let _permit = self.ctx.guard.acquire_all([
            OperationKey::area(&area.company_name, &area.name),
            OperationKey::area(&area.company_name, &new_name),
        ])?;

        let taken = self
            .ctx
            .areas_of(&area.company_name)
            .await?
            .iter()
            .any(|a| a.id != area.id && names_match(&a.name, &new_name));
        if taken {
            return Err(AdminError::Validation(format!(
                "Area '{}' already exists in {}",
                new_name, area.company_name
            )));
        }

        let mut report = OperationReport::new(format!(
            "rename area {}/{}",
            area.company_name, area.name
        ));
        report
            .step(
                "update area record",
                self.ctx.areas.update(
                    &area.id,
                    AreaPatch {
                        name: Some(new_name.clone()),
                        ..Default::default()
                    },
                ),
            )
            .await?;

        let step = "rename area folder";
        let drive_id = self
            .ctx
            .library
            .drive_id()
            .await
            .map_err(|e| report.fail(step, e))?;
        let folder = self
            .ctx
            .folders
            .find_area(&drive_id, &area.company_name, &area.name)
            .await
            .map_err(|e| report.fail(step, e))?;
        match self
            .ctx
            .folders
            .rename(&drive_id, folder, &new_name)
            .await
            .map_err(|e| report.fail(step, e))?
        {
            FolderOutcome::Missing => report.tolerated(step, format!("folder '{}' not found", area.name)),
            _ => report.applied(step),
        }

        let users = self
            .ctx
            .users
            .list()
            .await
            .map_err(|e| report.fail("load area users", e))?;
        for user in users
            .into_iter()
            .filter(|u| u.belongs_to_company(&area.company_name) && u.area() == Some(area.name.as_str()))
        {
            report
                .step(
                    &format!("move user {} to {}", user.email, new_name),
                    self.ctx
                        .users
                        .upsert_by_email(UserInput::from_existing(&user).with_area(&new_name)),
                )
                .await?;
        }

        tracing::info!(company = %area.company_name, from = %area.name, to = %new_name, "Area renamed");
        Ok(Area {
            name: new_name,
            ..area
        })
    }

    /// Delete an area's folder and record
    pub async fn delete(&self, area: &AreaRef) -> AdminResult<()> {
        tracked(&self.status, &self.ctx.refresh, self.delete_inner(area)).await
    }

    async fn delete_inner(&self, area_ref: &AreaRef) -> AdminResult<()> {
        let area = self.get(area_ref).await?;
        let _permit = self
            .ctx
            .guard
            .acquire(OperationKey::area(&area.company_name, &area.name))?;

        let mut report = OperationReport::new(format!(
            "delete area {}/{}",
            area.company_name, area.name
        ));

        let step = "delete area folder";
        let drive_id = self.ctx.library.drive_id().await?;
        let folder = self
            .ctx
            .folders
            .find_area(&drive_id, &area.company_name, &area.name)
            .await?;
        match self.ctx.folders.delete(&drive_id, folder).await? {
            FolderOutcome::Missing => report.tolerated(step, format!("folder '{}' not found", area.name)),
            _ => report.applied(step),
        }

        report
            .step("delete area record", self.ctx.areas.delete(&area.id))
            .await?;

        match self.ctx.users.list().await {
            Ok(users) => {
                let remaining = users
                    .iter()
                    .filter(|u| u.in_area(&area.company_name, &area.name))
                    .count();
                if remaining > 0 {
                    tracing::warn!(
                        company = %area.company_name,
                        area = %area.name,
                        users = remaining,
                        "Deleted area still referenced by users"
                    );
                }
            }
            Err(err) => tracing::warn!(
                company = %area.company_name,
                area = %area.name,
                error = %err,
                "Could not check users of the deleted area"
            ),
        }

        tracing::info!(company = %area.company_name, area = %area.name, "Area deleted");
        Ok(())
    }
}
