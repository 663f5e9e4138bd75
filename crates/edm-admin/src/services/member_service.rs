//! Area members: bulk add, relocation inside a company, removal

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::area_service::AreaRef;
use super::company_service::display_name;
use super::guard::OperationKey;
use super::status::ActionStatus;
use super::{tracked, AdminContext};
use crate::error::{AdminError, AdminResult};
use crate::models::{DirectoryUser, Role, UserAssignment, UserInput};
use crate::security::{names_match, validate_area_member, validate_company_move, validate_email};

/// Outcome for one candidate of a bulk add
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum MemberOutcome {
    Added,
    Rejected { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateOutcome {
    pub email: String,
    pub name: String,
    #[serde(flatten)]
    pub outcome: MemberOutcome,
}

/// Per-candidate results; a rejected candidate never aborts the batch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAddReport {
    pub company_name: String,
    pub area_name: String,
    pub outcomes: Vec<CandidateOutcome>,
}

impl BulkAddReport {
    pub fn added(&self) -> impl Iterator<Item = &CandidateOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.outcome == MemberOutcome::Added)
    }

    pub fn rejected(&self) -> impl Iterator<Item = &CandidateOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, MemberOutcome::Rejected { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &CandidateOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, MemberOutcome::Failed { .. }))
    }
}

/// New location of a member inside their company
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLocationRequest {
    pub company_name: String,
    pub area_name: String,
}

/// Area member orchestrator
pub struct MemberService {
    ctx: AdminContext,
    status: ActionStatus,
}

impl MemberService {
    pub fn new(ctx: AdminContext) -> Self {
        Self {
            ctx,
            status: ActionStatus::new(),
        }
    }

    pub fn status(&self) -> &ActionStatus {
        &self.status
    }

    /// Registered user by email
    pub async fn member(&self, email: &str) -> AdminResult<UserAssignment> {
        let email = validate_email(email)?;
        self.ctx
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AdminError::UserNotFound(email))
    }

    /// Members of an area, matched ignoring case
    pub async fn list(&self, area: &AreaRef) -> AdminResult<Vec<UserAssignment>> {
        let area = self.ctx.find_area(&area.id, area.fallback()).await?;
        let mut members: Vec<UserAssignment> = self
            .ctx
            .users
            .list()
            .await?
            .into_iter()
            .filter(|u| u.role == Role::AreaMember && u.in_area(&area.company_name, &area.name))
            .collect();
        members.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(members)
    }

    /// Add each candidate as a member of the area
    pub async fn add_members(&self, area: &AreaRef, candidates: Vec<DirectoryUser>) -> AdminResult<BulkAddReport> {
        tracked(&self.status, &self.ctx.refresh, self.add_inner(area, candidates)).await
    }

    async fn add_inner(&self, area_ref: &AreaRef, candidates: Vec<DirectoryUser>) -> AdminResult<BulkAddReport> {
        if candidates.is_empty() {
            return Err(AdminError::Validation("Select at least one user".to_string()));
        }
        let area = self.ctx.find_area(&area_ref.id, area_ref.fallback()).await?;
        let _permit = self
            .ctx
            .guard
            .acquire(OperationKey::area(&area.company_name, &area.name))?;

        let mut seen = HashSet::new();
        let mut outcomes = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let email = crate::models::normalize_email(&candidate.email);
            if !seen.insert(email.clone()) {
                continue;
            }
            let name = display_name(&candidate, &email);
            let outcome = self.add_one(&area.company_name, &area.name, &name, &email).await;
            match outcome {
                MemberOutcome::Added => {
                    tracing::info!(email = %email, area = %area.name, "Member added");
                }
                MemberOutcome::Rejected { ref reason } => {
                    tracing::info!(email = %email, reason = %reason, "Member rejected");
                }
                MemberOutcome::Failed { ref error } => {
                    tracing::error!(email = %email, error = %error, "Member could not be added");
                }
            }
            outcomes.push(CandidateOutcome {
                email,
                name,
                outcome,
            });
        }

        Ok(BulkAddReport {
            company_name: area.company_name,
            area_name: area.name,
            outcomes,
        })
    }

    async fn add_one(&self, company: &str, area: &str, name: &str, email: &str) -> MemberOutcome {
        let email = match validate_email(email) {
            Ok(email) => email,
            Err(err) => {
                return MemberOutcome::Rejected {
                    reason: err.user_message(),
                }
            }
        };
        let _permit = match self.ctx.guard.acquire(OperationKey::user(&email)) {
            Ok(permit) => permit,
            Err(err) => {
                return MemberOutcome::Failed {
                    error: err.user_message(),
                }
            }
        };

        let existing = match self.ctx.users.get_by_email(&email).await {
            Ok(existing) => existing,
            Err(err) => {
                tracing::debug!(email = %email, error = %err, "Lookup failed");
                return MemberOutcome::Failed {
                    error: err.user_message(),
                };
            }
        };
        if let Err(err) = validate_area_member(existing.as_ref()) {
            return MemberOutcome::Rejected {
                reason: err.user_message(),
            };
        }

        match self
            .ctx
            .users
            .upsert_by_email(UserInput::area_member(name, &email, company, area))
            .await
        {
            Ok(_) => MemberOutcome::Added,
            Err(err) => {
                tracing::debug!(email = %email, error = %err, "Upsert failed");
                MemberOutcome::Failed {
                    error: err.user_message(),
                }
            }
        }
    }

    /// Move a member to another area of the same company
    pub async fn edit_location(&self, email: &str, request: MemberLocationRequest) -> AdminResult<UserAssignment> {
        tracked(
            &self.status,
            &self.ctx.refresh,
            self.edit_location_inner(email, request),
        )
        .await
    }

    async fn edit_location_inner(&self, email: &str, request: MemberLocationRequest) -> AdminResult<UserAssignment> {
        let user = self.member(email).await?;
        if user.role != Role::AreaMember {
            return Err(AdminError::role_rejected(
                "Only area members can be relocated from here.",
            ));
        }
        if request.area_name.trim().is_empty() {
            return Err(AdminError::Validation("An area must be selected".to_string()));
        }

        let current_company = user.company().unwrap_or_default().to_string();
        validate_company_move(&current_company, &request.company_name)?;

        let target = self
            .ctx
            .areas_of(&current_company)
            .await?
            .into_iter()
            .find(|a| names_match(&a.name, &request.area_name))
            .ok_or_else(|| AdminError::AreaNotFound(request.area_name.clone()))?;

        let _permit = self.ctx.guard.acquire(OperationKey::user(&user.email))?;
        let updated = self
            .ctx
            .users
            .upsert_by_email(UserInput::area_member(
                user.name.clone(),
                &user.email,
                &current_company,
                &target.name,
            ))
            .await?;

        tracing::info!(
            email = %user.email,
            from = ?user.area(),
            to = %target.name,
            "Member relocated"
        );
        Ok(updated)
    }

    /// Delete a member's assignment. Unknown emails are a no-op.
    pub async fn remove(&self, email: &str) -> AdminResult<()> {
        tracked(&self.status, &self.ctx.refresh, self.remove_inner(email)).await
    }

    async fn remove_inner(&self, email: &str) -> AdminResult<()> {
        let email = validate_email(email)?;
        let _permit = self.ctx.guard.acquire(OperationKey::user(&email))?;
        let Some(user) = self.ctx.users.get_by_email(&email).await? else {
            tracing::debug!(email = %email, "Nothing to remove");
            return Ok(());
        };
        if !matches!(user.role, Role::AreaMember | Role::NoAccess) {
            return Err(AdminError::role_rejected(format!(
                "{} is {} and cannot be removed from the member list.",
                user.email, user.role
            )));
        }
        self.ctx.users.delete_by_email(&email).await?;
        tracing::info!(email = %email, "Member removed");
        Ok(())
    }
}
