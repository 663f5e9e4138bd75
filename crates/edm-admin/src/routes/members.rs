//! Area member HTTP routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use super::areas::AreaLookupParams;
use super::AdminState;
use crate::error::AdminError;
use crate::models::{DirectoryUser, UserAssignment, UserContext};
use crate::security::{require_permission, Action};
use crate::services::{BulkAddReport, MemberLocationRequest};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMembersRequest {
    pub candidates: Vec<DirectoryUser>,
}

pub fn routes(state: AdminState) -> Router {
    Router::new()
        .route("/api/areas/{id}/members", get(list_members).post(add_members))
        .route("/api/members/{email}/location", put(edit_location))
        .route("/api/members/{email}", axum::routing::delete(remove_member))
        .with_state(state)
}

async fn list_members(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
    Query(lookup): Query<AreaLookupParams>,
) -> Result<Json<Vec<UserAssignment>>, AdminError> {
    let area_ref = lookup.area_ref(id);
    let area = state.areas.get(&area_ref).await?;
    require_permission(
        &caller,
        &Action::ManageMembers {
            company: &area.company_name,
            area: &area.name,
        },
    )?;
    let members = state.members.list(&area_ref).await?;
    Ok(Json(members))
}

/// Add several directory users; the report carries one outcome per user
async fn add_members(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
    Query(lookup): Query<AreaLookupParams>,
    Json(req): Json<AddMembersRequest>,
) -> Result<Json<BulkAddReport>, AdminError> {
    let area_ref = lookup.area_ref(id);
    let area = state.areas.get(&area_ref).await?;
    require_permission(
        &caller,
        &Action::ManageMembers {
            company: &area.company_name,
            area: &area.name,
        },
    )?;
    let report = state.members.add_members(&area_ref, req.candidates).await?;
    Ok(Json(report))
}

/// Move a member to another area; the caller must manage both areas
async fn edit_location(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(email): Path<String>,
    Json(req): Json<MemberLocationRequest>,
) -> Result<Json<UserAssignment>, AdminError> {
    let member = state.members.member(&email).await?;
    let company = member.company().unwrap_or_default();
    require_permission(
        &caller,
        &Action::ManageMembers {
            company,
            area: member.area().unwrap_or_default(),
        },
    )?;
    require_permission(
        &caller,
        &Action::ManageMembers {
            company,
            area: &req.area_name,
        },
    )?;
    let updated = state.members.edit_location(&email, req).await?;
    Ok(Json(updated))
}

async fn remove_member(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(email): Path<String>,
) -> Result<StatusCode, AdminError> {
    match state.members.member(&email).await {
        Ok(member) => {
            require_permission(
                &caller,
                &Action::ManageMembers {
                    company: member.company().unwrap_or_default(),
                    area: member.area().unwrap_or_default(),
                },
            )?;
        }
        Err(AdminError::UserNotFound(_)) => {
            tracing::debug!(email = %email, "Removal of unknown member");
            return Ok(StatusCode::NO_CONTENT);
        }
        Err(err) => return Err(err),
    }
    state.members.remove(&email).await?;
    Ok(StatusCode::NO_CONTENT)
}
