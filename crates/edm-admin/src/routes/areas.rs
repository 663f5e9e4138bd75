//! Area HTTP routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use super::{can_see, AdminState};
use crate::error::AdminError;
use crate::models::{Area, UserContext};
use crate::security::{require_permission, Action};
use crate::services::{AreaRef, CreateAreaRequest, ReassignResponsibleRequest};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAreasParams {
    pub company_name: Option<String>,
}

/// Optional (company, name) pair used when the id lookup misses
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaLookupParams {
    pub company_name: Option<String>,
    pub name: Option<String>,
}

impl AreaLookupParams {
    pub fn area_ref(self, id: String) -> AreaRef {
        AreaRef {
            id,
            company_name: self.company_name,
            name: self.name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameAreaRequest {
    pub name: String,
}

pub fn routes(state: AdminState) -> Router {
    Router::new()
        .route("/api/areas", get(list_areas).post(create_area))
        .route("/api/areas/{id}", get(get_area).delete(delete_area))
        .route("/api/areas/{id}/responsible", put(reassign_responsible))
        .route("/api/areas/{id}/name", put(rename_area))
        .with_state(state)
}

/// Areas the caller can see, optionally limited to one company
async fn list_areas(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Query(params): Query<ListAreasParams>,
) -> Result<Json<Vec<Area>>, AdminError> {
    let areas = state
        .areas
        .list(params.company_name.as_deref())
        .await?
        .into_iter()
        .filter(|a| can_see(&caller, &a.company_name, Some(&a.name)))
        .collect();
    Ok(Json(areas))
}

async fn get_area(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
    Query(lookup): Query<AreaLookupParams>,
) -> Result<Json<Area>, AdminError> {
    let area = state.areas.get(&lookup.area_ref(id)).await?;
    super::require_visible(&caller, &area.company_name, Some(&area.name))?;
    Ok(Json(area))
}

async fn create_area(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Json(req): Json<CreateAreaRequest>,
) -> Result<(StatusCode, Json<Area>), AdminError> {
    require_permission(
        &caller,
        &Action::ManageAreas {
            company: &req.company_name,
        },
    )?;
    let area = state.areas.create(req).await?;
    Ok((StatusCode::CREATED, Json(area)))
}

async fn delete_area(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
    Query(lookup): Query<AreaLookupParams>,
) -> Result<StatusCode, AdminError> {
    let area_ref = lookup.area_ref(id);
    let area = state.areas.get(&area_ref).await?;
    require_permission(
        &caller,
        &Action::ManageAreas {
            company: &area.company_name,
        },
    )?;
    state.areas.delete(&area_ref).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reassign_responsible(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
    Query(lookup): Query<AreaLookupParams>,
    Json(req): Json<ReassignResponsibleRequest>,
) -> Result<Json<Area>, AdminError> {
    let area_ref = lookup.area_ref(id);
    let area = state.areas.get(&area_ref).await?;
    require_permission(
        &caller,
        &Action::ManageResponsible {
            company: &area.company_name,
        },
    )?;
    let updated = state.areas.reassign_responsible(&area_ref, req).await?;
    Ok(Json(updated))
}

async fn rename_area(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
    Query(lookup): Query<AreaLookupParams>,
    Json(req): Json<RenameAreaRequest>,
) -> Result<Json<Area>, AdminError> {
    let area_ref = lookup.area_ref(id);
    let area = state.areas.get(&area_ref).await?;
    require_permission(
        &caller,
        &Action::ManageAreas {
            company: &area.company_name,
        },
    )?;
    let renamed = state.areas.rename(&area_ref, &req.name).await?;
    Ok(Json(renamed))
}
