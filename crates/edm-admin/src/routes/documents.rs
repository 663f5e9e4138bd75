//! Document browsing routes

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};

use super::areas::AreaLookupParams;
use super::AdminState;
use crate::error::AdminError;
use crate::models::{DocumentView, UserContext};
use crate::security::{require_permission, Action};

pub fn routes(state: AdminState) -> Router {
    Router::new()
        .route("/api/areas/{id}/documents", get(list_documents))
        .with_state(state)
}

/// Files of an area's folder with size label and preview kind
async fn list_documents(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
    Query(lookup): Query<AreaLookupParams>,
) -> Result<Json<Vec<DocumentView>>, AdminError> {
    let area = state.areas.get(&lookup.area_ref(id)).await?;
    require_permission(
        &caller,
        &Action::BrowseDocuments {
            company: &area.company_name,
            area: &area.name,
        },
    )?;
    let documents = state.documents.list_for(&area.company_name, &area.name).await?;
    Ok(Json(documents))
}
