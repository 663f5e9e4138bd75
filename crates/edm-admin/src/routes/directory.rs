//! Directory search route

use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;

use super::AdminState;
use crate::error::AdminError;
use crate::models::{DirectoryUser, UserContext};
use crate::security::{require_permission, Action};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub fn routes(state: AdminState) -> Router {
    Router::new()
        .route("/api/directory/search", get(search_directory))
        .with_state(state)
}

/// People whose name or email starts with `q`
async fn search_directory(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<DirectoryUser>>, AdminError> {
    require_permission(&caller, &Action::SearchDirectory)?;
    let people = state.directory.search(&params.q).await?;
    Ok(Json(people))
}
