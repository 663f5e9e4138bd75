//! Caller identity and navigation routes

use axum::{extract::State, routing::get, Extension, Json, Router};

use super::AdminState;
use crate::error::AdminError;
use crate::models::UserContext;
use crate::navigation::{load_tree, NavNode};

pub fn routes(state: AdminState) -> Router {
    Router::new()
        .route("/api/me", get(me))
        .route("/api/navigation", get(navigation))
        .with_state(state)
}

/// Resolved identity of the caller
async fn me(Extension(caller): Extension<UserContext>) -> Json<UserContext> {
    Json(caller)
}

/// Navigation tree scoped to the caller's role
async fn navigation(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<Vec<NavNode>>, AdminError> {
    let tree = load_tree(&state.ctx, &caller).await?;
    Ok(Json(tree))
}
