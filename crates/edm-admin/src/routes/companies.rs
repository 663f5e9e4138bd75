//! Company HTTP routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use super::{can_see, AdminState};
use crate::error::AdminError;
use crate::models::{Company, CompanyAssociations, UserContext};
use crate::security::{require_permission, Action};
use crate::services::{CompanyDeletion, CreateCompanyRequest, UpdateCompanyRequest};

#[derive(Debug, Default, Deserialize)]
pub struct DeleteCompanyParams {
    #[serde(default)]
    pub confirm: bool,
}

pub fn routes(state: AdminState) -> Router {
    Router::new()
        .route("/api/companies", get(list_companies).post(create_company))
        .route("/api/companies/{id}", put(update_company).delete(delete_company))
        .route("/api/companies/{id}/associations", get(company_associations))
        .route("/api/companies/{id}/deletion", delete(cancel_deletion))
        .with_state(state)
}

/// Companies the caller can see
async fn list_companies(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<Vec<Company>>, AdminError> {
    let companies = state
        .companies
        .list()
        .await?
        .into_iter()
        .filter(|c| can_see(&caller, &c.name, None))
        .collect();
    Ok(Json(companies))
}

async fn create_company(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>), AdminError> {
    require_permission(&caller, &Action::ManageCompanies)?;
    let company = state.companies.create(req).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

async fn update_company(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCompanyRequest>,
) -> Result<Json<Company>, AdminError> {
    require_permission(&caller, &Action::ManageCompanies)?;
    let company = state.companies.update(&id, req).await?;
    Ok(Json(company))
}

/// First call may answer with `confirmationRequired`; repeat with
/// `?confirm=true` to go ahead
async fn delete_company(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
    Query(params): Query<DeleteCompanyParams>,
) -> Result<Json<CompanyDeletion>, AdminError> {
    require_permission(&caller, &Action::ManageCompanies)?;
    let outcome = state.companies.delete(&id, params.confirm).await?;
    Ok(Json(outcome))
}

async fn cancel_deletion(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    require_permission(&caller, &Action::ManageCompanies)?;
    state.companies.cancel_deletion(&id);
    Ok(StatusCode::NO_CONTENT)
}

/// Areas and users that block or complicate a deletion
async fn company_associations(
    State(state): State<AdminState>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<CompanyAssociations>, AdminError> {
    require_permission(&caller, &Action::ManageCompanies)?;
    let associations = state.companies.associations(&id).await?;
    Ok(Json(associations))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::models::UserInput;
    use crate::store::UserStore;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    async fn create_acme(app: &TestApp) -> String {
        let (status, body) = app
            .call(
                Method::POST,
                "/api/companies",
                Some(ROOT),
                Some(json!({"name": "Acme", "admin": {"name": "Boss", "email": "Boss@Acme.com"}})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_company_assigns_admin() {
        let app = TestApp::new().await;
        create_acme(&app).await;

        let boss = app.backend.users.get_by_email("boss@acme.com").await.unwrap().unwrap();
        assert_eq!(boss.role, crate::models::Role::CompanyAdmin);
        assert_eq!(boss.company_name.as_deref(), Some("Acme"));

        let (_, body) = app.call(Method::GET, "/api/companies", Some("boss@acme.com"), None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_only_general_admin_creates_companies() {
        let app = TestApp::new().await;
        create_acme(&app).await;

        let (status, body) = app
            .call(
                Method::POST,
                "/api/companies",
                Some("boss@acme.com"),
                Some(json!({"name": "Globex", "admin": {"name": "G", "email": "g@globex.com"}})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn test_delete_requires_second_confirmed_call() {
        let app = TestApp::new().await;
        let id = create_acme(&app).await;
        app.backend
            .users
            .upsert_by_email(UserInput::company_admin("Deputy", "deputy@acme.com", "Acme"))
            .await
            .unwrap();

        let uri = format!("/api/companies/{}", id);
        let (status, body) = app.call(Method::DELETE, &uri, Some(ROOT), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "confirmationRequired");
        assert_eq!(body["users"].as_array().unwrap().len(), 2);

        let (status, body) = app
            .call(Method::DELETE, &format!("{}?confirm=true", uri), Some(ROOT), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "deleted");
        assert_eq!(body["usersReset"], 2);

        let deputy = app.backend.users.get_by_email("deputy@acme.com").await.unwrap().unwrap();
        assert_eq!(deputy.role, crate::models::Role::NoAccess);
        assert!(deputy.company_name.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_confirmation_asks_again() {
        let app = TestApp::new().await;
        let id = create_acme(&app).await;

        let uri = format!("/api/companies/{}", id);
        let (_, body) = app.call(Method::DELETE, &uri, Some(ROOT), None).await;
        assert_eq!(body["status"], "confirmationRequired");

        let (status, _) = app
            .call(Method::DELETE, &format!("{}/deletion", uri), Some(ROOT), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = app
            .call(Method::DELETE, &format!("{}?confirm=true", uri), Some(ROOT), None)
            .await;
        assert_eq!(body["status"], "confirmationRequired");
    }
}
