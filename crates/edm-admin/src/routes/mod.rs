//! Routes module - HTTP API endpoints
//!
//! The authentication proxy in front of the API puts the signed-in user's
//! email in `x-user-email`. [`resolve_caller`] turns it into a
//! [`UserContext`] extension every handler reads.

pub mod areas;
pub mod companies;
pub mod directory;
pub mod documents;
pub mod identity;
pub mod members;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::sync::Arc;

use crate::error::{AdminError, AdminResult};
use crate::models::{Role, UserContext};
use crate::security::names_match;
use crate::services::{
    AdminContext, AreaService, CompanyService, DirectoryLookup, DocumentService, IdentityService,
    MemberService,
};

pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const ROLE_OVERRIDE_HEADER: &str = "x-role-override";

/// Shared state for every admin route
#[derive(Clone)]
pub struct AdminState {
    pub ctx: AdminContext,
    pub companies: Arc<CompanyService>,
    pub areas: Arc<AreaService>,
    pub members: Arc<MemberService>,
    pub documents: Arc<DocumentService>,
    pub identity: IdentityService,
    pub directory: DirectoryLookup,
}

impl AdminState {
    pub fn new(ctx: AdminContext) -> Self {
        let directory = DirectoryLookup::new(ctx.directory.clone(), ctx.config.search_page_size);
        Self {
            companies: Arc::new(CompanyService::new(ctx.clone())),
            areas: Arc::new(AreaService::new(ctx.clone())),
            members: Arc::new(MemberService::new(ctx.clone())),
            documents: Arc::new(DocumentService::new(ctx.clone())),
            identity: IdentityService::new(ctx.users.clone()),
            directory,
            ctx,
        }
    }
}

/// Full API router
pub fn router(state: AdminState) -> Router {
    Router::new()
        .merge(identity::routes(state.clone()))
        .merge(companies::routes(state.clone()))
        .merge(areas::routes(state.clone()))
        .merge(members::routes(state.clone()))
        .merge(documents::routes(state.clone()))
        .merge(directory::routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, resolve_caller))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Resolve the caller and attach their identity to the request
pub async fn resolve_caller(
    State(state): State<AdminState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AdminError> {
    let email = header_value(request.headers(), USER_EMAIL_HEADER).ok_or(AdminError::Unauthorized)?;
    let role_override = header_value(request.headers(), ROLE_OVERRIDE_HEADER).and_then(|raw| {
        raw.parse::<Role>()
            .map_err(|_| tracing::debug!(value = %raw, "Unknown role override"))
            .ok()
    });

    let caller = state.identity.resolve(email, role_override).await?;
    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Whether `user` may look at things scoped to `company` (and `area`)
pub(crate) fn can_see(user: &UserContext, company: &str, area: Option<&str>) -> bool {
    match user.role {
        Role::GeneralAdmin => true,
        Role::NoAccess => false,
        Role::CompanyAdmin => user.company().is_some_and(|own| names_match(own, company)),
        Role::AreaResponsible | Role::AreaMember => {
            let company_ok = user.company().is_some_and(|own| names_match(own, company));
            let area_ok = match area {
                Some(area) => user.area().is_some_and(|own| names_match(own, area)),
                None => true,
            };
            company_ok && area_ok
        }
    }
}

pub(crate) fn require_visible(user: &UserContext, company: &str, area: Option<&str>) -> AdminResult<()> {
    if can_see(user, company, area) {
        Ok(())
    } else {
        Err(AdminError::PermissionDenied {
            action: match area {
                Some(area) => format!("view {}/{}", company, area),
                None => format!("view {}", company),
            },
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::http::{Method, StatusCode};

    fn user(role: Role, company: Option<&str>, area: Option<&str>) -> UserContext {
        UserContext {
            email: "x@acme.com".to_string(),
            name: None,
            role,
            company_name: company.map(str::to_string),
            area_name: area.map(str::to_string),
        }
    }

    #[test]
    fn test_visibility_by_role() {
        let member = user(Role::AreaMember, Some("Acme"), Some("Ventas"));
        assert!(can_see(&member, "acme", Some("ventas")));
        assert!(can_see(&member, "Acme", None));
        assert!(!can_see(&member, "Acme", Some("Compras")));

        let admin = user(Role::CompanyAdmin, Some("Acme"), None);
        assert!(can_see(&admin, "Acme", Some("Compras")));
        assert!(!can_see(&admin, "Globex", None));

        assert!(!can_see(&user(Role::NoAccess, None, None), "Acme", None));
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let app = TestApp::new().await;
        let (status, body) = app.call(Method::GET, "/api/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}
