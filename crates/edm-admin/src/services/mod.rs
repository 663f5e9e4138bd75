//! Services module - orchestration of company, area and user lifecycles

pub mod area_service;
pub mod autocomplete;
pub mod company_service;
pub mod document_service;
pub mod folder_service;
pub mod guard;
pub mod identifiers;
pub mod identity_service;
pub mod member_service;
pub mod report;
pub mod status;

pub use area_service::*;
pub use autocomplete::*;
pub use company_service::*;
pub use document_service::*;
pub use folder_service::*;
pub use guard::*;
pub use identifiers::*;
pub use identity_service::*;
pub use member_service::*;
pub use report::*;
pub use status::*;

use std::sync::Arc;

use crate::config::AdminConfig;
use crate::error::{AdminError, AdminResult};
use crate::models::{Area, Company};
use crate::security::names_match;
use crate::store::{AreaStore, CompanyStore, DirectorySearch, FolderStore, SiteResolver, UserStore};

/// Collaborators and shared state every orchestrator works against
#[derive(Clone)]
pub struct AdminContext {
    pub companies: Arc<dyn CompanyStore>,
    pub areas: Arc<dyn AreaStore>,
    pub users: Arc<dyn UserStore>,
    pub directory: Arc<dyn DirectorySearch>,
    pub folders: FolderResolver,
    pub library: LibraryLocator,
    pub guard: OperationGuard,
    pub refresh: RefreshSignal,
    pub config: Arc<AdminConfig>,
}

impl AdminContext {
    pub fn new(
        config: AdminConfig,
        companies: Arc<dyn CompanyStore>,
        areas: Arc<dyn AreaStore>,
        users: Arc<dyn UserStore>,
        folders: Arc<dyn FolderStore>,
        directory: Arc<dyn DirectorySearch>,
        sites: Arc<dyn SiteResolver>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            companies,
            areas,
            users,
            directory,
            folders: FolderResolver::new(folders),
            library: LibraryLocator::new(sites, config.clone()),
            guard: OperationGuard::new(),
            refresh: RefreshSignal::new(),
            config,
        }
    }

    pub async fn company_by_id(&self, id: &str) -> AdminResult<Company> {
        self.companies
            .get(id)
            .await?
            .ok_or_else(|| AdminError::CompanyNotFound(id.to_string()))
    }

    /// Company whose name matches, ignoring case and accents
    pub async fn company_by_name(&self, name: &str) -> AdminResult<Company> {
        self.companies
            .list()
            .await?
            .into_iter()
            .find(|c| names_match(&c.name, name))
            .ok_or_else(|| AdminError::CompanyNotFound(name.to_string()))
    }

    /// Area by id, falling back to the (company, name) pair when the id
    /// lookup misses
    pub async fn find_area(&self, id: &str, fallback: Option<(&str, &str)>) -> AdminResult<Area> {
        if let Some(area) = self.areas.get(id).await? {
            return Ok(area);
        }
        if let Some((company, name)) = fallback {
            let found = self
                .areas
                .list()
                .await?
                .into_iter()
                .find(|a| names_match(&a.company_name, company) && names_match(&a.name, name));
            if let Some(area) = found {
                tracing::debug!(id = %id, area = %area.name, "Area resolved by name");
                return Ok(area);
            }
        }
        Err(AdminError::AreaNotFound(id.to_string()))
    }

    /// Areas owned by `company` (exact name)
    pub async fn areas_of(&self, company: &str) -> AdminResult<Vec<Area>> {
        Ok(self
            .areas
            .list()
            .await?
            .into_iter()
            .filter(|a| a.belongs_to(company))
            .collect())
    }
}

/// Run an orchestration with the status channel and refresh signal wired in
pub(crate) async fn tracked<T, F>(status: &ActionStatus, refresh: &RefreshSignal, operation: F) -> AdminResult<T>
where
    F: std::future::Future<Output = AdminResult<T>>,
{
    status.begin();
    let result = operation.await;
    status.finish(&result);
    if result.is_ok() {
        refresh.trigger();
    }
    result
}
