//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use edm_admin::models::{
    Area, AreaPatch, Assignment, DirectoryUser, Document, NewArea, NewCompany, UserAssignment,
    UserInput,
};
use edm_admin::services::{
    AdminContext, AreaService, CompanyService, CreateAreaRequest, CreateCompanyRequest,
    MemberService,
};
use edm_admin::store::{
    AreaStore, FolderItem, FolderParent, FolderStore, MemoryBackend, UserStore, MEMORY_DRIVE_ID,
};
use edm_admin::{AdminConfig, AdminError, AdminResult};

pub const ROOT: &str = "root@edm.com";

pub struct Fixture {
    pub backend: MemoryBackend,
    pub ctx: AdminContext,
    pub companies: CompanyService,
    pub areas: AreaService,
    pub members: MemberService,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(AdminConfig::default()).await
    }

    pub async fn with_config(config: AdminConfig) -> Self {
        let backend = MemoryBackend::new(&config);
        let ctx = backend.context(config);
        Self::assemble(backend, ctx).await
    }

    /// Same as `new` but folder calls go through `folders`
    pub async fn with_folders(folders: Arc<dyn FolderStore>) -> Self {
        let config = AdminConfig::default();
        let backend = MemoryBackend::new(&config);
        let ctx = AdminContext::new(
            config,
            backend.companies.clone(),
            backend.areas.clone(),
            backend.users.clone(),
            folders,
            backend.directory.clone(),
            backend.sites.clone(),
        );
        Self::assemble(backend, ctx).await
    }

    /// Same as `new` but area and user list calls go through switchable
    /// wrappers over the in-memory stores
    pub async fn with_flaky_lists() -> (Self, Arc<FlakyAreas>, Arc<FlakyUsers>) {
        let config = AdminConfig::default();
        let backend = MemoryBackend::new(&config);
        let areas = Arc::new(FlakyAreas::new(backend.areas.clone()));
        let users = Arc::new(FlakyUsers::new(backend.users.clone()));
        let ctx = AdminContext::new(
            config,
            backend.companies.clone(),
            areas.clone(),
            users.clone(),
            backend.folders.clone(),
            backend.directory.clone(),
            backend.sites.clone(),
        );
        (Self::assemble(backend, ctx).await, areas, users)
    }

    async fn assemble(backend: MemoryBackend, ctx: AdminContext) -> Self {
        backend
            .users
            .upsert_by_email(UserInput::new("Root", ROOT, Assignment::GeneralAdmin))
            .await
            .unwrap();
        Self {
            companies: CompanyService::new(ctx.clone()),
            areas: AreaService::new(ctx.clone()),
            members: MemberService::new(ctx.clone()),
            backend,
            ctx,
        }
    }

    pub async fn create_company(&self, name: &str, admin_email: &str) -> edm_admin::models::Company {
        self.companies
            .create(CreateCompanyRequest {
                name: name.to_string(),
                admin: Some(DirectoryUser::new("Admin", admin_email)),
            })
            .await
            .unwrap()
    }

    pub async fn create_area(&self, company: &str, name: &str, responsible: Option<&str>) -> Area {
        self.areas
            .create(CreateAreaRequest {
                company_name: company.to_string(),
                name: name.to_string(),
                responsible: responsible.map(|email| DirectoryUser::new(email, email)),
            })
            .await
            .unwrap()
    }

    /// Area record written straight to the store, no folder
    pub async fn raw_area(&self, company: &str, name: &str) -> Area {
        self.backend
            .areas
            .create(NewArea {
                name: name.to_string(),
                company_name: company.to_string(),
                responsible_email: None,
                admin_email: String::new(),
            })
            .await
            .unwrap()
    }

    /// Company record written straight to the store, no folder
    pub async fn raw_company(&self, name: &str) -> edm_admin::models::Company {
        use edm_admin::store::CompanyStore;
        self.backend
            .companies
            .create(NewCompany {
                name: name.to_string(),
                admin_email: String::new(),
            })
            .await
            .unwrap()
    }

    pub async fn put_user(&self, input: UserInput) -> UserAssignment {
        self.backend.users.upsert_by_email(input).await.unwrap()
    }

    pub async fn user(&self, email: &str) -> Option<UserAssignment> {
        self.backend.users.get_by_email(email).await.unwrap()
    }

    pub async fn folder(&self, path: &[&str]) -> Option<String> {
        self.backend.folders.folder_at(MEMORY_DRIVE_ID, path).await
    }
}

/// Folder store that can be switched to fail every mutation
pub struct FlakyFolders {
    inner: Arc<dyn FolderStore>,
    pub broken: AtomicBool,
}

impl FlakyFolders {
    pub fn new(inner: Arc<dyn FolderStore>) -> Self {
        Self {
            inner,
            broken: AtomicBool::new(false),
        }
    }

    pub fn break_now(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> AdminResult<()> {
        if self.broken.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FolderStore for FlakyFolders {
    async fn child_folders(&self, drive_id: &str, parent: &FolderParent) -> AdminResult<Vec<FolderItem>> {
        self.inner.child_folders(drive_id, parent).await
    }

    async fn create_folder(&self, drive_id: &str, parent: &FolderParent, name: &str) -> AdminResult<FolderItem> {
        self.check()?;
        self.inner.create_folder(drive_id, parent, name).await
    }

    async fn rename_item(&self, drive_id: &str, item_id: &str, new_name: &str) -> AdminResult<()> {
        self.check()?;
        self.inner.rename_item(drive_id, item_id, new_name).await
    }

    async fn delete_item(&self, drive_id: &str, item_id: &str) -> AdminResult<()> {
        self.check()?;
        self.inner.delete_item(drive_id, item_id).await
    }

    async fn list_children(&self, drive_id: &str, folder_id: &str) -> AdminResult<Vec<Document>> {
        self.inner.list_children(drive_id, folder_id).await
    }
}

fn unavailable() -> AdminError {
    AdminError::Transport("503 Service Unavailable".to_string())
}

/// Area list whose deletes fail once broken
pub struct FlakyAreas {
    inner: Arc<dyn AreaStore>,
    pub broken: AtomicBool,
}

impl FlakyAreas {
    pub fn new(inner: Arc<dyn AreaStore>) -> Self {
        Self {
            inner,
            broken: AtomicBool::new(false),
        }
    }

    pub fn break_now(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AreaStore for FlakyAreas {
    async fn list(&self) -> AdminResult<Vec<Area>> {
        self.inner.list().await
    }

    async fn get(&self, id: &str) -> AdminResult<Option<Area>> {
        self.inner.get(id).await
    }

    async fn create(&self, area: NewArea) -> AdminResult<Area> {
        self.inner.create(area).await
    }

    async fn update(&self, id: &str, patch: AreaPatch) -> AdminResult<()> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> AdminResult<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.delete(id).await
    }
}

/// User list whose full listing fails once broken
pub struct FlakyUsers {
    inner: Arc<dyn UserStore>,
    pub broken: AtomicBool,
}

impl FlakyUsers {
    pub fn new(inner: Arc<dyn UserStore>) -> Self {
        Self {
            inner,
            broken: AtomicBool::new(false),
        }
    }

    pub fn break_now(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for FlakyUsers {
    async fn list(&self) -> AdminResult<Vec<UserAssignment>> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.list().await
    }

    async fn get_by_email(&self, email: &str) -> AdminResult<Option<UserAssignment>> {
        self.inner.get_by_email(email).await
    }

    async fn upsert_by_email(&self, user: UserInput) -> AdminResult<UserAssignment> {
        self.inner.upsert_by_email(user).await
    }

    async fn delete_by_email(&self, email: &str) -> AdminResult<()> {
        self.inner.delete_by_email(email).await
    }
}
