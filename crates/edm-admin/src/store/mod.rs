//! External collaborators
//!
//! The list store, the drive store, the directory and the site resolver are
//! remote services. The orchestration layer only sees these traits; the
//! in-memory implementations in [`memory`] back the tests and the standalone
//! server.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AdminResult;
use crate::models::{
    Area, AreaPatch, Company, CompanyPatch, DirectoryUser, Document, NewArea, NewCompany,
    UserAssignment, UserInput,
};

pub use memory::*;

/// Company list
#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn list(&self) -> AdminResult<Vec<Company>>;
    async fn get(&self, id: &str) -> AdminResult<Option<Company>>;
    async fn create(&self, company: NewCompany) -> AdminResult<Company>;
    async fn update(&self, id: &str, patch: CompanyPatch) -> AdminResult<()>;
    async fn delete(&self, id: &str) -> AdminResult<()>;
}

/// Area list
#[async_trait]
pub trait AreaStore: Send + Sync {
    async fn list(&self) -> AdminResult<Vec<Area>>;
    async fn get(&self, id: &str) -> AdminResult<Option<Area>>;
    async fn create(&self, area: NewArea) -> AdminResult<Area>;
    async fn update(&self, id: &str, patch: AreaPatch) -> AdminResult<()>;
    async fn delete(&self, id: &str) -> AdminResult<()>;
}

/// User assignment list, keyed by normalized email
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> AdminResult<Vec<UserAssignment>>;
    async fn get_by_email(&self, email: &str) -> AdminResult<Option<UserAssignment>>;
    /// Create if absent, else patch. Never duplicates an email.
    async fn upsert_by_email(&self, user: UserInput) -> AdminResult<UserAssignment>;
    /// Absent emails are a no-op
    async fn delete_by_email(&self, email: &str) -> AdminResult<()>;
}

/// Where a folder lives inside a drive
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FolderParent {
    Root,
    Item(String),
}

impl FolderParent {
    pub fn item(id: impl Into<String>) -> Self {
        FolderParent::Item(id.into())
    }
}

/// A child folder returned by the drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderItem {
    pub id: String,
    pub name: String,
}

/// File storage primitives
#[async_trait]
pub trait FolderStore: Send + Sync {
    async fn child_folders(&self, drive_id: &str, parent: &FolderParent) -> AdminResult<Vec<FolderItem>>;
    /// Fails with `AdminError::Conflict` when the name is already taken
    async fn create_folder(
        &self,
        drive_id: &str,
        parent: &FolderParent,
        name: &str,
    ) -> AdminResult<FolderItem>;
    async fn rename_item(&self, drive_id: &str, item_id: &str, new_name: &str) -> AdminResult<()>;
    async fn delete_item(&self, drive_id: &str, item_id: &str) -> AdminResult<()>;
    async fn list_children(&self, drive_id: &str, folder_id: &str) -> AdminResult<Vec<Document>>;
}

/// People lookup in the organization directory
#[async_trait]
pub trait DirectorySearch: Send + Sync {
    async fn search(&self, text: &str, limit: usize) -> AdminResult<Vec<DirectoryUser>>;
}

/// Site and library identifier lookups
#[async_trait]
pub trait SiteResolver: Send + Sync {
    async fn resolve_site(&self, hostname: &str, site_path: &str) -> AdminResult<String>;
    async fn resolve_drive(&self, site_id: &str, library_name: &str) -> AdminResult<String>;
}
