//! In-memory collaborators

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AreaStore, CompanyStore, DirectorySearch, FolderItem, FolderParent, FolderStore,
    SiteResolver, UserStore,
};
use crate::config::AdminConfig;
use crate::error::{AdminError, AdminResult};
use crate::models::{
    normalize_email, Area, AreaPatch, Company, CompanyPatch, DirectoryUser, Document, NewArea,
    NewCompany, UserAssignment, UserInput,
};
use crate::security::names_match;
use crate::services::AdminContext;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Company list held in memory
#[derive(Default)]
pub struct MemoryCompanyStore {
    items: RwLock<BTreeMap<String, Company>>,
}

impl MemoryCompanyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_companies(companies: impl IntoIterator<Item = Company>) -> Self {
        let items = companies.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            items: RwLock::new(items),
        }
    }
}

#[async_trait]
impl CompanyStore for MemoryCompanyStore {
    async fn list(&self) -> AdminResult<Vec<Company>> {
        let items = self.items.read().await;
        let mut companies: Vec<Company> = items.values().cloned().collect();
        companies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(companies)
    }

    async fn get(&self, id: &str) -> AdminResult<Option<Company>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn create(&self, company: NewCompany) -> AdminResult<Company> {
        let record = Company {
            id: new_id(),
            name: company.name,
            admin_email: normalize_email(&company.admin_email),
            created_at: Utc::now(),
            active: true,
        };
        self.items
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, patch: CompanyPatch) -> AdminResult<()> {
        let mut items = self.items.write().await;
        let company = items
            .get_mut(id)
            .ok_or_else(|| AdminError::CompanyNotFound(id.to_string()))?;
        patch.apply(company);
        Ok(())
    }

    async fn delete(&self, id: &str) -> AdminResult<()> {
        self.items
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AdminError::CompanyNotFound(id.to_string()))
    }
}

/// Area list held in memory
#[derive(Default)]
pub struct MemoryAreaStore {
    items: RwLock<BTreeMap<String, Area>>,
}

impl MemoryAreaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_areas(areas: impl IntoIterator<Item = Area>) -> Self {
        let items = areas.into_iter().map(|a| (a.id.clone(), a)).collect();
        Self {
            items: RwLock::new(items),
        }
    }
}

#[async_trait]
impl AreaStore for MemoryAreaStore {
    async fn list(&self) -> AdminResult<Vec<Area>> {
        let items = self.items.read().await;
        let mut areas: Vec<Area> = items.values().cloned().collect();
        areas.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(areas)
    }

    async fn get(&self, id: &str) -> AdminResult<Option<Area>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn create(&self, area: NewArea) -> AdminResult<Area> {
        let record = Area {
            id: new_id(),
            name: area.name,
            company_name: area.company_name,
            responsible_email: area.responsible_email.map(|e| normalize_email(&e)),
            admin_email: normalize_email(&area.admin_email),
            created_at: Utc::now(),
            active: true,
        };
        self.items
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, patch: AreaPatch) -> AdminResult<()> {
        let mut items = self.items.write().await;
        let area = items
            .get_mut(id)
            .ok_or_else(|| AdminError::AreaNotFound(id.to_string()))?;
        patch.apply(area);
        Ok(())
    }

    async fn delete(&self, id: &str) -> AdminResult<()> {
        self.items
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AdminError::AreaNotFound(id.to_string()))
    }
}

/// User assignments keyed by normalized email
#[derive(Default)]
pub struct MemoryUserStore {
    items: RwLock<BTreeMap<String, UserAssignment>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserAssignment>) -> Self {
        let items = users
            .into_iter()
            .map(|mut u| {
                u.email = normalize_email(&u.email);
                (u.email.clone(), u)
            })
            .collect();
        Self {
            items: RwLock::new(items),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self) -> AdminResult<Vec<UserAssignment>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn get_by_email(&self, email: &str) -> AdminResult<Option<UserAssignment>> {
        Ok(self.items.read().await.get(&normalize_email(email)).cloned())
    }

    async fn upsert_by_email(&self, user: UserInput) -> AdminResult<UserAssignment> {
        let email = normalize_email(&user.email);
        let mut items = self.items.write().await;
        let id = items
            .get(&email)
            .map(|existing| existing.id.clone())
            .unwrap_or_else(new_id);
        let mut record = user.into_record(id);
        record.email = email.clone();
        items.insert(email, record.clone());
        Ok(record)
    }

    async fn delete_by_email(&self, email: &str) -> AdminResult<()> {
        self.items.write().await.remove(&normalize_email(email));
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum EntryKind {
    Folder,
    File(Document),
}

#[derive(Debug, Clone)]
struct Entry {
    drive_id: String,
    parent: FolderParent,
    name: String,
    kind: EntryKind,
}

impl Entry {
    fn is_folder(&self) -> bool {
        matches!(self.kind, EntryKind::Folder)
    }
}

/// Drive tree held in memory. Sibling names are unique ignoring case, like
/// the document library.
#[derive(Default)]
pub struct MemoryFolderStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryFolderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a file into a folder
    pub async fn add_document(&self, folder_id: &str, mut document: Document) -> AdminResult<()> {
        let mut entries = self.entries.write().await;
        let drive_id = entries
            .get(folder_id)
            .filter(|e| e.is_folder())
            .map(|e| e.drive_id.clone())
            .ok_or_else(|| AdminError::FolderNotFound(folder_id.to_string()))?;
        document.drive_id = drive_id.clone();
        entries.insert(
            document.id.clone(),
            Entry {
                drive_id,
                parent: FolderParent::item(folder_id),
                name: document.name.clone(),
                kind: EntryKind::File(document),
            },
        );
        Ok(())
    }

    /// Follow exact folder names from the root, returning the last folder id
    pub async fn folder_at(&self, drive_id: &str, path: &[&str]) -> Option<String> {
        let entries = self.entries.read().await;
        let mut parent = FolderParent::Root;
        let mut found = None;
        for segment in path {
            let (id, _) = entries.iter().find(|(_, e)| {
                e.is_folder() && e.drive_id == drive_id && e.parent == parent && e.name == *segment
            })?;
            found = Some(id.clone());
            parent = FolderParent::item(id.clone());
        }
        found
    }

    fn name_taken(
        entries: &HashMap<String, Entry>,
        drive_id: &str,
        parent: &FolderParent,
        name: &str,
        except: Option<&str>,
    ) -> bool {
        entries.iter().any(|(id, e)| {
            Some(id.as_str()) != except
                && e.drive_id == drive_id
                && &e.parent == parent
                && e.name.to_lowercase() == name.to_lowercase()
        })
    }
}

#[async_trait]
impl FolderStore for MemoryFolderStore {
    async fn child_folders(&self, drive_id: &str, parent: &FolderParent) -> AdminResult<Vec<FolderItem>> {
        let entries = self.entries.read().await;
        let mut folders: Vec<FolderItem> = entries
            .iter()
            .filter(|(_, e)| e.is_folder() && e.drive_id == drive_id && &e.parent == parent)
            .map(|(id, e)| FolderItem {
                id: id.clone(),
                name: e.name.clone(),
            })
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn create_folder(
        &self,
        drive_id: &str,
        parent: &FolderParent,
        name: &str,
    ) -> AdminResult<FolderItem> {
        let mut entries = self.entries.write().await;
        if let FolderParent::Item(parent_id) = parent {
            if !entries.get(parent_id).is_some_and(Entry::is_folder) {
                return Err(AdminError::FolderNotFound(parent_id.clone()));
            }
        }
        if Self::name_taken(&entries, drive_id, parent, name, None) {
            return Err(AdminError::Conflict(format!("'{}' already exists", name)));
        }

        let id = new_id();
        entries.insert(
            id.clone(),
            Entry {
                drive_id: drive_id.to_string(),
                parent: parent.clone(),
                name: name.to_string(),
                kind: EntryKind::Folder,
            },
        );
        Ok(FolderItem {
            id,
            name: name.to_string(),
        })
    }

    async fn rename_item(&self, drive_id: &str, item_id: &str, new_name: &str) -> AdminResult<()> {
        let mut entries = self.entries.write().await;
        let parent = entries
            .get(item_id)
            .filter(|e| e.drive_id == drive_id)
            .map(|e| e.parent.clone())
            .ok_or_else(|| AdminError::FolderNotFound(item_id.to_string()))?;
        if Self::name_taken(&entries, drive_id, &parent, new_name, Some(item_id)) {
            return Err(AdminError::Conflict(format!("'{}' already exists", new_name)));
        }
        if let Some(entry) = entries.get_mut(item_id) {
            entry.name = new_name.to_string();
            if let EntryKind::File(ref mut document) = entry.kind {
                document.name = new_name.to_string();
            }
        }
        Ok(())
    }

    async fn delete_item(&self, drive_id: &str, item_id: &str) -> AdminResult<()> {
        let mut entries = self.entries.write().await;
        if !entries.get(item_id).is_some_and(|e| e.drive_id == drive_id) {
            return Err(AdminError::FolderNotFound(item_id.to_string()));
        }

        // Remove the item and everything below it
        let mut pending = vec![item_id.to_string()];
        while let Some(id) = pending.pop() {
            entries.remove(&id);
            let parent = FolderParent::item(id);
            pending.extend(
                entries
                    .iter()
                    .filter(|(_, e)| e.parent == parent)
                    .map(|(child, _)| child.clone()),
            );
        }
        Ok(())
    }

    async fn list_children(&self, drive_id: &str, folder_id: &str) -> AdminResult<Vec<Document>> {
        let entries = self.entries.read().await;
        if !entries
            .get(folder_id)
            .is_some_and(|e| e.is_folder() && e.drive_id == drive_id)
        {
            return Err(AdminError::FolderNotFound(folder_id.to_string()));
        }
        let parent = FolderParent::item(folder_id);
        let mut documents: Vec<Document> = entries
            .values()
            .filter(|e| e.parent == parent)
            .filter_map(|e| match &e.kind {
                EntryKind::File(document) => Some(document.clone()),
                EntryKind::Folder => None,
            })
            .collect();
        documents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(documents)
    }
}

/// Directory backed by a fixed list of people
#[derive(Default)]
pub struct StaticDirectory {
    people: RwLock<Vec<DirectoryUser>>,
}

impl StaticDirectory {
    pub fn new(people: impl IntoIterator<Item = DirectoryUser>) -> Self {
        Self {
            people: RwLock::new(people.into_iter().collect()),
        }
    }

    pub async fn add(&self, person: DirectoryUser) {
        self.people.write().await.push(person);
    }
}

#[async_trait]
impl DirectorySearch for StaticDirectory {
    /// Prefix match on the display name, any word of it, or the email
    async fn search(&self, text: &str, limit: usize) -> AdminResult<Vec<DirectoryUser>> {
        let needle = text.trim().to_lowercase();
        let people = self.people.read().await;
        Ok(people
            .iter()
            .filter(|p| {
                let name = p.name.to_lowercase();
                name.starts_with(&needle)
                    || name.split_whitespace().any(|w| w.starts_with(&needle))
                    || p.email.to_lowercase().starts_with(&needle)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Site resolver answering from a fixed table. Counts lookups so callers can
/// observe caching.
pub struct StaticSiteResolver {
    site_id: String,
    drives: HashMap<String, String>,
    lookups: AtomicUsize,
}

impl StaticSiteResolver {
    pub fn new(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            drives: HashMap::new(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn with_drive(mut self, library_name: impl Into<String>, drive_id: impl Into<String>) -> Self {
        self.drives.insert(library_name.into(), drive_id.into());
        self
    }

    /// Number of remote lookups served so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SiteResolver for StaticSiteResolver {
    async fn resolve_site(&self, _hostname: &str, _site_path: &str) -> AdminResult<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.site_id.clone())
    }

    async fn resolve_drive(&self, site_id: &str, library_name: &str) -> AdminResult<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if site_id != self.site_id {
            return Err(AdminError::MalformedResponse(format!("unknown site {}", site_id)));
        }
        self.drives
            .iter()
            .find(|(name, _)| names_match(name, library_name))
            .map(|(_, id)| id.clone())
            .ok_or_else(|| AdminError::FolderNotFound(format!("document library '{}'", library_name)))
    }
}

/// Drive id the in-memory site resolver hands out for the document library
pub const MEMORY_DRIVE_ID: &str = "drive-edm";

/// The full set of in-memory collaborators. Kept as concrete types so callers
/// can seed and inspect them next to the services using them.
#[derive(Clone)]
pub struct MemoryBackend {
    pub companies: Arc<MemoryCompanyStore>,
    pub areas: Arc<MemoryAreaStore>,
    pub users: Arc<MemoryUserStore>,
    pub folders: Arc<MemoryFolderStore>,
    pub directory: Arc<StaticDirectory>,
    pub sites: Arc<StaticSiteResolver>,
}

impl MemoryBackend {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            companies: Arc::new(MemoryCompanyStore::new()),
            areas: Arc::new(MemoryAreaStore::new()),
            users: Arc::new(MemoryUserStore::new()),
            folders: Arc::new(MemoryFolderStore::new()),
            directory: Arc::new(StaticDirectory::default()),
            sites: Arc::new(
                StaticSiteResolver::new("site-edm").with_drive(&config.library_name, MEMORY_DRIVE_ID),
            ),
        }
    }

    pub fn context(&self, config: AdminConfig) -> AdminContext {
        AdminContext::new(
            config,
            self.companies.clone(),
            self.areas.clone(),
            self.users.clone(),
            self.folders.clone(),
            self.directory.clone(),
            self.sites.clone(),
        )
    }
}
