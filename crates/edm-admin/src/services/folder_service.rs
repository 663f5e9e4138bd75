//! Folder path resolution on top of the drive primitives
//!
//! Company folders sit at the library root and area folders one level below
//! them. Names are matched with [`normalize_name`], so "Gestión Documental"
//! and "gestion documental" refer to the same folder.

use std::sync::Arc;

use crate::error::{AdminError, AdminResult};
use crate::security::normalize_name;
use crate::store::{FolderItem, FolderParent, FolderStore};

/// Result of an idempotent folder operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderOutcome {
    Created,
    AlreadyExisted,
    Renamed,
    Deleted,
    Missing,
}

#[derive(Clone)]
pub struct FolderResolver {
    store: Arc<dyn FolderStore>,
}

impl FolderResolver {
    pub fn new(store: Arc<dyn FolderStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn FolderStore> {
        &self.store
    }

    /// Child folder of `parent` whose normalized name equals `name`'s
    pub async fn find(&self, drive_id: &str, parent: &FolderParent, name: &str) -> AdminResult<Option<FolderItem>> {
        let wanted = normalize_name(name);
        let children = self.store.child_folders(drive_id, parent).await?;
        Ok(children.into_iter().find(|f| normalize_name(&f.name) == wanted))
    }

    /// Existing folder or a new one. A create conflict means someone else
    /// created it first; the folder is looked up again.
    pub async fn ensure(&self, drive_id: &str, parent: &FolderParent, name: &str) -> AdminResult<(FolderItem, FolderOutcome)> {
        if let Some(existing) = self.find(drive_id, parent, name).await? {
            return Ok((existing, FolderOutcome::AlreadyExisted));
        }

        match self.store.create_folder(drive_id, parent, name).await {
            Ok(created) => {
                tracing::info!(folder = %name, "Folder created");
                Ok((created, FolderOutcome::Created))
            }
            Err(AdminError::Conflict(detail)) => {
                tracing::info!(folder = %name, detail = %detail, "Folder created concurrently, reusing it");
                let existing = self
                    .find(drive_id, parent, name)
                    .await?
                    .ok_or_else(|| AdminError::FolderNotFound(name.to_string()))?;
                Ok((existing, FolderOutcome::AlreadyExisted))
            }
            Err(err) => Err(err),
        }
    }

    pub async fn find_company(&self, drive_id: &str, company: &str) -> AdminResult<Option<FolderItem>> {
        self.find(drive_id, &FolderParent::Root, company).await
    }

    pub async fn ensure_company(&self, drive_id: &str, company: &str) -> AdminResult<(FolderItem, FolderOutcome)> {
        self.ensure(drive_id, &FolderParent::Root, company).await
    }

    pub async fn find_area(&self, drive_id: &str, company: &str, area: &str) -> AdminResult<Option<FolderItem>> {
        match self.find_company(drive_id, company).await? {
            Some(parent) => self.find(drive_id, &FolderParent::Item(parent.id), area).await,
            None => Ok(None),
        }
    }

    /// Company folder first, then the area folder inside it
    pub async fn ensure_area(&self, drive_id: &str, company: &str, area: &str) -> AdminResult<(FolderItem, FolderOutcome)> {
        let (parent, _) = self.ensure_company(drive_id, company).await?;
        self.ensure(drive_id, &FolderParent::Item(parent.id), area).await
    }

    /// Rename a folder, reporting `Missing` if it cannot be found
    pub async fn rename(&self, drive_id: &str, folder: Option<FolderItem>, new_name: &str) -> AdminResult<FolderOutcome> {
        let Some(folder) = folder else {
            return Ok(FolderOutcome::Missing);
        };
        if folder.name == new_name {
            return Ok(FolderOutcome::AlreadyExisted);
        }
        match self.store.rename_item(drive_id, &folder.id, new_name).await {
            Ok(()) => Ok(FolderOutcome::Renamed),
            Err(AdminError::FolderNotFound(_)) => Ok(FolderOutcome::Missing),
            Err(err) => Err(err),
        }
    }

    /// Delete a folder, reporting `Missing` if it cannot be found
    pub async fn delete(&self, drive_id: &str, folder: Option<FolderItem>) -> AdminResult<FolderOutcome> {
        let Some(folder) = folder else {
            return Ok(FolderOutcome::Missing);
        };
        match self.store.delete_item(drive_id, &folder.id).await {
            Ok(()) => Ok(FolderOutcome::Deleted),
            Err(AdminError::FolderNotFound(_)) => Ok(FolderOutcome::Missing),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryFolderStore;
    use async_trait::async_trait;
    use crate::models::Document;

    #[tokio::test]
    async fn test_find_ignores_accents_and_case() {
        let store = Arc::new(MemoryFolderStore::new());
        store
            .create_folder("d", &FolderParent::Root, "Gestión Documental")
            .await
            .unwrap();
        let resolver = FolderResolver::new(store);

        let found = resolver
            .find("d", &FolderParent::Root, "gestion documental")
            .await
            .unwrap();
        assert_eq!(found.unwrap().name, "Gestión Documental");
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let resolver = FolderResolver::new(Arc::new(MemoryFolderStore::new()));
        let (first, outcome) = resolver.ensure_area("d", "Acme", "Ventas").await.unwrap();
        assert_eq!(outcome, FolderOutcome::Created);

        let (second, outcome) = resolver.ensure_area("d", "ACME", "ventas").await.unwrap();
        assert_eq!(outcome, FolderOutcome::AlreadyExisted);
        assert_eq!(first.id, second.id);
    }

    /// Drive whose listing lags behind: the first listing misses the folder a
    /// concurrent writer just created
    struct RacingStore {
        inner: MemoryFolderStore,
        listed: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl FolderStore for RacingStore {
        async fn child_folders(&self, drive_id: &str, parent: &FolderParent) -> AdminResult<Vec<FolderItem>> {
            if !self.listed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Ok(Vec::new());
            }
            self.inner.child_folders(drive_id, parent).await
        }
        async fn create_folder(&self, drive_id: &str, parent: &FolderParent, name: &str) -> AdminResult<FolderItem> {
            self.inner.create_folder(drive_id, parent, name).await
        }
        async fn rename_item(&self, drive_id: &str, item_id: &str, new_name: &str) -> AdminResult<()> {
            self.inner.rename_item(drive_id, item_id, new_name).await
        }
        async fn delete_item(&self, drive_id: &str, item_id: &str) -> AdminResult<()> {
            self.inner.delete_item(drive_id, item_id).await
        }
        async fn list_children(&self, drive_id: &str, folder_id: &str) -> AdminResult<Vec<Document>> {
            self.inner.list_children(drive_id, folder_id).await
        }
    }

    #[tokio::test]
    async fn test_conflict_on_create_is_benign() {
        let inner = MemoryFolderStore::new();
        let existing = inner.create_folder("d", &FolderParent::Root, "Acme").await.unwrap();
        let store = RacingStore {
            inner,
            listed: std::sync::atomic::AtomicBool::new(false),
        };
        let resolver = FolderResolver::new(Arc::new(store));

        let (folder, outcome) = resolver.ensure_company("d", "Acme").await.unwrap();
        assert_eq!(outcome, FolderOutcome::AlreadyExisted);
        assert_eq!(folder.id, existing.id);
    }

    #[tokio::test]
    async fn test_missing_folders_are_reported_not_raised() {
        let resolver = FolderResolver::new(Arc::new(MemoryFolderStore::new()));
        let folder = resolver.find_company("d", "Ghost").await.unwrap();
        assert_eq!(resolver.rename("d", folder.clone(), "Other").await.unwrap(), FolderOutcome::Missing);
        assert_eq!(resolver.delete("d", folder).await.unwrap(), FolderOutcome::Missing);
    }
}
