//! Memoized site and library identifiers
//!
//! Resolving the document library costs two remote lookups. The ids are
//! stable, so they are cached with a TTL and can be invalidated when a call
//! reports that an id went stale.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::AdminConfig;
use crate::error::{AdminError, AdminResult};
use crate::store::SiteResolver;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentifierKey {
    Site { hostname: String, path: String },
    Drive { site_id: String, library: String },
}

/// Identifier cache with optional expiry
pub struct IdentifierCache {
    ttl: Option<Duration>,
    entries: RwLock<HashMap<IdentifierKey, (String, Instant)>>,
}

impl IdentifierCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &IdentifierKey) -> Option<String> {
        let entries = self.entries.read().await;
        let (value, stored_at) = entries.get(key)?;
        match self.ttl {
            Some(ttl) if stored_at.elapsed() >= ttl => None,
            _ => Some(value.clone()),
        }
    }

    pub async fn insert(&self, key: IdentifierKey, value: String) {
        self.entries
            .write()
            .await
            .insert(key, (value, Instant::now()));
    }

    pub async fn invalidate(&self, key: &IdentifierKey) {
        self.entries.write().await.remove(key);
    }

    pub async fn invalidate_all(&self) {
        self.entries.write().await.clear();
    }
}

/// Resolves the drive holding the company folders, through the cache
#[derive(Clone)]
pub struct LibraryLocator {
    resolver: Arc<dyn SiteResolver>,
    cache: Arc<IdentifierCache>,
    config: Arc<AdminConfig>,
}

impl LibraryLocator {
    pub fn new(resolver: Arc<dyn SiteResolver>, config: Arc<AdminConfig>) -> Self {
        let cache = Arc::new(IdentifierCache::new(config.id_cache_ttl()));
        Self {
            resolver,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &IdentifierCache {
        &self.cache
    }

    fn site_key(&self) -> IdentifierKey {
        IdentifierKey::Site {
            hostname: self.config.site_hostname.clone(),
            path: self.config.site_path.clone(),
        }
    }

    pub async fn site_id(&self) -> AdminResult<String> {
        let key = self.site_key();
        if let Some(id) = self.cache.get(&key).await {
            return Ok(id);
        }

        let id = self
            .resolver
            .resolve_site(&self.config.site_hostname, &self.config.site_path)
            .await?;
        if id.trim().is_empty() {
            return Err(AdminError::MalformedResponse("site id missing".to_string()));
        }
        tracing::debug!(site = %self.config.site_path, "Resolved site id");
        self.cache.insert(key, id.clone()).await;
        Ok(id)
    }

    /// Drive id of the configured document library
    pub async fn drive_id(&self) -> AdminResult<String> {
        let site_id = self.site_id().await?;
        let key = IdentifierKey::Drive {
            site_id: site_id.clone(),
            library: self.config.library_name.clone(),
        };
        if let Some(id) = self.cache.get(&key).await {
            return Ok(id);
        }

        let id = self
            .resolver
            .resolve_drive(&site_id, &self.config.library_name)
            .await?;
        tracing::debug!(library = %self.config.library_name, "Resolved drive id");
        self.cache.insert(key, id.clone()).await;
        Ok(id)
    }

    /// Drop every memoized id, forcing the next call to resolve again
    pub async fn invalidate(&self) {
        self.cache.invalidate_all().await;
    }
}
