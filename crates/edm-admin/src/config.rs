//! Administration core configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the company/area folders live and how collaborators are queried
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Tenant hostname of the document site
    #[serde(default = "default_site_hostname")]
    pub site_hostname: String,

    /// Server-relative path of the document site
    #[serde(default = "default_site_path")]
    pub site_path: String,

    /// Display name of the document library holding company folders
    #[serde(default = "default_library_name")]
    pub library_name: String,

    /// Autocomplete debounce in milliseconds
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Maximum number of directory matches requested per lookup
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,

    /// Lifetime of memoized site/library identifiers (0 = never expire)
    #[serde(default = "default_id_cache_ttl_secs")]
    pub id_cache_ttl_secs: u64,

    /// Ask for a second confirmation before deleting a company that still has users
    #[serde(default = "default_true")]
    pub confirm_company_deletion: bool,
}

fn default_site_hostname() -> String {
    "contoso.sharepoint.com".to_string()
}

fn default_site_path() -> String {
    "/sites/DocumentManagement".to_string()
}

fn default_library_name() -> String {
    "Gestión Documental".to_string()
}

fn default_search_debounce_ms() -> u64 {
    350
}

fn default_search_page_size() -> usize {
    25
}

fn default_id_cache_ttl_secs() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            site_hostname: default_site_hostname(),
            site_path: default_site_path(),
            library_name: default_library_name(),
            search_debounce_ms: default_search_debounce_ms(),
            search_page_size: default_search_page_size(),
            id_cache_ttl_secs: default_id_cache_ttl_secs(),
            confirm_company_deletion: default_true(),
        }
    }
}

impl AdminConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `EDM_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let site_hostname =
            std::env::var("EDM_SITE_HOSTNAME").unwrap_or_else(|_| default_site_hostname());
        let site_path = std::env::var("EDM_SITE_PATH").unwrap_or_else(|_| default_site_path());
        let library_name =
            std::env::var("EDM_LIBRARY_NAME").unwrap_or_else(|_| default_library_name());
        let search_debounce_ms = std::env::var("EDM_SEARCH_DEBOUNCE_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(default_search_debounce_ms);
        let search_page_size = std::env::var("EDM_SEARCH_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|size: &usize| *size > 0)
            .unwrap_or_else(default_search_page_size);
        let id_cache_ttl_secs = std::env::var("EDM_ID_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(default_id_cache_ttl_secs);
        let confirm_company_deletion = std::env::var("EDM_CONFIRM_COMPANY_DELETION")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or_else(|_| default_true());

        Self {
            site_hostname,
            site_path: normalize_site_path(&site_path),
            library_name,
            search_debounce_ms,
            search_page_size,
            id_cache_ttl_secs,
            confirm_company_deletion,
        }
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// `None` means identifiers never expire and are only dropped on invalidation
    pub fn id_cache_ttl(&self) -> Option<Duration> {
        (self.id_cache_ttl_secs > 0).then(|| Duration::from_secs(self.id_cache_ttl_secs))
    }
}

/// Site paths are always stored with a leading slash
pub fn normalize_site_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
