//! Application state

use anyhow::Result;
use edm_admin::store::MemoryBackend;
use edm_admin::AdminState;

use crate::config::Config;
use crate::seed::{SeedData, SeedSummary};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// In-memory stores behind the administration services
    pub backend: MemoryBackend,

    /// Services and collaborators handed to the API router
    pub admin: AdminState,

    /// Server configuration
    pub config: Config,
}

impl AppState {
    /// Build the stores and, when a seed file is configured, load it
    pub async fn initialize(config: Config) -> Result<(Self, Option<SeedSummary>)> {
        let backend = MemoryBackend::new(&config.admin);
        let ctx = backend.context(config.admin.clone());

        let summary = match &config.seed_file {
            Some(path) => Some(SeedData::from_file(path)?.apply(&backend, &ctx).await?),
            None => None,
        };

        let state = Self {
            backend,
            admin: AdminState::new(ctx),
            config,
        };
        Ok((state, summary))
    }
}
