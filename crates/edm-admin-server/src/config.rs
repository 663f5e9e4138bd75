//! Configuration management for the admin server

use anyhow::{bail, Context, Result};
use edm_admin::AdminConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// JSON file with companies, areas, users, directory entries and
    /// documents loaded into the in-memory stores at startup
    #[serde(default)]
    pub seed_file: Option<PathBuf>,

    /// Emit logs as JSON lines instead of the human-readable format
    #[serde(default)]
    pub json_logs: bool,

    /// CORS allowed origins (comma-separated). If empty, any origin is allowed.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Settings of the administration core
    #[serde(default)]
    pub admin: AdminConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("EDM_SERVER_HOST").unwrap_or_else(|_| default_host());
        let port = match std::env::var("EDM_SERVER_PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid EDM_SERVER_PORT '{}'", raw))?,
            Err(_) => default_port(),
        };
        let seed_file = std::env::var("EDM_SEED_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        let json_logs = std::env::var("EDM_JSON_LOGS")
            .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
            .unwrap_or(false);
        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let config = Self {
            host,
            port,
            seed_file,
            json_logs,
            cors_allowed_origins,
            admin: AdminConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            bail!("Server host must not be empty");
        }
        if self.admin.library_name.trim().is_empty() {
            bail!("EDM_LIBRARY_NAME must not be empty");
        }
        Ok(())
    }

    /// Parsed CORS origins; empty means any origin
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            seed_file: None,
            json_logs: false,
            cors_allowed_origins: None,
            admin: AdminConfig::default(),
        }
    }
}
