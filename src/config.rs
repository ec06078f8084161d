//! Client Configuration
//!
//! Loaded from a JSON file next to the local database. A missing file means
//! defaults; `FOLIO_API_URL` overrides the backend address.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

pub const DEFAULT_API_URL: &str = "http://localhost:3001";
/// Sent as `X-User-Id` when no user id has been persisted
pub const FALLBACK_USER_ID: &str = "test-user-id";
pub const API_URL_ENV: &str = "FOLIO_API_URL";
pub const CONFIG_FILE_NAME: &str = "folio_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// AI generation is slow; it gets its own budget
    pub ai_timeout_secs: u64,
    /// Oldest pending operations are dropped past this
    pub queue_capacity: usize,
    pub save_debounce_ms: u64,
    pub data_dir: PathBuf,
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 30,
            ai_timeout_secs: 120,
            queue_capacity: 1000,
            save_debounce_ms: 800,
            data_dir: PathBuf::from(".folio"),
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("folio.db")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("logs"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            self.api_base_url = url;
        }
        self
    }
}

/// Get config file path inside a data directory
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

/// Load configuration, falling back to defaults when the file does not exist
pub fn load_config(path: &Path) -> DomainResult<AppConfig> {
    let config = match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
            DomainError::InvalidInput(format!("invalid config {}: {}", path.display(), e))
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => return Err(DomainError::Storage(e.to_string())),
    };
    Ok(config.with_api_url_override(std::env::var(API_URL_ENV).ok()))
}

pub fn save_config(path: &Path, config: &AppConfig) -> DomainResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DomainError::Storage(e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).map_err(|e| DomainError::Storage(e.to_string()))
}
