//! Configuration settings for Glimt.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub api: ApiSettings,
    pub jobs: JobSettings,
    pub paging: PagingSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the video API, including the version prefix.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// API key stored in the config file. The environment wins when both are set.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.cloudglue.dev/v1".to_string(),
            api_key_env: "CLOUDGLUE_API_KEY".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl ApiSettings {
    /// Resolve the API key from the environment, then the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.is_empty()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Asynchronous job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    /// Seconds between status polls.
    pub poll_interval_secs: u64,
    /// Upper bound on how long one invocation waits for a job.
    pub max_wait_secs: u64,
    /// Maximum concurrent per-item detail lookups.
    pub detail_concurrency: usize,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            max_wait_secs: 900, // 15 minutes
            detail_concurrency: 8,
        }
    }
}

impl JobSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

/// Pagination window sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingSettings {
    /// Seconds of video per description page.
    pub time_window_seconds: f64,
    /// Items per page for collection, video and summary listings.
    pub list_page_size: u32,
    /// Segment-level entities per page.
    pub segment_entities_page_size: u32,
    /// Default number of search results.
    pub search_limit: u32,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            time_window_seconds: 300.0,
            list_page_size: 25,
            segment_entities_page_size: 25,
            search_limit: 10,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => Self::expand_path(&p.to_string_lossy()),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::GlimtError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("glimt")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Reject values the paginator and job driver cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::GlimtError;

        if !(self.paging.time_window_seconds > 0.0) {
            return Err(GlimtError::Config(
                "paging.time_window_seconds must be positive".to_string(),
            ));
        }
        if self.paging.list_page_size == 0 || self.paging.segment_entities_page_size == 0 {
            return Err(GlimtError::Config("page sizes must be at least 1".to_string()));
        }
        if self.jobs.max_wait_secs == 0 {
            return Err(GlimtError::Config("jobs.max_wait_secs must be at least 1".to_string()));
        }
        if self.jobs.detail_concurrency == 0 {
            return Err(GlimtError::Config(
                "jobs.detail_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
