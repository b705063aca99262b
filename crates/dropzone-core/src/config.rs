//! Application configuration management.
//!
//! This module handles loading and saving the dashboard configuration: the
//! API base URL, token refresh and session lifetime settings, and the last
//! used username.
//!
//! Configuration is stored at `~/.config/dropzone-admin/config.json`.
//! Values from a `.env` file or the environment override the file:
//! `DROPZONE_API_URL`, `DROPZONE_SESSION_SECRET`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::auth::session::DEFAULT_REFRESH_BUFFER_SECS;

/// Application name used for config/data directory paths
const APP_NAME: &str = "dropzone-admin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Subdirectory of the data directory holding session records
const SESSIONS_DIR: &str = "sessions";

const ENV_API_URL: &str = "DROPZONE_API_URL";
const ENV_SESSION_SECRET: &str = "DROPZONE_SESSION_SECRET";

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_SESSION_MAX_AGE_DAYS: i64 = 7;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Upper bounds for the duration settings
const MAX_REFRESH_BUFFER_SECS: i64 = 24 * 60 * 60;
const MAX_SESSION_MAX_AGE_DAYS: i64 = 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub refresh_buffer_secs: i64,
    pub session_max_age_days: i64,
    pub request_timeout_secs: u64,
    pub last_username: Option<String>,
    /// Directory for session records; defaults under the user data dir
    pub session_dir: Option<PathBuf>,
    /// Never written to disk; only read from the environment
    #[serde(skip)]
    pub session_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            refresh_buffer_secs: DEFAULT_REFRESH_BUFFER_SECS,
            session_max_age_days: DEFAULT_SESSION_MAX_AGE_DAYS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            last_username: None,
            session_dir: None,
            session_secret: None,
        }
    }
}

impl Config {
    /// Load the config file (if any), then apply `.env` and environment overrides
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Self =
                serde_json::from_str(&contents).context("Failed to parse config file")?;
            config
                .validate()
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            config
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(0..=MAX_REFRESH_BUFFER_SECS).contains(&self.refresh_buffer_secs) {
            anyhow::bail!(
                "refresh_buffer_secs must be between 0 and {}, got {}",
                MAX_REFRESH_BUFFER_SECS,
                self.refresh_buffer_secs
            );
        }
        if !(1..=MAX_SESSION_MAX_AGE_DAYS).contains(&self.session_max_age_days) {
            anyhow::bail!(
                "session_max_age_days must be between 1 and {}, got {}",
                MAX_SESSION_MAX_AGE_DAYS,
                self.session_max_age_days
            );
        }
        Ok(())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(secret) = var(ENV_SESSION_SECRET).filter(|v| !v.is_empty()) {
            self.session_secret = Some(secret);
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn session_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.session_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(SESSIONS_DIR))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("logs"))
    }

    pub fn refresh_buffer(&self) -> Duration {
        let secs = self.refresh_buffer_secs.clamp(0, MAX_REFRESH_BUFFER_SECS);
        Duration::try_seconds(secs).unwrap_or_else(|| Duration::seconds(DEFAULT_REFRESH_BUFFER_SECS))
    }

    pub fn session_max_age(&self) -> Duration {
        let days = self.session_max_age_days.clamp(1, MAX_SESSION_MAX_AGE_DAYS);
        Duration::try_days(days).unwrap_or_else(|| Duration::days(DEFAULT_SESSION_MAX_AGE_DAYS))
    }
}
