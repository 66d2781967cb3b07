use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
pub const ENV_API_BASE_URL: &str = "BULKDM_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("base url must not be empty")]
    Empty,
    #[error("base url must use http:// or https:// and include a host")]
    Invalid,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fall back to defaults when the file cannot be read or parsed, handing
    /// the error back so the caller can report it and avoid overwriting the
    /// file.
    pub fn load_or_default() -> (Self, Option<anyhow::Error>) {
        match Self::get_config_path() {
            Ok(path) => Self::load_or_default_from(&path),
            Err(err) => (Self::new(), Some(err)),
        }
    }

    pub fn load_or_default_from(config_path: &Path) -> (Self, Option<anyhow::Error>) {
        match Self::load_from(config_path) {
            Ok(config) => (config, None),
            Err(err) => (Self::new(), Some(err)),
        }
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Pick the backend URL: explicit flag, then env var, then config file,
    /// then the local default. Returns the URL and where it came from.
    pub fn resolve_base_url(&self, flag: Option<&str>) -> Result<(String, &'static str), UrlError> {
        if let Some(url) = flag.filter(|u| !u.trim().is_empty()) {
            return normalize_base_url(url).map(|u| (u, "flag"));
        }
        if let Some(url) = env_non_empty(ENV_API_BASE_URL) {
            return normalize_base_url(&url).map(|u| (u, ENV_API_BASE_URL));
        }
        if let Some(url) = self.api_base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return normalize_base_url(url).map(|u| (u, "config"));
        }
        normalize_base_url(DEFAULT_API_BASE_URL).map(|u| (u, "default"))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("bulkdm"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String, UrlError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }
    let Some((scheme, remainder)) = trimmed.split_once("://") else {
        return Err(UrlError::Invalid);
    };
    if !(scheme == "http" || scheme == "https") {
        return Err(UrlError::Invalid);
    }
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(UrlError::Invalid);
    }
    Ok(trimmed.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
