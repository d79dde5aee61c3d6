//! TOML configuration for the directory search client.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "directory-search.toml";
pub const CONFIG_PATH_ENV: &str = "DIRECTORY_SEARCH_CONFIG";
pub const API_URL_ENV: &str = "DIRECTORY_API_URL";
pub const API_TOKEN_ENV: &str = "DIRECTORY_API_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render default config: {0}")]
    Render(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token; empty means anonymous.
    pub token: String,
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            token: String::new(),
            timeout_ms: 750,
            retries: 2,
            backoff_ms: 50,
        }
    }
}

/// When the debouncer fires an immediate search in addition to the
/// trailing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadingEdge {
    /// Only the first change after the window has gone quiet.
    #[default]
    FirstOfBurst,
    /// Every change.
    EveryChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub page_size: u32,
    pub leading_edge: LeadingEdge,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            page_size: 3,
            leading_edge: LeadingEdge::FirstOfBurst,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Optional log file; empty logs to stderr only.
    pub file: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: String::new(),
            json: false,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(API_TOKEN_ENV) {
            self.api.token = token;
        }
    }
}

/// Resolve the config path: explicit argument, then `DIRECTORY_SEARCH_CONFIG`,
/// then `directory-search.toml` in the working directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load the config file, writing the defaults first when it does not exist.
/// Environment overrides are applied on top.
pub fn load_or_create_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = config_path(explicit);
    let mut cfg = if path.exists() {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        AppConfig::from_toml_str(&raw)?
    } else {
        let cfg = AppConfig::default();
        write_config(&path, &cfg)?;
        cfg
    };
    cfg.apply_overrides(|key| std::env::var(key).ok());
    Ok(cfg)
}

fn write_config(path: &Path, cfg: &AppConfig) -> Result<(), ConfigError> {
    let rendered = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, rendered).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
