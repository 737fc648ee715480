//! Configuration loading for arxivdigest.
//! Reads a JSON file (default `arxiv_config.json`); a missing file is created
//! with defaults. Keys this version does not know about are kept and written
//! back unchanged.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use arxivdigest_ingestion::ListType;

pub const DEFAULT_CONFIG_FILE: &str = "arxiv_config.json";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_SCRAPE_SCHEDULE: &str = "09:00";
pub const DEFAULT_SUMMARY_SCHEDULE: &str = "10:00";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_scrape_schedule")]
    pub scrape_schedule: String,
    #[serde(default = "default_summary_schedule")]
    pub summary_schedule: String,
    #[serde(default)]
    pub use_ai_summaries: bool,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_max_papers_per_topic")]
    pub max_papers_per_topic: usize,
    #[serde(default = "default_arxiv_category")]
    pub arxiv_category: String,
    /// `new` (today's announcements) or `recent` (the last few days).
    #[serde(default = "default_list_type")]
    pub list_type: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Unrecognised keys, preserved across load/save.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_scrape_schedule()      -> String { DEFAULT_SCRAPE_SCHEDULE.to_string() }
fn default_summary_schedule()     -> String { DEFAULT_SUMMARY_SCHEDULE.to_string() }
fn default_max_papers_per_topic() -> usize  { 100 }
fn default_arxiv_category()       -> String { "cs".to_string() }
fn default_list_type()            -> String { ListType::default().to_string() }
fn default_log_level()            -> String { "INFO".to_string() }

impl Default for Config {
    fn default() -> Self {
        Self {
            scrape_schedule: default_scrape_schedule(),
            summary_schedule: default_summary_schedule(),
            use_ai_summaries: false,
            openai_api_key: None,
            max_papers_per_topic: default_max_papers_per_topic(),
            arxiv_category: default_arxiv_category(),
            list_type: default_list_type(),
            log_level: default_log_level(),
            extra: serde_json::Map::new(),
        }
    }
}

impl Config {
    /// Load `path`, creating it with defaults when it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        fs::write(path, json + "\n")
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })
    }

    /// The configured key, or `OPENAI_API_KEY` from the environment.
    pub fn api_key(&self) -> Option<String> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
    }

    /// Listing to fetch; an unknown value falls back to `new`.
    pub fn list_type(&self) -> ListType {
        self.list_type.parse().unwrap_or_else(|e| {
            warn!(value = %self.list_type, error = %e, "Invalid list_type; using default");
            ListType::default()
        })
    }

    /// `tracing` filter directive for `log_level`. Unknown levels map to `info`.
    pub fn log_directive(&self) -> &'static str {
        log_directive(&self.log_level)
    }
}

pub fn log_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}
