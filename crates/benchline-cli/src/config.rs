//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use benchline_geekbench::{NamesConfig, SourceConfig};
use benchline_store::StoreConfig;
use serde::Deserialize;

/// Global configuration for benchline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub store: StoreSection,
    pub source: SourceSection,
    pub sync: SyncSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// DuckDB file; may be a `${VAR}` reference
    #[serde(deserialize_with = "deserialize_env_path")]
    pub path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: StoreConfig::default().path,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub search_url: String,
    pub latest_url: String,
    pub benchmarks_url: String,
    pub detail_url: String,
    pub user_agent: String,
}

impl Default for SourceSection {
    fn default() -> Self {
        let source = SourceConfig::default();
        Self {
            search_url: source.search_url,
            latest_url: source.latest_url,
            benchmarks_url: source.benchmarks_url,
            detail_url: source.detail_url,
            user_agent: source.user_agent,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub lookback_days: i64,
    /// Default page cap for `sync`; unset or 0 means incremental
    pub max_pages: Option<u32>,
    pub dedup_every: usize,
    pub latest_pages: u32,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            lookback_days: benchline_geekbench::watermark::DEFAULT_LOOKBACK_DAYS,
            max_pages: None,
            dedup_every: 1,
            latest_pages: NamesConfig::default().latest_pages,
        }
    }
}

/// Deserialize a path that may be an environment variable reference like ${VAR}
fn deserialize_env_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    expand_env_var(&raw)
        .map(PathBuf::from)
        .ok_or_else(|| serde::de::Error::custom(format!("environment variable not set: {raw}")))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./benchline.toml (current directory)
    /// 2. ~/.config/benchline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("benchline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "benchline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject settings that would only fail once a sync is underway
    pub fn validate(&self) -> Result<()> {
        benchline_geekbench::watermark::validate_lookback(self.sync.lookback_days)
            .context("sync.lookback_days")?;
        Ok(())
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            path: self.store.path.clone(),
        }
    }

    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            search_url: self.source.search_url.clone(),
            latest_url: self.source.latest_url.clone(),
            benchmarks_url: self.source.benchmarks_url.clone(),
            detail_url: self.source.detail_url.clone(),
            user_agent: self.source.user_agent.clone(),
        }
    }
}
