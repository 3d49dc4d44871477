//! Geekbench pipeline configuration

use benchline_core::DEFAULT_USER_AGENT;

use crate::watermark::DEFAULT_LOOKBACK_DAYS;

/// Where listings are fetched from.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Search endpoint, takes `q` and 1-based `page`
    pub search_url: String,
    /// Latest submitted CPU results, takes `page`
    pub latest_url: String,
    /// Processor benchmark chart (single page)
    pub benchmarks_url: String,
    /// Result detail pages live at `{detail_url}/{id}`
    pub detail_url: String,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            search_url: "https://browser.geekbench.com/search".to_string(),
            latest_url: "https://browser.geekbench.com/v6/cpu".to_string(),
            benchmarks_url: "https://browser.geekbench.com/processor-benchmarks".to_string(),
            detail_url: "https://browser.geekbench.com/v6/cpu".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// How far back each model is scraped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Stop at the model's upload-time watermark
    Incremental,
    /// Every page of every model
    Full,
    /// The first N pages of every model, ignoring the watermark
    Capped(u32),
}

/// Runtime configuration for the sync driver
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub mode: SyncMode,
    /// Watermark for models with no stored results: now minus this many days
    pub lookback_days: i64,
    /// Run the dedup pass after every N models (0 = only at the end)
    pub dedup_every: usize,
    /// Before appending, delete the model's stored rows at or after the
    /// watermark (incremental mode only)
    pub delete_before_insert: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::Incremental,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            dedup_every: 1,
            delete_before_insert: false,
        }
    }
}

/// Runtime configuration for model-name discovery
#[derive(Debug, Clone)]
pub struct NamesConfig {
    /// Pages of latest results to walk
    pub latest_pages: u32,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self { latest_pages: 100 }
    }
}
