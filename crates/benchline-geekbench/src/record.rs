//! Parsed listing entry

use chrono::NaiveDateTime;
use serde::Serialize;

/// One benchmark submission as shown in a search listing.
///
/// Every field is optional: the listing markup is not guaranteed and each
/// field degrades to `None` on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BenchmarkResult {
    /// Last path segment of the detail link
    pub cpu_id: Option<i64>,
    /// System/vendor label (detail link text)
    pub system: Option<String>,
    pub cpu_model: Option<String>,
    /// Clock frequency as displayed, e.g. "4300 MHz"
    pub frequency: Option<String>,
    pub cores: Option<i32>,
    pub uploaded: Option<NaiveDateTime>,
    pub platform: Option<String>,
    pub single_core_score: Option<i32>,
    pub multi_core_score: Option<i32>,
    /// Absolute detail page URL. Not persisted.
    pub url: Option<String>,
}

impl BenchmarkResult {
    /// Stale = uploaded strictly before the watermark.
    ///
    /// Undated results are never stale: re-scraping is cheaper than
    /// missing data.
    pub fn is_stale(&self, watermark: NaiveDateTime) -> bool {
        self.uploaded.is_some_and(|t| t < watermark)
    }
}
