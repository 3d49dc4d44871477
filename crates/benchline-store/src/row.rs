//! Row types shared between the store and the sync driver

use std::fmt;

use chrono::NaiveDateTime;

/// Lookup table mapping a label to a store-assigned surrogate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Hardware model names (`cpu_model_names`)
    Model,
    /// System/vendor labels (`system_names`)
    System,
}

impl Dimension {
    pub fn table(self) -> &'static str {
        match self {
            Self::Model => "cpu_model_names",
            Self::System => "system_names",
        }
    }

    pub fn key_column(self) -> &'static str {
        match self {
            Self::Model => "cpu_model_id",
            Self::System => "system_id",
        }
    }

    pub fn name_column(self) -> &'static str {
        match self {
            Self::Model => "cpu_model",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name_column())
    }
}

/// One fact row of `cpu_model_results`: a scraped result with its labels
/// replaced by dimension keys.
///
/// Column order here is the table's column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub cpu_result_id: Option<i64>,
    pub frequency: Option<String>,
    pub cores: Option<i32>,
    pub uploaded: Option<NaiveDateTime>,
    pub platform: Option<String>,
    pub single_core_score: Option<i32>,
    pub multi_core_score: Option<i32>,
    pub cpu_model_id: Option<i32>,
    pub system_id: Option<i32>,
}

/// One row of `cpu_model_benchmarks`: a model's entry on the processor
/// benchmark chart. The table is replaced wholesale on every load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkRow {
    pub cpu_model: String,
    pub frequency: Option<String>,
    pub cores: Option<i32>,
    pub single_core_score: Option<i32>,
    pub multi_core_score: Option<i32>,
}

/// One row of `cpu_model_details`: a single result's detail page.
///
/// The `*_info` and `*_benchmarks` columns hold JSON object text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub cpu_result_id: i64,
    pub title: Option<String>,
    pub upload_date: Option<NaiveDateTime>,
    pub views: Option<i32>,
    pub cpu_model_id: i32,
    pub cpu_codename: Option<String>,
    pub single_core_score: Option<i32>,
    pub multi_core_score: Option<i32>,
    pub system_info: String,
    pub cpu_info: String,
    pub memory_info: String,
    pub single_core_benchmarks: String,
    pub multi_core_benchmarks: String,
}

/// A model still lacking a detail row, and the result to read it from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTarget {
    pub cpu_model_id: i32,
    pub cpu_result_id: i64,
}
