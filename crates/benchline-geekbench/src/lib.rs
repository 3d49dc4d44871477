//! Benchline Geekbench - incremental CPU benchmark result pipeline
//!
//! Pages through Geekbench browser search results for each tracked CPU
//! model, parses every listing entry into a [`BenchmarkResult`], stops at
//! the model's upload-time watermark and loads the new rows into a
//! [`benchline_store::ResultStore`].
//!
//! # Example
//!
//! ```no_run
//! use benchline_geekbench::{HttpSource, SourceConfig, SyncConfig, run};
//! use benchline_store::{DuckDbStore, StoreConfig};
//!
//! let source = HttpSource::new(SourceConfig::default());
//! let store = DuckDbStore::new(StoreConfig::default()).unwrap();
//! let now = chrono::Utc::now().naive_utc();
//!
//! let summary = run(&SyncConfig::default(), &source, &store, now, &indicatif::ProgressBar::hidden())
//!     .expect("sync failed");
//! println!("Appended {} rows", summary.rows_appended);
//! ```

pub mod aggregate;
pub mod benchmarks;
pub mod config;
pub mod detail;
pub mod names;
pub mod pagination;
pub mod parser;
pub mod record;
pub mod runner;
pub mod watermark;

// Re-exports
pub use aggregate::ScrapeMode;
pub use benchmarks::{ChartSummary, sync_benchmarks};
pub use config::{NamesConfig, SourceConfig, SyncConfig, SyncMode};
pub use detail::{DetailSource, DetailSummary, ResultDetail, sync_details};
pub use names::{DiscoverySummary, NameSource, run_discovery};
pub use pagination::{HttpSource, PageSource, Paginator};
pub use record::BenchmarkResult;
pub use runner::{Summary, run};
