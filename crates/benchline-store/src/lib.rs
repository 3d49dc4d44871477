//! benchline-store: relational store for benchmark results
//!
//! One fact table (`cpu_model_results`) referencing two append-only
//! dimension tables (`cpu_model_names`, `system_names`), plus the
//! benchmark chart (`cpu_model_benchmarks`) and per-model result details
//! (`cpu_model_details`). The pipeline talks to the store only through the
//! narrow [`ResultStore`] trait; the DuckDB implementation opens a fresh
//! connection for every unit of work.

pub mod config;
pub mod row;
pub mod schema;
pub mod store;

pub use config::StoreConfig;
pub use row::{BenchmarkRow, DetailRow, DetailTarget, Dimension, ResultRow};
pub use store::{DuckDbStore, ResultStore};
