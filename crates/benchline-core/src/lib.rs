//! Benchline Core - Common infrastructure for benchmark listing pipelines
//!
//! This crate provides the shared HTTP fetch path, error type, logging and
//! progress reporting used by the scraping and sync crates.

pub mod error;
pub mod http;
pub mod logging;
pub mod progress;

// Re-exports for convenience
pub use error::FetchError;
pub use http::{DEFAULT_USER_AGENT, fetch_html};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
