use std::path::PathBuf;

/// Connection parameters for the result store.
///
/// Passed to [`crate::DuckDbStore::new`]; lives for the duration of a run.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// DuckDB database file
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/benchline.duckdb"),
        }
    }
}
