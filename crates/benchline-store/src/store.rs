//! Result store: the narrow interface the sync driver loads through, and
//! its DuckDB implementation.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use duckdb::{Connection, params};

use crate::config::StoreConfig;
use crate::row::{BenchmarkRow, DetailRow, DetailTarget, Dimension, ResultRow};
use crate::schema;

/// Store collaborator used by the sync driver.
///
/// Every call is one logical unit of work; no state is held between calls.
pub trait ResultStore {
    /// Latest upload time per tracked model, in model-key order.
    /// `None` for models with no stored results.
    fn read_watermarks(&self) -> Result<Vec<(String, Option<NaiveDateTime>)>>;

    /// Full `name -> key` map of a dimension.
    fn read_dimension(&self, dim: Dimension) -> Result<HashMap<String, i32>>;

    /// Insert the names not yet present in the dimension.
    /// Returns how many were inserted.
    fn insert_dimension_entries(&self, dim: Dimension, names: &[String]) -> Result<usize>;

    /// Append fact rows. Returns how many were written.
    fn append_rows(&self, rows: &[ResultRow]) -> Result<usize>;

    /// Remove exact duplicate fact rows table-wide, keeping one of each.
    /// Returns how many were removed.
    fn delete_duplicate_rows(&self) -> Result<usize>;

    /// Remove one model's rows uploaded at or after `from`.
    fn delete_since(&self, model: &str, from: NaiveDateTime) -> Result<usize>;

    /// Every stored fact row.
    fn read_rows(&self) -> Result<Vec<ResultRow>>;

    /// Swap the stored benchmark chart for `rows`. Returns how many were written.
    fn replace_benchmarks(&self, rows: &[BenchmarkRow]) -> Result<usize>;

    /// The stored benchmark chart, by model name.
    fn read_benchmarks(&self) -> Result<Vec<BenchmarkRow>>;

    /// Models with results but no detail row, each with its newest result id.
    fn pending_details(&self) -> Result<Vec<DetailTarget>>;

    /// Append detail rows. Returns how many were written.
    fn append_details(&self, rows: &[DetailRow]) -> Result<usize>;

    /// Every tracked model and its codename, in model-key order.
    /// `None` where no detail row names one.
    fn read_codenames(&self) -> Result<Vec<(String, Option<String>)>>;
}

/// DuckDB-backed store. Opens a connection per operation.
pub struct DuckDbStore {
    config: StoreConfig,
}

impl DuckDbStore {
    /// Create a store over the database file named in `config`.
    ///
    /// Creates the parent directory; does not touch the schema.
    pub fn new(config: StoreConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create store dir: {}", parent.display())
                })?;
            }
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.config.path)
            .with_context(|| format!("failed to open {}", self.config.path.display()))
    }

    /// Create sequences and tables if they do not exist yet.
    pub fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(schema::create_schema())
            .context("failed to create schema")?;
        log::info!("schema ready in {}", self.config.path.display());
        Ok(())
    }
}

fn read_dimension_with(conn: &Connection, dim: Dimension) -> Result<HashMap<String, i32>> {
    let mut stmt = conn
        .prepare(&schema::select_dimension(dim))
        .with_context(|| format!("failed to prepare {} lookup", dim.table()))?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?)))?;

    let mut map = HashMap::new();
    for row in rows {
        let (name, key) = row?;
        map.insert(name, key);
    }
    Ok(map)
}

impl ResultStore for DuckDbStore {
    fn read_watermarks(&self) -> Result<Vec<(String, Option<NaiveDateTime>)>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(schema::last_uploaded_per_model())
            .context("failed to prepare watermark query")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<NaiveDateTime>>(1)?,
            ))
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("failed to read watermarks")
    }

    fn read_dimension(&self, dim: Dimension) -> Result<HashMap<String, i32>> {
        let conn = self.open()?;
        read_dimension_with(&conn, dim)
    }

    fn insert_dimension_entries(&self, dim: Dimension, names: &[String]) -> Result<usize> {
        let mut conn = self.open()?;
        let existing = read_dimension_with(&conn, dim)?;

        // Distinct, stable order so keys follow first appearance
        let mut seen = HashSet::new();
        let new_names: Vec<&String> = names
            .iter()
            .filter(|n| !existing.contains_key(n.as_str()) && seen.insert(n.as_str()))
            .collect();

        if new_names.is_empty() {
            log::debug!("no new {dim} entries");
            return Ok(0);
        }

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&schema::insert_dimension(dim))?;
            for name in &new_names {
                stmt.execute(params![name.as_str()])
                    .with_context(|| format!("failed to insert {dim} {name:?}"))?;
            }
        }
        tx.commit()
            .with_context(|| format!("failed to commit {} inserts", dim.table()))?;

        log::info!("added {} new {dim} entries: {new_names:?}", new_names.len());
        Ok(new_names.len())
    }

    fn append_rows(&self, rows: &[ResultRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&schema::insert_result())?;
            for r in rows {
                stmt.execute(params![
                    r.cpu_result_id,
                    r.frequency,
                    r.cores,
                    r.uploaded,
                    r.platform,
                    r.single_core_score,
                    r.multi_core_score,
                    r.cpu_model_id,
                    r.system_id,
                ])
                .context("failed to insert result row")?;
            }
        }
        tx.commit().context("failed to commit result rows")?;
        Ok(rows.len())
    }

    fn delete_duplicate_rows(&self) -> Result<usize> {
        let conn = self.open()?;
        let removed = conn
            .execute(&schema::delete_duplicate_results(), [])
            .context("failed to delete duplicate results")?;
        if removed > 0 {
            log::info!("removed {removed} duplicate result rows");
        }
        Ok(removed)
    }

    fn delete_since(&self, model: &str, from: NaiveDateTime) -> Result<usize> {
        let conn = self.open()?;
        let removed = conn
            .execute(schema::delete_results_since(), params![model, from])
            .with_context(|| format!("failed to delete {model} results since {from}"))?;
        log::debug!("{model}: deleted {removed} rows uploaded since {from}");
        Ok(removed)
    }

    fn read_rows(&self) -> Result<Vec<ResultRow>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&schema::select_results())?;
        let rows = stmt.query_map([], |row| {
            Ok(ResultRow {
                cpu_result_id: row.get(0)?,
                frequency: row.get(1)?,
                cores: row.get(2)?,
                uploaded: row.get(3)?,
                platform: row.get(4)?,
                single_core_score: row.get(5)?,
                multi_core_score: row.get(6)?,
                cpu_model_id: row.get(7)?,
                system_id: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("failed to read result rows")
    }

    fn replace_benchmarks(&self, rows: &[BenchmarkRow]) -> Result<usize> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let cleared = tx
            .execute(schema::clear_benchmarks(), [])
            .context("failed to clear benchmark chart")?;
        {
            let mut stmt = tx.prepare(&schema::insert_benchmark())?;
            for r in rows {
                stmt.execute(params![
                    r.cpu_model,
                    r.frequency,
                    r.cores,
                    r.single_core_score,
                    r.multi_core_score,
                ])
                .with_context(|| format!("failed to insert benchmark {:?}", r.cpu_model))?;
            }
        }
        tx.commit().context("failed to commit benchmark chart")?;
        log::debug!("benchmark chart: {cleared} rows replaced by {}", rows.len());
        Ok(rows.len())
    }

    fn read_benchmarks(&self) -> Result<Vec<BenchmarkRow>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&schema::select_benchmarks())?;
        let rows = stmt.query_map([], |row| {
            Ok(BenchmarkRow {
                cpu_model: row.get(0)?,
                frequency: row.get(1)?,
                cores: row.get(2)?,
                single_core_score: row.get(3)?,
                multi_core_score: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("failed to read benchmark chart")
    }

    fn pending_details(&self) -> Result<Vec<DetailTarget>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(schema::pending_details())
            .context("failed to prepare pending detail query")?;
        let rows = stmt.query_map([], |row| {
            Ok(DetailTarget {
                cpu_model_id: row.get(0)?,
                cpu_result_id: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("failed to read pending details")
    }

    fn append_details(&self, rows: &[DetailRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&schema::insert_detail())?;
            for r in rows {
                stmt.execute(params![
                    r.cpu_result_id,
                    r.title,
                    r.upload_date,
                    r.views,
                    r.cpu_model_id,
                    r.cpu_codename,
                    r.single_core_score,
                    r.multi_core_score,
                    r.system_info,
                    r.cpu_info,
                    r.memory_info,
                    r.single_core_benchmarks,
                    r.multi_core_benchmarks,
                ])
                .with_context(|| format!("failed to insert detail {}", r.cpu_result_id))?;
            }
        }
        tx.commit().context("failed to commit detail rows")?;
        Ok(rows.len())
    }

    fn read_codenames(&self) -> Result<Vec<(String, Option<String>)>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(schema::model_codenames())
            .context("failed to prepare codename query")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("failed to read codenames")
    }
}
