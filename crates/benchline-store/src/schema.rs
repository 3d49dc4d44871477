//! SQL for the result store.
//!
//! Layout:
//! - `cpu_model_names(cpu_model_id, cpu_model)`: model dimension
//! - `system_names(system_id, system)`: system dimension
//! - `cpu_model_results(...)`: fact rows, no key of their own
//! - `cpu_model_benchmarks(...)`: processor chart snapshot, replaced per load
//! - `cpu_model_details(...)`: one detail page per model, JSON text columns
//!
//! Dimension keys come from sequences, so assignment is append-only and
//! monotonic. Tables are normally created out of band; [`create_schema`]
//! exists for fresh databases.

use crate::row::Dimension;

/// Benchmark chart columns in table order.
pub const BENCHMARK_COLUMNS: &str = "\
    cpu_model, frequency, cores, single_core_score, multi_core_score";

/// Detail columns in table order.
pub const DETAIL_COLUMNS: &str = "\
    cpu_result_id, title, upload_date, views, cpu_model_id, cpu_codename, \
    single_core_score, multi_core_score, system_info, cpu_info, memory_info, \
    single_core_benchmarks, multi_core_benchmarks";

/// Fact columns in table order. Dedup matches on all of them.
pub const RESULT_COLUMNS: &str = "\
    cpu_result_id, frequency, cores, uploaded, platform, \
    single_core_score, multi_core_score, cpu_model_id, system_id";

/// DDL for sequences and tables, idempotent.
pub fn create_schema() -> &'static str {
    "CREATE SEQUENCE IF NOT EXISTS cpu_model_id_seq START 1;
     CREATE SEQUENCE IF NOT EXISTS system_id_seq START 1;
     CREATE TABLE IF NOT EXISTS cpu_model_names (
         cpu_model_id INTEGER PRIMARY KEY DEFAULT nextval('cpu_model_id_seq'),
         cpu_model VARCHAR NOT NULL
     );
     CREATE TABLE IF NOT EXISTS system_names (
         system_id INTEGER PRIMARY KEY DEFAULT nextval('system_id_seq'),
         system VARCHAR NOT NULL
     );
     CREATE TABLE IF NOT EXISTS cpu_model_results (
         cpu_result_id BIGINT,
         frequency VARCHAR,
         cores INTEGER,
         uploaded TIMESTAMP,
         platform VARCHAR,
         single_core_score INTEGER,
         multi_core_score INTEGER,
         cpu_model_id INTEGER,
         system_id INTEGER
     );
     CREATE TABLE IF NOT EXISTS cpu_model_benchmarks (
         cpu_model VARCHAR,
         frequency VARCHAR,
         cores INTEGER,
         single_core_score INTEGER,
         multi_core_score INTEGER
     );
     CREATE TABLE IF NOT EXISTS cpu_model_details (
         cpu_result_id BIGINT,
         title VARCHAR,
         upload_date TIMESTAMP,
         views INTEGER,
         cpu_model_id INTEGER,
         cpu_codename VARCHAR,
         single_core_score INTEGER,
         multi_core_score INTEGER,
         system_info VARCHAR,
         cpu_info VARCHAR,
         memory_info VARCHAR,
         single_core_benchmarks VARCHAR,
         multi_core_benchmarks VARCHAR
     );"
}

/// Last upload time per tracked model; NULL for models without results.
pub fn last_uploaded_per_model() -> &'static str {
    "SELECT d.cpu_model, max(f.uploaded) AS last_uploaded
     FROM cpu_model_names d
     LEFT JOIN cpu_model_results f ON d.cpu_model_id = f.cpu_model_id
     GROUP BY d.cpu_model_id, d.cpu_model
     ORDER BY d.cpu_model_id"
}

/// `name -> key` listing of one dimension.
pub fn select_dimension(dim: Dimension) -> String {
    format!(
        "SELECT {name}, {key} FROM {table}",
        name = dim.name_column(),
        key = dim.key_column(),
        table = dim.table(),
    )
}

/// Insert one label; the key is taken from the dimension's sequence.
pub fn insert_dimension(dim: Dimension) -> String {
    format!(
        "INSERT INTO {table} ({name}) VALUES (?)",
        table = dim.table(),
        name = dim.name_column(),
    )
}

pub fn insert_result() -> String {
    format!("INSERT INTO cpu_model_results ({RESULT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)")
}

pub fn select_results() -> String {
    format!(
        "SELECT {RESULT_COLUMNS} FROM cpu_model_results \
         ORDER BY cpu_model_id, uploaded DESC NULLS LAST, cpu_result_id"
    )
}

/// Keep the first physical copy of every group of identical fact rows.
///
/// GROUP BY treats NULLs as equal, so rows differing only in which fields
/// are missing still collapse when they agree everywhere.
pub fn delete_duplicate_results() -> String {
    format!(
        "DELETE FROM cpu_model_results
         WHERE rowid NOT IN (
             SELECT min(rowid) FROM cpu_model_results GROUP BY {RESULT_COLUMNS}
         )"
    )
}

/// Rows of one model uploaded at or after a point in time.
pub fn delete_results_since() -> &'static str {
    "DELETE FROM cpu_model_results
     WHERE cpu_model_id IN (
         SELECT cpu_model_id FROM cpu_model_names WHERE cpu_model = ?
     )
     AND uploaded >= ?"
}

pub fn clear_benchmarks() -> &'static str {
    "DELETE FROM cpu_model_benchmarks"
}

pub fn insert_benchmark() -> String {
    format!("INSERT INTO cpu_model_benchmarks ({BENCHMARK_COLUMNS}) VALUES (?, ?, ?, ?, ?)")
}

pub fn select_benchmarks() -> String {
    format!("SELECT {BENCHMARK_COLUMNS} FROM cpu_model_benchmarks ORDER BY cpu_model")
}

pub fn insert_detail() -> String {
    let params = vec!["?"; DETAIL_COLUMNS.split(',').count()].join(", ");
    format!("INSERT INTO cpu_model_details ({DETAIL_COLUMNS}) VALUES ({params})")
}

/// Newest result id of every model that has results but no detail row yet.
///
/// Result ids grow with submission time, so the highest id is the newest.
pub fn pending_details() -> &'static str {
    "SELECT f.cpu_model_id, max(f.cpu_result_id) AS cpu_result_id
     FROM cpu_model_results f
     WHERE f.cpu_model_id IS NOT NULL
       AND f.cpu_result_id IS NOT NULL
       AND NOT EXISTS (
           SELECT 1 FROM cpu_model_details x WHERE x.cpu_model_id = f.cpu_model_id
       )
     GROUP BY f.cpu_model_id
     ORDER BY f.cpu_model_id"
}

/// Every tracked model with the codename recorded in its details, if any.
pub fn model_codenames() -> &'static str {
    "SELECT d.cpu_model, max(x.cpu_codename) AS cpu_codename
     FROM cpu_model_names d
     LEFT JOIN cpu_model_details x ON d.cpu_model_id = x.cpu_model_id
     GROUP BY d.cpu_model_id, d.cpu_model
     ORDER BY d.cpu_model_id"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_columns_count() {
        assert_eq!(RESULT_COLUMNS.split(',').count(), 9);
        assert_eq!(insert_result().matches('?').count(), 9);
    }

    #[test]
    fn reference_table_placeholders_match_columns() {
        assert_eq!(insert_benchmark().matches('?').count(), 5);
        assert_eq!(insert_detail().matches('?').count(), 13);
        assert!(create_schema().contains("cpu_model_details"));
    }

    #[test]
    fn dimension_sql_uses_dimension_names() {
        let sql = select_dimension(Dimension::System);
        assert_eq!(sql, "SELECT system, system_id FROM system_names");
        let sql = insert_dimension(Dimension::Model);
        assert_eq!(sql, "INSERT INTO cpu_model_names (cpu_model) VALUES (?)");
    }

    #[test]
    fn dedup_groups_on_every_column() {
        let sql = delete_duplicate_results();
        for col in RESULT_COLUMNS.split(',') {
            assert!(sql.contains(col.trim()), "missing {col}");
        }
    }
}
