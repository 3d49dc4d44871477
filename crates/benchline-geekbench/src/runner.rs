//! Incremental sync driver

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use benchline_core::fmt_num;
use benchline_store::{Dimension, ResultRow, ResultStore};
use chrono::NaiveDateTime;
use indicatif::ProgressBar;

use crate::aggregate::{ScrapeMode, scrape};
use crate::config::{SyncConfig, SyncMode};
use crate::pagination::{PageSource, Paginator};
use crate::record::BenchmarkResult;
use crate::watermark;

/// Sync execution summary
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub models: usize,
    pub rows_scraped: usize,
    pub rows_appended: usize,
    pub duplicates_removed: usize,
    pub new_models: usize,
    pub new_systems: usize,
    pub elapsed: Duration,
}

/// In-memory copies of both dimension maps, refreshed after inserts
struct DimensionCache {
    models: HashMap<String, i32>,
    systems: HashMap<String, i32>,
}

impl DimensionCache {
    fn load<T: ResultStore + ?Sized>(store: &T) -> Result<Self> {
        Ok(Self {
            models: store.read_dimension(Dimension::Model)?,
            systems: store.read_dimension(Dimension::System)?,
        })
    }

    fn to_row(&self, r: &BenchmarkResult) -> ResultRow {
        ResultRow {
            cpu_result_id: r.cpu_id,
            frequency: r.frequency.clone(),
            cores: r.cores,
            uploaded: r.uploaded,
            platform: r.platform.clone(),
            single_core_score: r.single_core_score,
            multi_core_score: r.multi_core_score,
            cpu_model_id: r.cpu_model.as_ref().and_then(|m| self.models.get(m).copied()),
            system_id: r.system.as_ref().and_then(|s| self.systems.get(s).copied()),
        }
    }
}

/// Insert the labels missing from `map` into the dimension, then reload
/// `map` from the store. Returns how many entries were inserted.
pub fn reconcile_dimension<'a, T: ResultStore + ?Sized>(
    store: &T,
    dim: Dimension,
    map: &mut HashMap<String, i32>,
    labels: impl IntoIterator<Item = &'a str>,
) -> Result<usize> {
    let mut seen = HashSet::new();
    let missing: Vec<String> = labels
        .into_iter()
        .filter(|l| !map.contains_key(*l) && seen.insert(*l))
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        return Ok(0);
    }

    let inserted = store
        .insert_dimension_entries(dim, &missing)
        .with_context(|| format!("failed to add {dim} entries"))?;
    *map = store.read_dimension(dim)?;
    Ok(inserted)
}

fn scrape_mode(mode: SyncMode, watermark: NaiveDateTime) -> ScrapeMode {
    match mode {
        SyncMode::Incremental => ScrapeMode::Incremental(watermark),
        SyncMode::Full => ScrapeMode::Full,
        SyncMode::Capped(cap) => ScrapeMode::Capped(cap),
    }
}

/// Sync every tracked model, in model-key order.
///
/// `now` anchors the default watermark of models without stored results.
/// A fetch error aborts the remaining models; rows already appended stay,
/// and the next run resumes from the re-derived watermarks.
pub fn run<S, T>(
    config: &SyncConfig,
    source: &S,
    store: &T,
    now: NaiveDateTime,
    pb: &ProgressBar,
) -> Result<Summary>
where
    S: PageSource + ?Sized,
    T: ResultStore + ?Sized,
{
    let start = Instant::now();
    watermark::validate_lookback(config.lookback_days)?;

    let models = store.read_watermarks().context("failed to read watermarks")?;
    log::info!("Syncing {} models ({:?})", models.len(), config.mode);
    pb.set_length(models.len() as u64);

    let mut cache = DimensionCache::load(store)?;
    let mut summary = Summary::default();

    for (model, last) in &models {
        let wm = watermark::resolve(*last, now, config.lookback_days)
            .with_context(|| format!("failed to resolve watermark for {model}"))?;
        pb.set_message(model.clone());

        let paginator = Paginator::new(source, model.as_str());
        let results = scrape(&paginator, scrape_mode(config.mode, wm))
            .with_context(|| format!("failed to scrape {model}"))?;
        log::debug!(
            "{model}: {} rows from {} fetches (watermark {wm})",
            results.len(),
            paginator.fetches()
        );

        summary.new_systems += reconcile_dimension(
            store,
            Dimension::System,
            &mut cache.systems,
            results.iter().filter_map(|r| r.system.as_deref()),
        )?;
        summary.new_models += reconcile_dimension(
            store,
            Dimension::Model,
            &mut cache.models,
            results.iter().filter_map(|r| r.cpu_model.as_deref()),
        )?;

        let rows: Vec<ResultRow> = results.iter().map(|r| cache.to_row(r)).collect();

        if config.delete_before_insert && config.mode == SyncMode::Incremental {
            store
                .delete_since(model, wm)
                .with_context(|| format!("failed to clear {model} since {wm}"))?;
        }

        summary.rows_scraped += results.len();
        summary.rows_appended += store
            .append_rows(&rows)
            .with_context(|| format!("failed to append {model} rows"))?;
        summary.models += 1;

        if config.dedup_every > 0 && summary.models % config.dedup_every == 0 {
            summary.duplicates_removed += store
                .delete_duplicate_rows()
                .context("failed to deduplicate results")?;
        }
        pb.inc(1);
    }

    summary.duplicates_removed += store
        .delete_duplicate_rows()
        .context("failed to deduplicate results")?;
    pb.finish_and_clear();
    summary.elapsed = start.elapsed();

    log::info!("=== Sync Summary ===");
    log::info!("Models: {}", fmt_num(summary.models));
    log::info!(
        "Rows: {} scraped, {} appended, {} duplicates removed",
        fmt_num(summary.rows_scraped),
        fmt_num(summary.rows_appended),
        fmt_num(summary.duplicates_removed)
    );
    log::info!(
        "New dimension entries: {} models, {} systems",
        summary.new_models,
        summary.new_systems
    );
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::tests::CannedSource;
    use benchline_store::{BenchmarkRow, DetailRow, DetailTarget};
    use std::cell::RefCell;

    /// Dimension-only store double
    #[derive(Default)]
    struct DimStore {
        systems: RefCell<HashMap<String, i32>>,
        inserted: RefCell<Vec<String>>,
        fail_dedup: bool,
    }

    impl ResultStore for DimStore {
        fn read_watermarks(&self) -> Result<Vec<(String, Option<NaiveDateTime>)>> {
            Ok(Vec::new())
        }
        fn read_dimension(&self, _dim: Dimension) -> Result<HashMap<String, i32>> {
            Ok(self.systems.borrow().clone())
        }
        fn insert_dimension_entries(&self, _dim: Dimension, names: &[String]) -> Result<usize> {
            let mut map = self.systems.borrow_mut();
            let mut n = 0;
            for name in names {
                if !map.contains_key(name) {
                    let key = map.len() as i32 + 1;
                    map.insert(name.clone(), key);
                    self.inserted.borrow_mut().push(name.clone());
                    n += 1;
                }
            }
            Ok(n)
        }
        fn append_rows(&self, rows: &[ResultRow]) -> Result<usize> {
            Ok(rows.len())
        }
        fn delete_duplicate_rows(&self) -> Result<usize> {
            if self.fail_dedup {
                anyhow::bail!("database is locked");
            }
            Ok(0)
        }
        fn delete_since(&self, _model: &str, _from: NaiveDateTime) -> Result<usize> {
            Ok(0)
        }
        fn read_rows(&self) -> Result<Vec<ResultRow>> {
            Ok(Vec::new())
        }
        fn replace_benchmarks(&self, rows: &[BenchmarkRow]) -> Result<usize> {
            Ok(rows.len())
        }
        fn read_benchmarks(&self) -> Result<Vec<BenchmarkRow>> {
            Ok(Vec::new())
        }
        fn pending_details(&self) -> Result<Vec<DetailTarget>> {
            Ok(Vec::new())
        }
        fn append_details(&self, rows: &[DetailRow]) -> Result<usize> {
            Ok(rows.len())
        }
        fn read_codenames(&self) -> Result<Vec<(String, Option<String>)>> {
            Ok(Vec::new())
        }
    }

    fn noon() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn dedup_failure_names_the_step() {
        let store = DimStore {
            fail_dedup: true,
            ..Default::default()
        };
        let source = CannedSource::new(Vec::<(u32, String)>::new());
        let err = run(
            &SyncConfig::default(),
            &source,
            &store,
            noon(),
            &ProgressBar::hidden(),
        )
        .unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("failed to deduplicate results"), "{chain}");
        assert!(chain.contains("database is locked"), "{chain}");
    }

    #[test]
    fn negative_lookback_fails_before_scraping() {
        let store = DimStore::default();
        let source = CannedSource::new(Vec::<(u32, String)>::new());
        let config = SyncConfig {
            lookback_days: -3,
            ..Default::default()
        };
        assert!(run(&config, &source, &store, noon(), &ProgressBar::hidden()).is_err());
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn reconcile_inserts_only_missing() {
        let store = DimStore::default();
        store.systems.borrow_mut().insert("SysA".into(), 1);
        let mut map = store.read_dimension(Dimension::System).unwrap();

        let n = reconcile_dimension(&store, Dimension::System, &mut map, ["SysA", "SysB", "SysB"])
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(*store.inserted.borrow(), vec!["SysB".to_string()]);
        assert_eq!(map["SysA"], 1);
        assert_eq!(map["SysB"], 2);
    }

    #[test]
    fn reconcile_nothing_missing_skips_store() {
        let store = DimStore::default();
        store.systems.borrow_mut().insert("SysA".into(), 1);
        let mut map = store.read_dimension(Dimension::System).unwrap();
        assert_eq!(
            reconcile_dimension(&store, Dimension::System, &mut map, ["SysA"]).unwrap(),
            0
        );
        assert!(store.inserted.borrow().is_empty());
    }

    #[test]
    fn unknown_labels_map_to_no_key() {
        let cache = DimensionCache {
            models: HashMap::from([("M".to_string(), 7)]),
            systems: HashMap::new(),
        };
        let row = cache.to_row(&BenchmarkResult {
            cpu_id: Some(1),
            cpu_model: Some("M".into()),
            system: Some("Unknown".into()),
            ..Default::default()
        });
        assert_eq!(row.cpu_model_id, Some(7));
        assert_eq!(row.system_id, None);
        assert_eq!(row.cpu_result_id, Some(1));
    }

    #[test]
    fn mode_mapping() {
        let wm = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(scrape_mode(SyncMode::Incremental, wm), ScrapeMode::Incremental(wm));
        assert_eq!(scrape_mode(SyncMode::Full, wm), ScrapeMode::Full);
        assert_eq!(scrape_mode(SyncMode::Capped(3), wm), ScrapeMode::Capped(3));
    }
}
