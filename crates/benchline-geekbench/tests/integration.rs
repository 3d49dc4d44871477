#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use benchline_core::FetchError;
use benchline_geekbench::aggregate::{ScrapeMode, scrape};
use benchline_geekbench::runner::reconcile_dimension;
use benchline_geekbench::watermark::{DEFAULT_LOOKBACK_DAYS, resolve};
use benchline_geekbench::{
    BenchmarkResult, DetailSource, NameSource, PageSource, Paginator, SyncConfig, SyncMode, run,
    sync_benchmarks, sync_details,
};
use benchline_store::{Dimension, DuckDbStore, ResultRow, ResultStore, StoreConfig};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use indicatif::ProgressBar;
use tempfile::TempDir;

/// Listing entry as it appears on a search page
#[derive(Clone)]
struct Entry {
    id: i64,
    system: &'static str,
    model: &'static str,
    uploaded: Option<NaiveDateTime>,
    single: &'static str,
    multi: &'static str,
}

impl Entry {
    fn new(id: i64, model: &'static str, uploaded: Option<NaiveDateTime>) -> Self {
        Self {
            id,
            system: "ASUS System Product Name",
            model,
            uploaded,
            single: "3,401",
            multi: "21,337",
        }
    }

    fn html(&self) -> String {
        let uploaded = self
            .uploaded
            .map(|t| t.format("%b %d, %Y %I:%M %p").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        format!(
            r#"<div class="col-12 list-col"><div class="list-col-inner"><div class="row">
<div class="col-12 col-lg-4"><a href="/v6/cpu/{id}">{system}</a>
<span class="list-col-model">{model}
4300 MHz
(16 cores)</span></div>
<div class="col-6 col-lg-2"><span class="list-col-subtitle">Uploaded</span>
<span class="list-col-text">{uploaded}
someone</span></div>
<div class="col-6 col-lg-2"><span class="list-col-subtitle">Platform</span>
<span class="list-col-text">Windows</span></div>
<div class="col-6 col-lg-2"><span class="list-col-subtitle-score">Single-Core Score</span>
<span class="list-col-text-score">{single}</span></div>
<div class="col-6 col-lg-2"><span class="list-col-subtitle-score">Multi-Core Score</span>
<span class="list-col-text-score">{multi}</span></div>
</div></div></div>"#,
            id = self.id,
            system = self.system,
            model = self.model,
            single = self.single,
            multi = self.multi,
        )
    }
}

fn search_page(entries: &[Entry], total: usize) -> String {
    let body: String = entries.iter().map(Entry::html).collect();
    let pagination: String = (1..=total)
        .map(|n| {
            format!(r#"<li class="page-item"><a class="page-link" href="/search?page={n}">{n}</a></li>"#)
        })
        .collect();
    format!(
        r#"<html><body><div class="container"><div class="row">
<div class="col-12 col-lg-9"><div class="row">{body}</div>
<nav><ul class="pagination">{pagination}</ul></nav></div>
<div class="col-12 col-lg-3">sidebar</div></div></div></body></html>"#
    )
}

/// Search listings keyed by query, counting every fetch
struct FakeSite {
    listings: HashMap<String, Vec<Vec<Entry>>>,
    fetches: Cell<usize>,
}

impl FakeSite {
    fn new() -> Self {
        Self {
            listings: HashMap::new(),
            fetches: Cell::new(0),
        }
    }

    fn with(mut self, query: &str, pages: Vec<Vec<Entry>>) -> Self {
        self.listings.insert(query.to_string(), pages);
        self
    }
}

impl PageSource for FakeSite {
    fn fetch_search_page(&self, query: &str, page: u32) -> Result<String, FetchError> {
        self.fetches.set(self.fetches.get() + 1);
        let pages = self.listings.get(query).map(Vec::as_slice).unwrap_or(&[]);
        match pages.get(page as usize - 1) {
            Some(entries) => Ok(search_page(entries, pages.len())),
            None if page == 1 => Ok(search_page(&[], 0)),
            None => Err(FetchError::Status {
                status: 404,
                message: format!("{query} page {page}"),
            }),
        }
    }
}

fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, d)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn store(dir: &TempDir) -> DuckDbStore {
    let store = DuckDbStore::new(StoreConfig {
        path: dir.path().join("bench.duckdb"),
    })
    .unwrap();
    store.init_schema().unwrap();
    store
}

fn track(store: &DuckDbStore, models: &[&str]) -> HashMap<String, i32> {
    let names: Vec<String> = models.iter().map(|m| m.to_string()).collect();
    store.insert_dimension_entries(Dimension::Model, &names).unwrap();
    store.read_dimension(Dimension::Model).unwrap()
}

fn seed(store: &DuckDbStore, model_id: i32, id: i64, uploaded: NaiveDateTime) {
    store
        .append_rows(&[ResultRow {
            cpu_result_id: Some(id),
            frequency: None,
            cores: None,
            uploaded: Some(uploaded),
            platform: None,
            single_core_score: None,
            multi_core_score: None,
            cpu_model_id: Some(model_id),
            system_id: None,
        }])
        .unwrap();
}

fn ids(rows: &[BenchmarkResult]) -> Vec<i64> {
    rows.iter().filter_map(|r| r.cpu_id).collect()
}

#[test]
fn watermark_stops_on_first_page() {
    // Page 1 of 3 holds days 5, 4, 3; watermark is day 4
    let site = FakeSite::new().with(
        "M",
        vec![
            vec![Entry::new(5, "M", Some(day(5))), Entry::new(4, "M", Some(day(4))), Entry::new(3, "M", Some(day(3)))],
            vec![Entry::new(2, "M", Some(day(2)))],
            vec![Entry::new(1, "M", Some(day(1)))],
        ],
    );
    let paginator = Paginator::new(&site, "M");
    let rows = scrape(&paginator, ScrapeMode::Incremental(day(4))).unwrap();

    assert_eq!(ids(&rows), vec![5, 4]);
    assert_eq!(site.fetches.get(), 1);
}

#[test]
fn future_watermark_fetches_one_page() {
    let site = FakeSite::new().with(
        "M",
        vec![
            vec![Entry::new(3, "M", Some(day(3))), Entry::new(2, "M", None), Entry::new(1, "M", Some(day(1)))],
            vec![Entry::new(0, "M", Some(day(1)))],
        ],
    );
    let paginator = Paginator::new(&site, "M");
    let rows = scrape(&paginator, ScrapeMode::Incremental(day(30))).unwrap();

    assert_eq!(site.fetches.get(), 1);
    assert_eq!(ids(&rows), vec![2]);
    assert!(rows.iter().all(|r| r.uploaded.is_none_or(|t| t >= day(30))));
}

#[test]
fn fresh_pages_continue_to_next() {
    let site = FakeSite::new().with(
        "M",
        vec![
            vec![Entry::new(6, "M", Some(day(6))), Entry::new(5, "M", Some(day(5)))],
            vec![Entry::new(4, "M", Some(day(4))), Entry::new(3, "M", Some(day(3)))],
            vec![Entry::new(2, "M", Some(day(2)))],
        ],
    );
    let paginator = Paginator::new(&site, "M");
    let rows = scrape(&paginator, ScrapeMode::Incremental(day(4))).unwrap();

    assert_eq!(ids(&rows), vec![6, 5, 4]);
    assert_eq!(site.fetches.get(), 2);
}

#[test]
fn empty_model_uses_lookback() {
    let now = day(31);
    assert_eq!(
        resolve(None, now, DEFAULT_LOOKBACK_DAYS).unwrap(),
        now - TimeDelta::days(30)
    );

    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    track(&store, &["M"]);

    let inside = now - TimeDelta::days(29);
    let outside = now - TimeDelta::days(31);
    let site = FakeSite::new().with(
        "M",
        vec![vec![Entry::new(2, "M", Some(inside)), Entry::new(1, "M", Some(outside))]],
    );

    let summary = run(&SyncConfig::default(), &site, &store, now, &ProgressBar::hidden()).unwrap();
    assert_eq!(summary.rows_appended, 1);
    assert_eq!(store.read_rows().unwrap()[0].cpu_result_id, Some(2));
}

#[test]
fn sync_twice_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    track(&store, &["Alpha", "Beta"]);

    let site = FakeSite::new()
        .with(
            "Alpha",
            vec![
                vec![Entry::new(10, "Alpha", Some(day(9))), Entry::new(9, "Alpha", Some(day(8)))],
                vec![Entry::new(8, "Alpha", Some(day(7)))],
            ],
        )
        .with("Beta", vec![vec![Entry::new(20, "Beta", Some(day(9)))]]);

    let now = day(10);
    let first = run(&SyncConfig::default(), &site, &store, now, &ProgressBar::hidden()).unwrap();
    assert_eq!(first.models, 2);
    assert_eq!(first.rows_appended, 4);
    let once = store.read_rows().unwrap().len();

    let second = run(&SyncConfig::default(), &site, &store, now, &ProgressBar::hidden()).unwrap();
    assert!(second.duplicates_removed > 0);
    assert_eq!(store.read_rows().unwrap().len(), once);
}

#[test]
fn all_fields_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    track(&store, &["AMD Ryzen 9 9950X3D"]);

    let uploaded = NaiveDate::from_ymd_opt(2025, 5, 9)
        .unwrap()
        .and_hms_opt(21, 15, 0)
        .unwrap();
    let site = FakeSite::new().with(
        "AMD Ryzen 9 9950X3D",
        vec![vec![Entry::new(12479005, "AMD Ryzen 9 9950X3D", Some(uploaded))]],
    );

    run(&SyncConfig::default(), &site, &store, day(10), &ProgressBar::hidden()).unwrap();

    let rows = store.read_rows().unwrap();
    assert_eq!(rows.len(), 1);
    let r = &rows[0];
    let models = store.read_dimension(Dimension::Model).unwrap();
    let systems = store.read_dimension(Dimension::System).unwrap();

    assert_eq!(r.cpu_result_id, Some(12479005));
    assert_eq!(r.frequency.as_deref(), Some("4300 MHz"));
    assert_eq!(r.cores, Some(16));
    assert_eq!(r.uploaded, Some(uploaded));
    assert_eq!(r.platform.as_deref(), Some("Windows"));
    assert_eq!(r.single_core_score, Some(3401));
    assert_eq!(r.multi_core_score, Some(21337));
    assert_eq!(r.cpu_model_id, Some(models["AMD Ryzen 9 9950X3D"]));
    assert_eq!(r.system_id, Some(systems["ASUS System Product Name"]));
}

#[test]
fn reconcile_adds_only_unknown_systems() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store
        .insert_dimension_entries(Dimension::System, &["SysA".to_string()])
        .unwrap();
    let mut map = store.read_dimension(Dimension::System).unwrap();
    let sys_a = map["SysA"];

    let inserted =
        reconcile_dimension(&store, Dimension::System, &mut map, ["SysA", "SysB"]).unwrap();

    assert_eq!(inserted, 1);
    assert_eq!(map.len(), 2);
    assert_eq!(map["SysA"], sys_a);
    assert_ne!(map["SysB"], sys_a);
}

#[test]
fn stored_rows_set_the_watermark() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let keys = track(&store, &["M"]);
    seed(&store, keys["M"], 100, day(4));

    let site = FakeSite::new().with(
        "M",
        vec![
            vec![Entry::new(6, "M", Some(day(6))), Entry::new(3, "M", Some(day(3)))],
            vec![Entry::new(2, "M", Some(day(2)))],
        ],
    );
    let summary = run(&SyncConfig::default(), &site, &store, day(20), &ProgressBar::hidden()).unwrap();

    assert_eq!(summary.rows_scraped, 1);
    assert_eq!(site.fetches.get(), 1);
}

#[test]
fn capped_mode_ignores_watermark() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let keys = track(&store, &["M"]);
    seed(&store, keys["M"], 100, day(30));

    let site = FakeSite::new().with(
        "M",
        vec![
            vec![Entry::new(3, "M", Some(day(3)))],
            vec![Entry::new(2, "M", Some(day(2)))],
            vec![Entry::new(1, "M", Some(day(1)))],
        ],
    );
    let config = SyncConfig {
        mode: SyncMode::Capped(2),
        ..Default::default()
    };
    let summary = run(&config, &site, &store, day(31), &ProgressBar::hidden()).unwrap();

    assert_eq!(summary.rows_scraped, 2);
    assert_eq!(site.fetches.get(), 2);
}

#[test]
fn delete_before_insert_replaces_window() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let keys = track(&store, &["M"]);
    seed(&store, keys["M"], 1, day(2));
    seed(&store, keys["M"], 5, day(5));

    // Watermark is day 5; the stored day-5 row is replaced by the scraped one
    let site = FakeSite::new().with(
        "M",
        vec![vec![Entry::new(6, "M", Some(day(6))), Entry::new(5, "M", Some(day(5))), Entry::new(1, "M", Some(day(2)))]],
    );
    let config = SyncConfig {
        delete_before_insert: true,
        ..Default::default()
    };
    run(&config, &site, &store, day(7), &ProgressBar::hidden()).unwrap();

    let mut stored: Vec<_> = store
        .read_rows()
        .unwrap()
        .into_iter()
        .filter_map(|r| r.cpu_result_id)
        .collect();
    stored.sort();
    assert_eq!(stored, vec![1, 5, 6]);
}

/// Advertises two pages but fails on the second
struct BrokenSecondPage;

impl PageSource for BrokenSecondPage {
    fn fetch_search_page(&self, query: &str, page: u32) -> Result<String, FetchError> {
        match page {
            1 => Ok(search_page(&[Entry::new(2, "M", Some(day(9)))], 2)),
            _ => Err(FetchError::Status {
                status: 503,
                message: format!("{query} page {page}"),
            }),
        }
    }
}

#[test]
fn fetch_error_aborts_with_model_context() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    track(&store, &["M"]);

    let err = run(&SyncConfig::default(), &BrokenSecondPage, &store, day(10), &ProgressBar::hidden())
        .unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("failed to scrape M"));
    assert!(msg.contains("503"));
    assert!(store.read_rows().unwrap().is_empty());
}

/// Serves a fixed processor chart; latest-results pages are empty
struct ChartSite(String);

impl NameSource for ChartSite {
    fn latest_results_page(&self, _page: u32) -> Result<String, FetchError> {
        Ok(String::new())
    }

    fn benchmarks_page(&self) -> Result<String, FetchError> {
        Ok(self.0.clone())
    }
}

fn chart(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(model, score)| {
            format!(
                r#"<tr><td class="name"><a href="/processors/x">{model}</a>
<div class="description">3.5 GHz (8 cores)</div></td><td class="score">{score}</td></tr>"#
            )
        })
        .collect();
    format!(
        r#"<div id="single-core"><table class="table"><tbody>{body}</tbody></table></div>
<div id="multi-core"><table class="table"><tbody>{body}</tbody></table></div>"#
    )
}

#[test]
fn chart_load_replaces_stored_chart() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    let first = ChartSite(chart(&[("Old CPU", "1,000"), ("Apple M4", "3,800")]));
    assert_eq!(sync_benchmarks(&first, &store).unwrap().rows, 2);

    let second = ChartSite(chart(&[("Apple M4", "3,850")]));
    assert_eq!(sync_benchmarks(&second, &store).unwrap().rows, 1);

    let stored = store.read_benchmarks().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].cpu_model, "Apple M4");
    assert_eq!(stored[0].frequency.as_deref(), Some("3.5 GHz"));
    assert_eq!(stored[0].cores, Some(8));
    assert_eq!(stored[0].single_core_score, Some(3850));
    assert_eq!(stored[0].multi_core_score, Some(3850));
}

#[test]
fn empty_chart_keeps_stored_chart() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    sync_benchmarks(&ChartSite(chart(&[("Apple M4", "3,800")])), &store).unwrap();

    let summary = sync_benchmarks(&ChartSite("<html></html>".into()), &store).unwrap();
    assert_eq!(summary.rows, 0);
    assert_eq!(store.read_benchmarks().unwrap().len(), 1);
}

fn detail_page(codename: &str) -> String {
    format!(
        r#"<html><head><title>Detail</title></head><body>
<div class="score-container"><div class="score">2,500</div><div class="score">12,000</div></div>
<table class="system-table"><tbody>
<tr><td class="system-name">Upload Date</td><td>Sat, 10 May 2025 10:00:00 +0000</td></tr>
</tbody></table>
<table class="system-table"><tbody><tr><td>Operating System</td><td>Linux</td></tr></tbody></table>
<table class="system-table"><tbody><tr><td>Codename</td><td>{codename}</td></tr></tbody></table>
<table class="system-table"><tbody><tr><td>Size</td><td>16.00 GB</td></tr></tbody></table>
</body></html>"#
    )
}

/// Detail pages by result id, recording every requested id
struct DetailSite {
    pages: HashMap<i64, String>,
    requested: RefCell<Vec<i64>>,
}

impl DetailSite {
    fn new(pages: &[(i64, &str)]) -> Self {
        Self {
            pages: pages.iter().map(|(id, c)| (*id, detail_page(c))).collect(),
            requested: RefCell::new(Vec::new()),
        }
    }
}

impl DetailSource for DetailSite {
    fn detail_page(&self, result_id: i64) -> Result<String, FetchError> {
        self.requested.borrow_mut().push(result_id);
        self.pages.get(&result_id).cloned().ok_or(FetchError::Status {
            status: 404,
            message: format!("result {result_id}"),
        })
    }
}

#[test]
fn details_fill_each_model_once() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let keys = track(&store, &["Alpha", "Beta", "Gamma"]);
    seed(&store, keys["Alpha"], 5, day(3));
    seed(&store, keys["Alpha"], 7, day(6));
    seed(&store, keys["Beta"], 9, day(4));

    let site = DetailSite::new(&[(7, "Zen 4"), (9, "Raptor Lake")]);
    let summary = sync_details(&site, &store, None, &ProgressBar::hidden()).unwrap();
    assert_eq!(summary.pending, 2);
    assert_eq!(summary.stored, 2);
    assert_eq!(*site.requested.borrow(), vec![7, 9]);

    let again = sync_details(&site, &store, None, &ProgressBar::hidden()).unwrap();
    assert_eq!(again.pending, 0);
    assert_eq!(site.requested.borrow().len(), 2);

    assert_eq!(
        store.read_codenames().unwrap(),
        vec![
            ("Alpha".to_string(), Some("Zen 4".to_string())),
            ("Beta".to_string(), Some("Raptor Lake".to_string())),
            ("Gamma".to_string(), None),
        ]
    );
}

#[test]
fn detail_failure_keeps_earlier_models() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let keys = track(&store, &["Alpha", "Beta"]);
    seed(&store, keys["Alpha"], 7, day(6));
    seed(&store, keys["Beta"], 9, day(4));

    let site = DetailSite::new(&[(7, "Zen 4")]);
    let err = sync_details(&site, &store, None, &ProgressBar::hidden()).unwrap_err();
    assert!(format!("{err:#}").contains("detail page 9"));

    let pending: Vec<i32> = store
        .pending_details()
        .unwrap()
        .into_iter()
        .map(|t| t.cpu_model_id)
        .collect();
    assert_eq!(pending, vec![keys["Beta"]]);
}

#[test]
fn detail_limit_caps_visits() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let keys = track(&store, &["Alpha", "Beta"]);
    seed(&store, keys["Alpha"], 7, day(6));
    seed(&store, keys["Beta"], 9, day(4));

    let site = DetailSite::new(&[(7, "Zen 4"), (9, "Raptor Lake")]);
    let summary = sync_details(&site, &store, Some(1), &ProgressBar::hidden()).unwrap();
    assert_eq!(summary.pending, 2);
    assert_eq!(summary.stored, 1);
    assert_eq!(*site.requested.borrow(), vec![7]);
}
