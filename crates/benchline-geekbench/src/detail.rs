//! Result detail pages
//!
//! One detail page is read per tracked model, from the model's newest
//! stored result, to record its hardware details and codename.
//!
//! ```text
//! title                                   page title
//! .score-container .score (x2)            single-core, multi-core
//! td.system-name "Upload Date" + td       upload time
//! td.system-name "Views" + td             view count
//! table.system-table [1] [2] [3]          system, CPU, memory key/value rows
//! table.benchmark-table [0] [1]           single-core, multi-core workloads
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use benchline_core::FetchError;
use benchline_store::{DetailRow, DetailTarget, ResultStore};
use chrono::NaiveDateTime;
use indicatif::ProgressBar;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::pagination::HttpSource;
use crate::parser::{non_empty, parse_score, parse_upload_time, text_of};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static HEADLINE_SCORE: LazyLock<Selector> =
    LazyLock::new(|| selector(".score-container .score"));
static SYSTEM_NAME: LazyLock<Selector> = LazyLock::new(|| selector("td.system-name"));
static SYSTEM_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table.system-table"));
static BENCHMARK_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table.benchmark-table"));
static BODY_ROW: LazyLock<Selector> = LazyLock::new(|| selector("tbody tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static WORKLOAD_NAME: LazyLock<Selector> = LazyLock::new(|| selector("td.name"));
static WORKLOAD_SCORE: LazyLock<Selector> = LazyLock::new(|| selector("td.score"));
static WORKLOAD_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector("span.description"));

/// `cpu_info` key holding the microarchitecture codename
const CODENAME_KEY: &str = "Codename";

/// Raw detail page provider
pub trait DetailSource {
    /// HTML of the detail page of one result.
    fn detail_page(&self, result_id: i64) -> Result<String, FetchError>;
}

impl DetailSource for HttpSource {
    fn detail_page(&self, result_id: i64) -> Result<String, FetchError> {
        let url = format!(
            "{}/{result_id}",
            self.config().detail_url.trim_end_matches('/')
        );
        self.get(&url, &[])
    }
}

/// One workload line of a benchmark table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkloadScore {
    pub score: Option<i32>,
    /// Throughput as displayed, e.g. "245.3 MB/sec"
    pub description: String,
}

/// Parsed detail page. Missing parts stay `None` or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultDetail {
    pub title: Option<String>,
    pub upload_date: Option<NaiveDateTime>,
    pub views: Option<i32>,
    pub single_core_score: Option<i32>,
    pub multi_core_score: Option<i32>,
    pub system_info: BTreeMap<String, String>,
    pub cpu_info: BTreeMap<String, String>,
    pub memory_info: BTreeMap<String, String>,
    pub single_core_benchmarks: BTreeMap<String, WorkloadScore>,
    pub multi_core_benchmarks: BTreeMap<String, WorkloadScore>,
}

impl ResultDetail {
    pub fn codename(&self) -> Option<&str> {
        self.cpu_info.get(CODENAME_KEY).map(String::as_str)
    }

    /// Store row for `target`, with the map columns encoded as JSON text.
    pub fn to_row(&self, target: DetailTarget) -> Result<DetailRow> {
        Ok(DetailRow {
            cpu_result_id: target.cpu_result_id,
            title: self.title.clone(),
            upload_date: self.upload_date,
            views: self.views,
            cpu_model_id: target.cpu_model_id,
            cpu_codename: self.codename().map(str::to_string),
            single_core_score: self.single_core_score,
            multi_core_score: self.multi_core_score,
            system_info: serde_json::to_string(&self.system_info)?,
            cpu_info: serde_json::to_string(&self.cpu_info)?,
            memory_info: serde_json::to_string(&self.memory_info)?,
            single_core_benchmarks: serde_json::to_string(&self.single_core_benchmarks)?,
            multi_core_benchmarks: serde_json::to_string(&self.multi_core_benchmarks)?,
        })
    }
}

/// Value cell next to the `td.system-name` cell whose text is `label`.
fn system_value(document: &Html, label: &str) -> Option<String> {
    document
        .select(&SYSTEM_NAME)
        .find(|td| text_of(*td).trim() == label)?
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "td")
        .and_then(|td| non_empty(&text_of(td)))
}

/// Two-cell rows of a key/value table.
fn key_values(table: ElementRef<'_>) -> BTreeMap<String, String> {
    table
        .select(&BODY_ROW)
        .filter_map(|row| {
            let cells: Vec<_> = row.select(&CELL).collect();
            match cells.as_slice() {
                [key, value] => Some((
                    text_of(*key).trim().to_string(),
                    text_of(*value).trim().to_string(),
                )),
                _ => None,
            }
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Workload rows of a benchmark table. The score is the cell's own text;
/// the nested description span is read separately.
fn workloads(table: ElementRef<'_>) -> BTreeMap<String, WorkloadScore> {
    table
        .select(&BODY_ROW)
        .filter_map(|row| {
            let name = non_empty(&text_of(row.select(&WORKLOAD_NAME).next()?))?;
            let score_cell = row.select(&WORKLOAD_SCORE).next()?;
            let score = score_cell
                .children()
                .filter_map(|node| node.value().as_text())
                .map(|t| t.trim())
                .find(|t| !t.is_empty())
                .and_then(parse_score);
            let description = row
                .select(&WORKLOAD_DESCRIPTION)
                .next()
                .map(|d| text_of(d).trim().to_string())
                .unwrap_or_default();
            Some((name, WorkloadScore { score, description }))
        })
        .collect()
}

/// Parse one detail page. Never fails.
pub fn parse_detail(html: &str) -> ResultDetail {
    let document = Html::parse_document(html);

    let mut scores = document
        .select(&HEADLINE_SCORE)
        .map(|s| parse_score(&text_of(s)));
    let single_core_score = scores.next().flatten();
    let multi_core_score = scores.next().flatten();

    let system_tables: Vec<_> = document.select(&SYSTEM_TABLE).collect();
    let info = |index: usize| {
        system_tables
            .get(index)
            .map(|t| key_values(*t))
            .unwrap_or_default()
    };
    let benchmark_tables: Vec<_> = document.select(&BENCHMARK_TABLE).collect();
    let bench = |index: usize| {
        benchmark_tables
            .get(index)
            .map(|t| workloads(*t))
            .unwrap_or_default()
    };

    ResultDetail {
        title: document
            .select(&TITLE)
            .next()
            .and_then(|t| non_empty(&text_of(t))),
        upload_date: system_value(&document, "Upload Date")
            .and_then(|v| parse_upload_time(&v)),
        views: system_value(&document, "Views").and_then(|v| parse_score(&v)),
        single_core_score,
        multi_core_score,
        system_info: info(1),
        cpu_info: info(2),
        memory_info: info(3),
        single_core_benchmarks: bench(0),
        multi_core_benchmarks: bench(1),
    }
}

/// Outcome of a detail run
#[derive(Debug, Clone)]
pub struct DetailSummary {
    pub pending: usize,
    pub stored: usize,
    pub elapsed: Duration,
}

/// Fetch and store one detail page for every model still lacking one.
///
/// `limit` caps how many models are visited this run. Rows are appended
/// per model, so a fetch error keeps what was already stored and the next
/// run picks up the remaining models.
pub fn sync_details<S, T>(
    source: &S,
    store: &T,
    limit: Option<usize>,
    pb: &ProgressBar,
) -> Result<DetailSummary>
where
    S: DetailSource + ?Sized,
    T: ResultStore + ?Sized,
{
    let start = Instant::now();
    let mut targets = store
        .pending_details()
        .context("failed to read pending details")?;
    let pending = targets.len();
    if let Some(limit) = limit {
        targets.truncate(limit);
    }
    log::info!("{pending} models without details, visiting {}", targets.len());
    pb.set_length(targets.len() as u64);

    let mut stored = 0;
    for target in targets {
        pb.set_message(format!("result {}", target.cpu_result_id));
        let html = source
            .detail_page(target.cpu_result_id)
            .with_context(|| format!("detail page {}", target.cpu_result_id))?;
        let detail = parse_detail(&html);
        log::debug!(
            "model {}: result {} codename {:?}",
            target.cpu_model_id,
            target.cpu_result_id,
            detail.codename()
        );

        let row = detail
            .to_row(target)
            .with_context(|| format!("failed to encode detail {}", target.cpu_result_id))?;
        stored += store
            .append_details(std::slice::from_ref(&row))
            .with_context(|| format!("failed to store detail {}", target.cpu_result_id))?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(DetailSummary {
        pending,
        stored,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = r#"<html><head><title>
  ASUS System Product Name - Geekbench
</title></head><body>
<div class="score-container"><div class="score">3,012</div><div class="score">17,455</div></div>
<table class="table system-table"><tbody>
<tr><td class="system-name">Upload Date</td><td class="system-value">Sat, 14 Jun 2025 01:20:32 +0000</td></tr>
<tr><td class="system-name">Views</td><td class="system-value">1,204</td></tr>
</tbody></table>
<table class="table system-table"><tbody>
<tr><td class="system-name">Operating System</td><td class="system-value">Microsoft Windows 11</td></tr>
<tr><td class="system-name">Model</td><td class="system-value">ASUS System Product Name</td></tr>
<tr><th colspan="2">Header row</th></tr>
</tbody></table>
<table class="table system-table"><tbody>
<tr><td class="system-name">Name</td><td class="system-value">Intel Core i7-14700K</td></tr>
<tr><td class="system-name">Codename</td><td class="system-value">Raptor Lake</td></tr>
</tbody></table>
<table class="table system-table"><tbody>
<tr><td class="system-name">Size</td><td class="system-value">32.00 GB</td></tr>
</tbody></table>
<table class="table benchmark-table"><tbody>
<tr><td class="name">File Compression</td><td class="score">2,871
<span class="description">412.3 MB/sec</span></td></tr>
<tr><td class="name">Navigation</td><td class="score">N/A</td></tr>
</tbody></table>
<table class="table benchmark-table"><tbody>
<tr><td class="name">File Compression</td><td class="score">14,002
<span class="description">2.01 GB/sec</span></td></tr>
</tbody></table>
</body></html>"#;

    #[test]
    fn parses_detail_page() {
        let d = parse_detail(DETAIL);
        assert_eq!(d.title.as_deref(), Some("ASUS System Product Name - Geekbench"));
        assert_eq!(d.single_core_score, Some(3012));
        assert_eq!(d.multi_core_score, Some(17455));
        assert_eq!(d.views, Some(1204));
        assert_eq!(
            d.upload_date,
            chrono::NaiveDate::from_ymd_opt(2025, 6, 14)
                .unwrap()
                .and_hms_opt(1, 20, 32)
        );
        assert_eq!(d.system_info.len(), 2);
        assert_eq!(d.system_info["Operating System"], "Microsoft Windows 11");
        assert_eq!(d.codename(), Some("Raptor Lake"));
        assert_eq!(d.memory_info["Size"], "32.00 GB");

        let compression = &d.single_core_benchmarks["File Compression"];
        assert_eq!(compression.score, Some(2871));
        assert_eq!(compression.description, "412.3 MB/sec");
        assert_eq!(d.single_core_benchmarks["Navigation"].score, None);
        assert_eq!(d.multi_core_benchmarks["File Compression"].score, Some(14002));
    }

    #[test]
    fn bare_page_degrades_to_empty() {
        let d = parse_detail("<html><body>not found</body></html>");
        assert_eq!(d, ResultDetail::default());
        assert_eq!(d.codename(), None);
    }

    #[test]
    fn row_carries_target_and_json_maps() {
        let d = parse_detail(DETAIL);
        let row = d
            .to_row(DetailTarget {
                cpu_model_id: 4,
                cpu_result_id: 12479005,
            })
            .unwrap();
        assert_eq!(row.cpu_model_id, 4);
        assert_eq!(row.cpu_result_id, 12479005);
        assert_eq!(row.cpu_codename.as_deref(), Some("Raptor Lake"));
        assert_eq!(row.memory_info, r#"{"Size":"32.00 GB"}"#);
        let bench: serde_json::Value = serde_json::from_str(&row.single_core_benchmarks).unwrap();
        assert_eq!(bench["File Compression"]["score"], 2871);
    }
}
