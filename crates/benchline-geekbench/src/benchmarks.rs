//! Processor benchmark chart
//!
//! The chart page carries two tables of the same processors, one per
//! score kind:
//!
//! ```text
//! div#single-core table.table tbody tr
//! ├── td.name   a "AMD Ryzen 9 9950X" + "4.3 GHz (16 cores)"
//! └── td.score  "3,337"
//! div#multi-core  (same layout)
//! ```
//!
//! Rows are merged by model name into one chart row per processor.

use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use benchline_store::{BenchmarkRow, ResultStore};
use scraper::{ElementRef, Html, Selector};

use crate::names::NameSource;
use crate::parser::{non_empty, parse_cores, parse_score, text_of};

static SINGLE_CORE_ROWS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div#single-core table.table tbody tr").expect("static selector")
});
static MULTI_CORE_ROWS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div#multi-core table.table tbody tr").expect("static selector")
});
static NAME_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.name").expect("static selector"));
static NAME_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.name a").expect("static selector"));
static SCORE_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.score").expect("static selector"));

/// One row of one chart table
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChartEntry {
    cpu_model: String,
    frequency: Option<String>,
    cores: Option<i32>,
    score: Option<i32>,
}

/// Frequency like "3.8 GHz" inside free text. The number is kept as shown.
pub fn parse_chart_frequency(text: &str) -> Option<String> {
    let end = text.find("GHz")?;
    let before = text[..end].trim_end();
    let head = before.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
    let value = &before[head.len()..];
    if !value.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{value} GHz"))
}

/// Core count from the first parenthesized "(N cores)" group in free text.
pub fn parse_chart_cores(text: &str) -> Option<i32> {
    text.split('(')
        .skip(1)
        .filter_map(|group| group.split_once(')'))
        .find_map(|(inner, _)| parse_cores(inner))
}

fn parse_chart_entry(row: ElementRef<'_>) -> Option<ChartEntry> {
    let cpu_model = non_empty(&text_of(row.select(&NAME_LINK).next()?))?;
    let rest = row
        .select(&NAME_CELL)
        .next()
        .map(|cell| text_of(cell).replacen(&cpu_model, "", 1))
        .unwrap_or_default();
    let score = row
        .select(&SCORE_CELL)
        .next()
        .and_then(|cell| parse_score(&text_of(cell)));

    Some(ChartEntry {
        frequency: parse_chart_frequency(&rest),
        cores: parse_chart_cores(&rest),
        cpu_model,
        score,
    })
}

fn chart_table(document: &Html, rows: &Selector) -> BTreeMap<String, ChartEntry> {
    document
        .select(rows)
        .filter_map(parse_chart_entry)
        .map(|e| (e.cpu_model.clone(), e))
        .collect()
}

/// Merge the single- and multi-core tables into one row per model, sorted
/// by model name. Frequency and cores come from the single-core table
/// when it lists them.
pub fn parse_chart(html: &str) -> Vec<BenchmarkRow> {
    let document = Html::parse_document(html);
    let single = chart_table(&document, &SINGLE_CORE_ROWS);
    let mut multi = chart_table(&document, &MULTI_CORE_ROWS);

    let mut rows: Vec<BenchmarkRow> = single
        .into_values()
        .map(|s| {
            let m = multi.remove(&s.cpu_model);
            BenchmarkRow {
                frequency: s
                    .frequency
                    .or_else(|| m.as_ref().and_then(|m| m.frequency.clone())),
                cores: s.cores.or_else(|| m.as_ref().and_then(|m| m.cores)),
                single_core_score: s.score,
                multi_core_score: m.and_then(|m| m.score),
                cpu_model: s.cpu_model,
            }
        })
        .collect();

    rows.extend(multi.into_values().map(|m| BenchmarkRow {
        cpu_model: m.cpu_model,
        frequency: m.frequency,
        cores: m.cores,
        single_core_score: None,
        multi_core_score: m.score,
    }));
    rows.sort_by(|a, b| a.cpu_model.cmp(&b.cpu_model));
    rows
}

/// Outcome of a chart load
#[derive(Debug, Clone)]
pub struct ChartSummary {
    pub rows: usize,
    pub elapsed: Duration,
}

/// Fetch the benchmark chart and replace the stored copy with it.
///
/// An empty parse leaves the stored chart untouched.
pub fn sync_benchmarks<S, T>(source: &S, store: &T) -> Result<ChartSummary>
where
    S: NameSource + ?Sized,
    T: ResultStore + ?Sized,
{
    let start = Instant::now();
    let html = source
        .benchmarks_page()
        .context("processor benchmarks page")?;
    let rows = parse_chart(&html);
    log::info!("benchmark chart: {} processors", rows.len());

    let written = if rows.is_empty() {
        log::warn!("benchmark chart parsed empty, keeping stored chart");
        0
    } else {
        store
            .replace_benchmarks(&rows)
            .context("failed to store benchmark chart")?
    };

    Ok(ChartSummary {
        rows: written,
        elapsed: start.elapsed(),
    })
}
