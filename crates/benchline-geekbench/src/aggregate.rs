//! Multi-page result aggregation
//!
//! Three stop policies over a [`Paginator`]: every page, a page cap, or
//! the first page that reaches below an upload-time watermark.

use benchline_core::FetchError;
use chrono::NaiveDateTime;

use crate::pagination::{PageSource, Paginator};
use crate::record::BenchmarkResult;

/// How many pages of a query to collect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeMode {
    /// Pages `1..=total`
    Full,
    /// Pages `1..=min(total, cap)`; a cap of 0 means no cap
    Capped(u32),
    /// From page 1 until a page contains a row uploaded before the watermark
    Incremental(NaiveDateTime),
}

/// Concatenate pages `start..=end` in page order.
///
/// `start` is clamped to 1 and `end` to the total page count, so an empty
/// range fetches nothing beyond the page-count lookup.
pub fn scrape_pages<S: PageSource + ?Sized>(
    paginator: &Paginator<'_, S>,
    start: u32,
    end: u32,
) -> Result<Vec<BenchmarkResult>, FetchError> {
    let start = start.max(1);
    let end = end.min(paginator.total_pages()?);

    let mut rows = Vec::new();
    for page in start..=end {
        rows.extend(paginator.fetch_page(page)?);
    }
    Ok(rows)
}

/// Collect a query's rows according to `mode`, preserving site order.
pub fn scrape<S: PageSource + ?Sized>(
    paginator: &Paginator<'_, S>,
    mode: ScrapeMode,
) -> Result<Vec<BenchmarkResult>, FetchError> {
    match mode {
        ScrapeMode::Full => scrape_pages(paginator, 1, u32::MAX),
        ScrapeMode::Capped(0) => scrape_pages(paginator, 1, u32::MAX),
        ScrapeMode::Capped(cap) => scrape_pages(paginator, 1, cap),
        ScrapeMode::Incremental(watermark) => scrape_until(paginator, watermark),
    }
}

/// Walk pages newest-first; the first page holding a stale row contributes
/// only its fresh rows and ends the walk.
fn scrape_until<S: PageSource + ?Sized>(
    paginator: &Paginator<'_, S>,
    watermark: NaiveDateTime,
) -> Result<Vec<BenchmarkResult>, FetchError> {
    let mut rows = Vec::new();
    let mut page = 1;
    loop {
        let batch = paginator.fetch_page(page)?;
        let (fresh, stale): (Vec<_>, Vec<_>) =
            batch.into_iter().partition(|r| !r.is_stale(watermark));
        rows.extend(fresh);

        if !stale.is_empty() {
            log::debug!(
                "{}: reached watermark {watermark} on page {page}",
                paginator.query()
            );
            break;
        }
        if page >= paginator.total_pages()? {
            break;
        }
        page += 1;
    }
    Ok(rows)
}

/// Keep rows uploaded at or after `cutoff`; undated rows are kept.
pub fn retain_since(rows: Vec<BenchmarkResult>, cutoff: NaiveDateTime) -> Vec<BenchmarkResult> {
    rows.into_iter().filter(|r| !r.is_stale(cutoff)).collect()
}
