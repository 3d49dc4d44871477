//! CPU model-name discovery
//!
//! Builds the tracked model list from two listings: the most recent
//! submissions (many pages) and the processor benchmark chart (one page).

use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use benchline_core::FetchError;
use benchline_store::{Dimension, ResultStore};
use indicatif::ProgressBar;
use scraper::{Html, Selector};

use crate::config::NamesConfig;
use crate::pagination::HttpSource;

static LATEST_MODEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.list-col-inner span.list-col-model").expect("static selector")
});
static BENCHMARK_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr td.name a").expect("static selector"));

/// Raw listing pages used for discovery
pub trait NameSource {
    /// One 1-based page of the latest submitted CPU results
    fn latest_results_page(&self, page: u32) -> Result<String, FetchError>;
    /// The processor benchmark chart
    fn benchmarks_page(&self) -> Result<String, FetchError>;
}

impl NameSource for HttpSource {
    fn latest_results_page(&self, page: u32) -> Result<String, FetchError> {
        let page = page.to_string();
        self.get(&self.config().latest_url, &[("page", &page)])
    }

    fn benchmarks_page(&self) -> Result<String, FetchError> {
        self.get(&self.config().benchmarks_url, &[])
    }
}

/// Model names on a latest-results page: first line of each model block.
pub fn parse_latest_results(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&LATEST_MODEL)
        .filter_map(|el| {
            let text = el.text().collect::<String>();
            text.lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string)
        })
        .collect()
}

/// Model names listed in the benchmark chart.
pub fn parse_benchmarks(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&BENCHMARK_NAME)
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Distinct, sorted model names from every discovery listing.
pub fn discover<S: NameSource + ?Sized>(
    config: &NamesConfig,
    source: &S,
    pb: &ProgressBar,
) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();

    for page in 1..=config.latest_pages {
        pb.set_message(format!("latest results page {page}/{}", config.latest_pages));
        let html = source
            .latest_results_page(page)
            .with_context(|| format!("latest results page {page}"))?;
        let found = parse_latest_results(&html);
        log::debug!("latest page {page}: {} models", found.len());
        names.extend(found);
    }

    pb.set_message("processor benchmarks");
    let html = source
        .benchmarks_page()
        .context("processor benchmarks page")?;
    names.extend(parse_benchmarks(&html));

    Ok(names)
}

/// Outcome of a discovery run
#[derive(Debug, Clone)]
pub struct DiscoverySummary {
    pub discovered: usize,
    pub inserted: usize,
    pub elapsed: Duration,
}

/// Discover model names and add the unseen ones to the model dimension.
pub fn run_discovery<S, T>(
    config: &NamesConfig,
    source: &S,
    store: &T,
    pb: &ProgressBar,
) -> Result<DiscoverySummary>
where
    S: NameSource + ?Sized,
    T: ResultStore + ?Sized,
{
    let start = Instant::now();
    let names: Vec<String> = discover(config, source, pb)?.into_iter().collect();
    log::info!("discovered {} model names", names.len());

    let inserted = store.insert_dimension_entries(Dimension::Model, &names)?;
    pb.finish_and_clear();

    Ok(DiscoverySummary {
        discovered: names.len(),
        inserted,
        elapsed: start.elapsed(),
    })
}
