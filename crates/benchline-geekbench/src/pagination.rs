//! Search listing pagination
//!
//! A [`Paginator`] walks one query's result pages through a [`PageSource`].
//! Page 1 carries the pagination control, so the first fetch of page 1
//! serves both the total page count and the page's rows.

use std::cell::{Cell, RefCell};

use benchline_core::{FetchError, fetch_html};

use crate::config::SourceConfig;
use crate::parser::{parse_results_page, parse_total_pages};
use crate::record::BenchmarkResult;

/// Raw search page provider
pub trait PageSource {
    /// HTML of one 1-based page of search results for `query`.
    fn fetch_search_page(&self, query: &str, page: u32) -> Result<String, FetchError>;
}

/// Live source: the Geekbench browser over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    config: SourceConfig,
}

impl HttpSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// GET `url` with the configured User-Agent.
    pub(crate) fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        fetch_html(url, query, &self.config.user_agent)
    }
}

impl PageSource for HttpSource {
    fn fetch_search_page(&self, query: &str, page: u32) -> Result<String, FetchError> {
        let page = page.to_string();
        self.get(&self.config.search_url, &[("q", query), ("page", &page)])
    }
}

/// Page walker for a single query.
///
/// Fetch errors are returned to the caller as-is; nothing is retried.
pub struct Paginator<'a, S: PageSource + ?Sized> {
    source: &'a S,
    query: String,
    total: Cell<Option<u32>>,
    first_page: RefCell<Option<Vec<BenchmarkResult>>>,
    fetches: Cell<usize>,
}

impl<'a, S: PageSource + ?Sized> Paginator<'a, S> {
    pub fn new(source: &'a S, query: impl Into<String>) -> Self {
        Self {
            source,
            query: query.into(),
            total: Cell::new(None),
            first_page: RefCell::new(None),
            fetches: Cell::new(0),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Number of HTTP fetches issued so far
    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }

    fn fetch_raw(&self, page: u32) -> Result<String, FetchError> {
        self.fetches.set(self.fetches.get() + 1);
        log::debug!("{}: fetching page {page}", self.query);
        self.source.fetch_search_page(&self.query, page)
    }

    /// Fetch and parse page 1, caching both the page count and the rows.
    fn load_first_page(&self) -> Result<Vec<BenchmarkResult>, FetchError> {
        let html = self.fetch_raw(1)?;
        let total = parse_total_pages(&html);
        let rows = parse_results_page(&html);
        log::debug!("{}: {total} pages", self.query);
        self.total.set(Some(total));
        Ok(rows)
    }

    /// Total page count for the query. Fetches page 1 at most once.
    pub fn total_pages(&self) -> Result<u32, FetchError> {
        if let Some(total) = self.total.get() {
            return Ok(total);
        }
        let rows = self.load_first_page()?;
        *self.first_page.borrow_mut() = Some(rows);
        // load_first_page always sets the count
        Ok(self.total.get().unwrap_or(1))
    }

    /// Rows of one page in site order.
    ///
    /// Page 1 is served from the cache filled by [`total_pages`](Self::total_pages)
    /// when available; fetching it also fills the page-count cache.
    pub fn fetch_page(&self, page: u32) -> Result<Vec<BenchmarkResult>, FetchError> {
        if page == 1 {
            if let Some(rows) = self.first_page.borrow_mut().take() {
                return Ok(rows);
            }
            if self.total.get().is_none() {
                return self.load_first_page();
            }
        }
        let html = self.fetch_raw(page)?;
        Ok(parse_results_page(&html))
    }
}
