//! Geekbench browser listing parser using scraper
//!
//! Listing markup (one entry):
//!
//! ```text
//! div.col-12.list-col
//! ├── a[href="/v6/cpu/12345"]          system label, result id
//! ├── span.list-col-model              "model\nfrequency\n(N cores)"
//! ├── span.list-col-subtitle "Uploaded"          + span  "Feb 28, 2023\n\nhandle"
//! ├── span.list-col-subtitle "Platform"          + span  "Windows"
//! ├── span.list-col-subtitle-score "Single-Core Score" + span "3,401"
//! └── span.list-col-subtitle-score "Multi-Core Score"  + span "21,337"
//! ```
//!
//! Every field is extracted independently; nothing here returns an error.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use scraper::{ElementRef, Html, Selector};

use crate::record::BenchmarkResult;

/// Prefix for detail links, which are site-relative
pub const SITE_ROOT: &str = "https://browser.geekbench.com";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static RESULTS_REGION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"div[class="row"] div[class="col-12 col-lg-9"]"#));
static ENTRY: LazyLock<Selector> = LazyLock::new(|| selector(r#"div[class="col-12 list-col"]"#));
static DETAIL_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href^='/v6/cpu/']"));
static MODEL_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("span.list-col-model"));
static SUBTITLE: LazyLock<Selector> = LazyLock::new(|| selector("span.list-col-subtitle"));
static SCORE_SUBTITLE: LazyLock<Selector> =
    LazyLock::new(|| selector("span.list-col-subtitle-score"));
static PAGINATION: LazyLock<Selector> = LazyLock::new(|| selector("ul.pagination"));
static PAGE_LINK: LazyLock<Selector> = LazyLock::new(|| selector("li.page-item a.page-link"));

/// Marker a core-count line must contain ("16 cores", "1 core")
const CORE_MARKER: &str = "core";

/// Formats with a time component, tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%b %d, %Y %I:%M %p",
    "%b %d, %Y %H:%M:%S",
    "%b %d, %Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-only formats, tried in order (midnight)
const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%d %b %Y", "%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// The `span` immediately following the first `label_sel` element whose
/// text contains `label` (CSS `label + span` with a text condition).
fn labelled_value<'a>(entry: ElementRef<'a>, label_sel: &Selector, label: &str) -> Option<ElementRef<'a>> {
    entry
        .select(label_sel)
        .find(|el| text_of(*el).contains(label))?
        .next_siblings()
        .find_map(ElementRef::wrap)
        .filter(|next| next.value().name() == "span")
}

/// Result id from a detail href: last path segment, if numeric.
pub fn parse_result_id(href: &str) -> Option<i64> {
    href.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

/// Core count from a line like "(16 cores)". `None` unless the line
/// carries the core marker and a clean integer.
pub fn parse_cores(line: &str) -> Option<i32> {
    let inner = line.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace());
    if !inner.contains(CORE_MARKER) {
        return None;
    }
    inner
        .trim_end_matches("cores")
        .trim_end_matches(CORE_MARKER)
        .trim()
        .parse()
        .ok()
}

/// Score text with thousands separators. Accepted only if every remaining
/// character is a decimal digit, so placeholders like "N/A" become `None`.
pub fn parse_score(text: &str) -> Option<i32> {
    let digits: String = text.trim().chars().filter(|&c| c != ',').collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Permissive upload-time parser.
///
/// Only the first line is considered (an uploader handle may follow on a
/// later line). Unparseable input yields `None`.
pub fn parse_upload_time(text: &str) -> Option<NaiveDateTime> {
    let first = text.trim().lines().next()?.trim();
    if first.is_empty() {
        return None;
    }
    let normalized = first.split_whitespace().collect::<Vec<_>>().join(" ");
    let s = normalized.as_str();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse one listing entry. Never fails; missing parts become `None`.
pub fn parse_entry(entry: ElementRef<'_>) -> BenchmarkResult {
    let link = entry.select(&DETAIL_LINK).next();
    let href = link.and_then(|a| a.value().attr("href"));

    let model_text = entry.select(&MODEL_BLOCK).next().map(text_of).unwrap_or_default();
    // Positional: line 0 model, 1 frequency, 2 core count. Interior blank
    // lines keep their slot.
    let model_lines: Vec<&str> = model_text.trim().lines().map(str::trim).collect();

    let uploaded = labelled_value(entry, &SUBTITLE, "Uploaded")
        .and_then(|el| parse_upload_time(&text_of(el)));
    let platform = labelled_value(entry, &SUBTITLE, "Platform").and_then(|el| non_empty(&text_of(el)));
    let single_core_score = labelled_value(entry, &SCORE_SUBTITLE, "Single-Core Score")
        .and_then(|el| parse_score(&text_of(el)));
    let multi_core_score = labelled_value(entry, &SCORE_SUBTITLE, "Multi-Core Score")
        .and_then(|el| parse_score(&text_of(el)));

    BenchmarkResult {
        cpu_id: href.and_then(parse_result_id),
        system: link.and_then(|a| non_empty(&text_of(a))),
        cpu_model: model_lines.first().and_then(|s| non_empty(s)),
        frequency: model_lines.get(1).and_then(|s| non_empty(s)),
        cores: model_lines.get(2).and_then(|l| parse_cores(l)),
        uploaded,
        platform,
        single_core_score,
        multi_core_score,
        url: href.map(|h| format!("{SITE_ROOT}{h}")),
    }
}

/// Parse every entry of a search results page, in page order.
///
/// A page without the results region (layout change, error page) yields
/// no rows rather than an error.
pub fn parse_results_page(html: &str) -> Vec<BenchmarkResult> {
    let document = Html::parse_document(html);
    let Some(region) = document.select(&RESULTS_REGION).next() else {
        log::warn!("results region not found in page");
        return Vec::new();
    };
    region.select(&ENTRY).map(parse_entry).collect()
}

/// Total page count from the pagination control.
///
/// No pagination block, or no numeric page links, means a single page.
pub fn parse_total_pages(html: &str) -> u32 {
    let document = Html::parse_document(html);
    let Some(pagination) = document.select(&PAGINATION).next() else {
        return 1;
    };
    pagination
        .select(&PAGE_LINK)
        .filter_map(|a| {
            let t = text_of(a);
            let t = t.trim();
            if !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) {
                t.parse::<u32>().ok()
            } else {
                None
            }
        })
        .max()
        .unwrap_or(1)
}
