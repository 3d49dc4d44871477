//! Scrape subcommand - preview one model's listing without storing it

use anyhow::{Context, Result};
use benchline_geekbench::aggregate::{ScrapeMode, scrape};
use benchline_geekbench::{BenchmarkResult, HttpSource, Paginator};
use chrono::NaiveDate;
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// CPU model search query
    pub model: String,

    /// Pages to scrape (0 = all pages)
    #[arg(short, long, default_value_t = 1)]
    pub max_pages: u32,

    /// Walk pages until results older than this date (YYYY-MM-DD); overrides --max-pages
    #[arg(short, long, value_parser = parse_date)]
    pub since: Option<NaiveDate>,

    /// Print JSON lines instead of a table
    #[arg(long)]
    pub json: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("Invalid date format: {e}"))
}

impl ScrapeArgs {
    fn mode(&self) -> ScrapeMode {
        match self.since.and_then(|d| d.and_hms_opt(0, 0, 0)) {
            Some(cutoff) => ScrapeMode::Incremental(cutoff),
            None => ScrapeMode::Capped(self.max_pages),
        }
    }
}

fn opt<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn results_table(rows: &[BenchmarkResult]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(
            [
                "ID", "System", "Model", "Frequency", "Cores", "Uploaded", "Platform", "Single",
                "Multi",
            ]
            .map(|h| Cell::new(h).fg(Color::Cyan)),
        );
    for r in rows {
        table.add_row(vec![
            opt(&r.cpu_id),
            opt(&r.system),
            opt(&r.cpu_model),
            opt(&r.frequency),
            opt(&r.cores),
            opt(&r.uploaded),
            opt(&r.platform),
            opt(&r.single_core_score),
            opt(&r.multi_core_score),
        ]);
    }
    table
}

pub fn run(args: ScrapeArgs, config: &Config) -> Result<()> {
    let source = HttpSource::new(config.source_config());
    let paginator = Paginator::new(&source, args.model.as_str());
    let mode = args.mode();

    log::info!("Scraping {:?} ({mode:?})", args.model);
    let rows = scrape(&paginator, mode).with_context(|| format!("failed to scrape {}", args.model))?;
    log::info!(
        "{} rows from {} pages",
        rows.len(),
        paginator.fetches()
    );

    if args.json {
        for row in &rows {
            println!("{}", serde_json::to_string(row)?);
        }
    } else {
        println!("{}", results_table(&rows));
    }
    Ok(())
}
