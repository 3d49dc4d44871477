//! Sync subcommand - scrape new results for every tracked model

use anyhow::Result;
use benchline_core::{SharedProgress, fmt_num};
use benchline_geekbench::{HttpSource, SyncConfig, SyncMode};
use benchline_store::DuckDbStore;
use clap::Args;

use crate::cmd::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Scrape every page, ignoring stored upload times
    #[arg(long, conflicts_with = "max_pages")]
    pub full: bool,

    /// Scrape at most N pages per model, ignoring stored upload times
    #[arg(short, long)]
    pub max_pages: Option<u32>,

    /// Delete each model's rows since its watermark before appending
    #[arg(long)]
    pub delete_before_insert: bool,

    /// Remove duplicates after every N models (0 = only at the end)
    #[arg(long)]
    pub dedup_every: Option<usize>,
}

impl SyncArgs {
    fn mode(&self, config: &Config) -> SyncMode {
        if self.full {
            return SyncMode::Full;
        }
        match self.max_pages.or(config.sync.max_pages) {
            Some(n) if n > 0 => SyncMode::Capped(n),
            _ => SyncMode::Incremental,
        }
    }
}

pub fn run(args: SyncArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let sync_config = SyncConfig {
        mode: args.mode(config),
        lookback_days: config.sync.lookback_days,
        dedup_every: args.dedup_every.unwrap_or(config.sync.dedup_every),
        delete_before_insert: args.delete_before_insert,
    };
    let source = HttpSource::new(config.source_config());
    let store = DuckDbStore::new(config.store_config())?;

    log::info!("Syncing Geekbench results");
    log::info!("  Mode: {:?}", sync_config.mode);
    log::info!("  Store: {}", store.config().path.display());

    let now = chrono::Utc::now().naive_utc();
    let pb = progress.models_bar("sync", 0);
    let summary = benchline_geekbench::run(&sync_config, &source, &store, now, &pb)?;

    print_summary(
        "Sync",
        &[
            ("Models", fmt_num(summary.models)),
            (
                "Rows",
                format!(
                    "{} scraped, {} appended",
                    fmt_num(summary.rows_scraped),
                    fmt_num(summary.rows_appended)
                ),
            ),
            ("Duplicates removed", fmt_num(summary.duplicates_removed)),
            (
                "New entries",
                format!(
                    "{} models, {} systems",
                    summary.new_models, summary.new_systems
                ),
            ),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );
    Ok(())
}
