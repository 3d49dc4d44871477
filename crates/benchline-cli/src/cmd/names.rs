//! Names subcommand - discover CPU model names

use anyhow::Result;
use benchline_core::{SharedProgress, fmt_num};
use benchline_geekbench::{HttpSource, NamesConfig, run_discovery};
use benchline_store::DuckDbStore;
use clap::Args;

use crate::cmd::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct NamesArgs {
    /// Pages of latest results to walk
    #[arg(short, long)]
    pub pages: Option<u32>,
}

pub fn run(args: NamesArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let names_config = NamesConfig {
        latest_pages: args.pages.unwrap_or(config.sync.latest_pages),
    };
    let source = HttpSource::new(config.source_config());
    let store = DuckDbStore::new(config.store_config())?;

    log::info!("Discovering model names");
    log::info!("  Latest pages: {}", names_config.latest_pages);
    log::info!("  Store: {}", store.config().path.display());

    let pb = progress.stage_line("names");
    let summary = run_discovery(&names_config, &source, &store, &pb)?;

    print_summary(
        "Names",
        &[
            ("Discovered", fmt_num(summary.discovered)),
            ("New", fmt_num(summary.inserted)),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );
    Ok(())
}
