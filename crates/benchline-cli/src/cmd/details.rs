//! Details subcommand - record one result detail page per model

use anyhow::Result;
use benchline_core::{SharedProgress, fmt_num};
use benchline_geekbench::{HttpSource, sync_details};
use benchline_store::{DuckDbStore, ResultStore};
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::cmd::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct DetailsArgs {
    /// Visit at most this many models
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Print each model's codename instead of fetching details
    #[arg(long)]
    pub list: bool,
}

fn codename_table(rows: &[(String, Option<String>)]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(["Model", "Codename"].map(|h| Cell::new(h).fg(Color::Cyan)));
    for (model, codename) in rows {
        table.add_row(vec![model.clone(), codename.clone().unwrap_or_default()]);
    }
    table
}

pub fn run(args: DetailsArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let store = DuckDbStore::new(config.store_config())?;

    if args.list {
        let rows = store.read_codenames()?;
        println!("{}", codename_table(&rows));
        return Ok(());
    }

    let source = HttpSource::new(config.source_config());
    log::info!("Fetching result details");
    log::info!("  Detail URL: {}", source.config().detail_url);
    if let Some(limit) = args.limit {
        log::info!("  Limit: {limit} models");
    }

    let pb = progress.stage_line("details");
    let summary = sync_details(&source, &store, args.limit, &pb)?;

    print_summary(
        "Details",
        &[
            ("Pending", fmt_num(summary.pending)),
            ("Stored", fmt_num(summary.stored)),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );
    Ok(())
}
