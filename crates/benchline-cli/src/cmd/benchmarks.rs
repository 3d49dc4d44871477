//! Benchmarks subcommand - load the processor benchmark chart

use anyhow::Result;
use benchline_core::fmt_num;
use benchline_geekbench::{HttpSource, sync_benchmarks};
use benchline_store::{BenchmarkRow, DuckDbStore, ResultStore};
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::cmd::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct BenchmarksArgs {
    /// Print the stored chart instead of fetching it
    #[arg(long)]
    pub list: bool,
}

fn chart_table(rows: &[BenchmarkRow]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(
            ["Model", "Frequency", "Cores", "Single", "Multi"].map(|h| Cell::new(h).fg(Color::Cyan)),
        );
    for r in rows {
        table.add_row(vec![
            r.cpu_model.clone(),
            r.frequency.clone().unwrap_or_default(),
            r.cores.map(|c| c.to_string()).unwrap_or_default(),
            r.single_core_score.map(|s| s.to_string()).unwrap_or_default(),
            r.multi_core_score.map(|s| s.to_string()).unwrap_or_default(),
        ]);
    }
    table
}

pub fn run(args: BenchmarksArgs, config: &Config) -> Result<()> {
    let store = DuckDbStore::new(config.store_config())?;

    if args.list {
        let rows = store.read_benchmarks()?;
        println!("{}", chart_table(&rows));
        eprintln!("{} processors", fmt_num(rows.len()));
        return Ok(());
    }

    let source = HttpSource::new(config.source_config());
    log::info!("Loading benchmark chart from {}", source.config().benchmarks_url);
    let summary = sync_benchmarks(&source, &store)?;

    print_summary(
        "Benchmarks",
        &[
            ("Processors", fmt_num(summary.rows)),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );
    Ok(())
}
