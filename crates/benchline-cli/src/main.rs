//! benchline - Geekbench CPU benchmark listings into DuckDB
//!
//! Discovers CPU model names, scrapes Geekbench browser search results per
//! model and incrementally loads them into a local DuckDB store.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "benchline")]
#[command(about = "Incremental Geekbench CPU benchmark scraper")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./benchline.toml or ~/.config/benchline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Create the store schema
    Init,
    /// Discover CPU model names into the model table
    Names(cmd::names::NamesArgs),
    /// Scrape new results for every tracked model
    Sync(cmd::sync::SyncArgs),
    /// Scrape one model and print the results without storing them
    Scrape(cmd::scrape::ScrapeArgs),
    /// Load the processor benchmark chart
    Benchmarks(cmd::benchmarks::BenchmarksArgs),
    /// Record one result detail page for every model still lacking one
    Details(cmd::details::DetailsArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(benchline_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug; progress bars show activity
    //   non-TTY: info unless --debug; logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    benchline_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Init => cmd::init::run(&config),
        Command::Names(args) => cmd::names::run(args, &config, &progress),
        Command::Sync(args) => cmd::sync::run(args, &config, &progress),
        Command::Scrape(args) => cmd::scrape::run(args, &config),
        Command::Benchmarks(args) => cmd::benchmarks::run(args, &config),
        Command::Details(args) => cmd::details::run(args, &config, &progress),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec!["Store", &config.store.path.display().to_string()]);
            table.add_row(vec!["Search URL", &config.source.search_url]);
            table.add_row(vec!["Latest URL", &config.source.latest_url]);
            table.add_row(vec!["Benchmarks URL", &config.source.benchmarks_url]);
            table.add_row(vec!["Detail URL", &config.source.detail_url]);
            table.add_row(vec!["User-Agent", &config.source.user_agent]);
            table.add_row(vec![
                "Lookback",
                &format!("{} days", config.sync.lookback_days),
            ]);
            table.add_row(vec![
                "Max pages",
                &match config.sync.max_pages {
                    Some(n) if n > 0 => n.to_string(),
                    _ => "incremental".to_string(),
                },
            ]);
            table.add_row(vec![
                "Dedup every",
                &format!("{} models", config.sync.dedup_every),
            ]);
            table.add_row(vec![
                "Latest pages",
                &config.sync.latest_pages.to_string(),
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
