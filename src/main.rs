//! # DLT Crawler
//!
//! Keeps a spreadsheet of Super Lotto (大乐透) draw results up to date by
//! crawling the paginated history API of the China Sports Lottery gateway.
//!
//! ## Usage
//!
//! ```sh
//! dlt_crawler
//! ```
//!
//! ## Architecture
//!
//! One run is a single sequential cycle:
//! 1. **Watermark**: read the newest draw number from today's store, if any
//! 2. **Crawl**: fetch pages newest-first until a stored draw shows up
//! 3. **Merge**: prepend the new draws to the stored ones and save the store
//!
//! Every failure is logged; the process itself always exits normally.

use std::path::Path;

use chrono::Local;
use clap::Parser;
use tracing::{error, info};

mod cli;
mod config;
mod crawler;
mod error;
mod fetcher;
mod logging;
mod models;
mod parser;
mod runner;
mod store;
mod utils;

use cli::Cli;
use config::CrawlerConfig;
use error::Result;
use fetcher::HttpPageSource;
use runner::{RunOutcome, run_cycle};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let _log_guard = match logging::init(Path::new(&args.log_dir)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            logging::init_console();
            error!(error = %e, "Logging to file disabled");
            None
        }
    };

    if let Err(e) = run(&args).await {
        error!(error = %e, "Crawler run failed");
    }
}

async fn run(args: &Cli) -> Result<()> {
    let start_time = std::time::Instant::now();
    info!("Starting Super Lotto history crawl");

    let cfg = CrawlerConfig::from_cli(args, Local::now().date_naive())?;
    ensure_writable_dir(&cfg.data_dir).await?;
    if let Some(parent) = cfg.store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_writable_dir(parent).await?;
    }

    let source = HttpPageSource::new(cfg.api_url.as_str(), cfg.timeout)?;
    info!(
        api_url = source.base_url(),
        store = %cfg.store_path.display(),
        "Configuration loaded"
    );

    match run_cycle(source, &cfg.store_path, cfg.page_delay).await? {
        RunOutcome::NoNewData { stop } => {
            info!(%stop, "No new data to update");
        }
        RunOutcome::Updated {
            path,
            new_records,
            total_records,
            stop,
        } => {
            info!(
                new_records,
                total_records,
                %stop,
                "Data saved to {}",
                path.display()
            );
        }
    }

    info!(elapsed_ms = start_time.elapsed().as_millis(), "Crawl complete");
    Ok(())
}
