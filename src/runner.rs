//! One crawl-and-merge cycle: watermark, crawl, write.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use crate::crawler::{Crawler, StopReason};
use crate::error::Result;
use crate::fetcher::PageSource;
use crate::store::watermark::read_watermark;
use crate::store::writer::write_store;

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing newer than the store was found; the store was not touched.
    NoNewData { stop: StopReason },
    /// The store was rewritten.
    Updated {
        path: PathBuf,
        new_records: usize,
        total_records: usize,
        stop: StopReason,
    },
}

/// Run one cycle against the store at `store_path`.
///
/// An unreadable store only costs the watermark (a full crawl follows); a
/// failed fetch only shortens the crawl. The one error surfaced is a failed
/// write.
#[instrument(level = "info", skip(source), fields(store = %store_path.display()))]
pub async fn run_cycle<S: PageSource>(
    source: S,
    store_path: &Path,
    page_delay: Duration,
) -> Result<RunOutcome> {
    let t0 = Instant::now();

    let watermark = match read_watermark(store_path) {
        Ok(w) => w,
        Err(e) => {
            warn!(error = %e, "Could not read existing store; fetching full history");
            None
        }
    };
    match &watermark {
        Some(w) => info!(watermark = %w, "Resuming after stored draw"),
        None => info!("No stored draws; fetching full history"),
    }

    let report = Crawler::new(source, page_delay)
        .crawl(watermark.as_ref())
        .await;

    info!(
        pages_fetched = report.pages_fetched,
        skipped = report.skipped,
        "Crawl collected {} new draws",
        report.records.len()
    );
    if report.records.is_empty() {
        info!(stop = %report.stop, "No new data to store");
        return Ok(RunOutcome::NoNewData { stop: report.stop });
    }

    let summary = write_store(store_path, &report.records, watermark.is_some())?;
    let total_records = summary.total_rows();
    info!(
        new_records = summary.new_rows,
        total_records,
        replaced_rows = summary.replaced_rows,
        elapsed_ms = t0.elapsed().as_millis(),
        "Store updated"
    );

    Ok(RunOutcome::Updated {
        path: summary.path,
        new_records: summary.new_rows,
        total_records,
        stop: report.stop,
    })
}
