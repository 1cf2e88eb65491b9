//! Incremental crawl over the paginated history.
//!
//! Pages arrive newest-first. The crawler walks them from page 1 and stops as
//! soon as it meets a draw at or below the watermark, because everything
//! after that point is already in the store.
//!
//! ```text
//! Start ─► Fetch ──(error / empty page)──────────────► Done
//!            │
//!            ▼
//!          Scan ──(draw <= watermark)────────────────► Done
//!            │
//!            └─(page finished)─► sleep ─► Fetch (page + 1)
//! ```

use std::fmt;
use std::time::Duration;

use itertools::Itertools;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::fetcher::PageSource;
use crate::models::{DrawNumber, DrawRecord};
use crate::parser::{parse_draw_result, peek_draw_number};

/// Why the crawl ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A draw at or below the watermark was reached.
    ReachedWatermark,
    /// A page came back empty.
    Exhausted,
    /// A page could not be fetched; the message is the fetch error.
    FetchFailed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::ReachedWatermark => f.write_str("reached stored draws"),
            StopReason::Exhausted => f.write_str("no more pages"),
            StopReason::FetchFailed(e) => write!(f, "fetch failed: {e}"),
        }
    }
}

/// Result of one crawl.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// New records, newest-first.
    pub records: Vec<DrawRecord>,
    pub pages_fetched: u32,
    /// Entries dropped because they did not parse.
    pub skipped: usize,
    pub stop: StopReason,
}

/// Walks pages of a [`PageSource`], one at a time.
pub struct Crawler<S> {
    source: S,
    page_delay: Duration,
}

impl<S: PageSource> Crawler<S> {
    /// `page_delay` is slept between two consecutive page requests.
    pub fn new(source: S, page_delay: Duration) -> Self {
        Self { source, page_delay }
    }

    /// Collect every draw newer than `watermark` (all draws if `None`).
    #[instrument(level = "info", skip(self, watermark), fields(watermark = ?watermark.map(DrawNumber::value)))]
    pub async fn crawl(&self, watermark: Option<&DrawNumber>) -> CrawlReport {
        let is_known = |n: &DrawNumber| watermark.is_some_and(|w| n <= w);

        let mut records = Vec::new();
        let mut skipped = 0usize;
        let mut page_no = 1u32;
        let mut pages_fetched = 0u32;

        let stop = loop {
            info!(page_no, "Fetching history page");
            let page = match self.source.fetch_page(page_no).await {
                Ok(page) => page,
                Err(e) => {
                    error!(page_no, error = %e, "Failed to fetch history page");
                    break StopReason::FetchFailed(e.to_string());
                }
            };
            pages_fetched += 1;

            if page.is_empty() {
                debug!(page_no, "Empty page");
                break StopReason::Exhausted;
            }

            let mut reached_known = false;
            for (index, entry) in page.iter().enumerate() {
                let draw_number = match peek_draw_number(entry) {
                    Ok(n) => n,
                    Err(e) => {
                        warn!(page_no, index, error = %e, "Entry without a usable draw number; skipping");
                        skipped += 1;
                        continue;
                    }
                };
                if is_known(&draw_number) {
                    debug!(page_no, index, %draw_number, "Reached stored draw");
                    reached_known = true;
                    break;
                }
                match parse_draw_result(entry) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(page_no, index, %draw_number, error = %e, "Could not parse draw; skipping");
                        skipped += 1;
                    }
                }
            }
            if reached_known {
                break StopReason::ReachedWatermark;
            }

            let last_known = page
                .last()
                .and_then(|entry| peek_draw_number(entry).ok())
                .is_some_and(|n| is_known(&n));
            if last_known {
                break StopReason::ReachedWatermark;
            }

            page_no += 1;
            if !self.page_delay.is_zero() {
                sleep(self.page_delay).await;
            }
        };

        // A draw published mid-crawl shifts page boundaries and repeats an entry.
        let fetched = records.len();
        let records: Vec<DrawRecord> = records
            .into_iter()
            .unique_by(|r| r.draw_number.value())
            .collect();
        if records.len() < fetched {
            warn!(duplicates = fetched - records.len(), "Dropped repeated draws");
        }

        info!(
            new_records = records.len(),
            pages_fetched,
            skipped,
            stop = %stop,
            "Crawl finished"
        );
        CrawlReport {
            records,
            pages_fetched,
            skipped,
            stop,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::RawPage;
    use crate::parser::tests::sample_entry;
    use serde_json::json;
    use std::sync::Mutex;

    /// In-memory page source; page `n` is `pages[n - 1]`, past the end is empty.
    pub(crate) struct FakeSource {
        pages: Vec<Result<RawPage, String>>,
        pub(crate) requested: Mutex<Vec<u32>>,
    }

    impl FakeSource {
        pub(crate) fn new(pages: Vec<Result<RawPage, String>>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }

        /// Pages of `page_size` entries covering `newest..=oldest`, descending.
        pub(crate) fn history(newest: u64, oldest: u64, page_size: usize) -> Self {
            let entries: Vec<_> = (oldest..=newest).rev().map(sample_entry).collect();
            Self::new(entries.chunks(page_size).map(|c| Ok(c.to_vec())).collect())
        }

        pub(crate) fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl PageSource for FakeSource {
        async fn fetch_page(&self, page_no: u32) -> Result<RawPage, FetchError> {
            self.requested.lock().unwrap().push(page_no);
            match self.pages.get(page_no as usize - 1) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(_)) => Err(FetchError::MissingList),
                None => Ok(Vec::new()),
            }
        }
    }

    fn numbers(report: &CrawlReport) -> Vec<u64> {
        report.records.iter().map(|r| r.draw_number.value()).collect()
    }

    fn crawler(source: FakeSource) -> Crawler<FakeSource> {
        Crawler::new(source, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_full_crawl_without_watermark() {
        let crawler = crawler(FakeSource::history(70, 1, 30));
        let report = crawler.crawl(None).await;

        assert_eq!(report.records.len(), 70);
        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(report.pages_fetched, 4);
        assert_eq!(crawler.source.requested(), vec![1, 2, 3, 4]);
        let got = numbers(&report);
        assert!(got.windows(2).all(|w| w[0] > w[1]), "newest-first order");
    }

    #[tokio::test]
    async fn test_stops_at_watermark_within_page() {
        // Page 1: W+3, W+2, W+1, W, W-1; page 2 must never be requested.
        let w = 24100;
        let source = FakeSource::new(vec![
            Ok((w - 1..=w + 3).rev().map(sample_entry).collect()),
            Ok((w - 10..w - 1).rev().map(sample_entry).collect()),
        ]);
        let crawler = crawler(source);
        let report = crawler.crawl(Some(&DrawNumber::from(w))).await;

        assert_eq!(numbers(&report), vec![w + 3, w + 2, w + 1]);
        assert_eq!(report.stop, StopReason::ReachedWatermark);
        assert_eq!(crawler.source.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_watermark_on_page_boundary() {
        // 30 new draws fill page 1 exactly; the watermark opens page 2.
        let crawler = crawler(FakeSource::history(130, 1, 30));
        let report = crawler.crawl(Some(&DrawNumber::from(100))).await;

        assert_eq!(report.records.len(), 30);
        assert_eq!(numbers(&report).last(), Some(&101));
        assert_eq!(crawler.source.requested(), vec![1, 2]);
        assert_eq!(report.stop, StopReason::ReachedWatermark);
    }

    #[tokio::test]
    async fn test_nothing_new() {
        let crawler = crawler(FakeSource::history(50, 1, 30));
        let report = crawler.crawl(Some(&DrawNumber::from(50))).await;

        assert!(report.records.is_empty());
        assert_eq!(report.stop, StopReason::ReachedWatermark);
        assert_eq!(crawler.source.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_watermark_compares_numerically() {
        // Lexically "9" > "10", numerically it is older.
        let source = FakeSource::new(vec![Ok(vec![sample_entry(10), sample_entry(9)])]);
        let crawler = crawler(source);
        let report = crawler.crawl(Some(&"9".parse().unwrap())).await;

        assert_eq!(numbers(&report), vec![10]);
    }

    #[tokio::test]
    async fn test_malformed_entry_is_skipped() {
        let mut broken = sample_entry(48);
        broken["lotteryDrawResult"] = json!("01 02 03");
        let page: RawPage = vec![
            sample_entry(50),
            sample_entry(49),
            broken,
            json!({ "lotteryDrawNum": null }),
            sample_entry(47),
        ];
        let crawler = crawler(FakeSource::new(vec![Ok(page)]));
        let report = crawler.crawl(None).await;

        assert_eq!(numbers(&report), vec![50, 49, 47]);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.stop, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_earlier_pages() {
        let source = FakeSource::new(vec![
            Ok((91..=100).rev().map(sample_entry).collect()),
            Err("boom".to_string()),
            Ok((81..=90).rev().map(sample_entry).collect()),
        ]);
        let crawler = crawler(source);
        let report = crawler.crawl(None).await;

        assert_eq!(report.records.len(), 10);
        assert!(matches!(report.stop, StopReason::FetchFailed(_)));
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(crawler.source.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_repeated_entry_across_pages_is_kept_once() {
        let source = FakeSource::new(vec![
            Ok((18..=20).rev().map(sample_entry).collect()),
            Ok((16..=18).rev().map(sample_entry).collect()),
        ]);
        let crawler = crawler(source);
        let report = crawler.crawl(None).await;

        assert_eq!(numbers(&report), vec![20, 19, 18, 17, 16]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_between_pages() {
        // Three pages, the watermark sits on the third.
        let crawler = Crawler::new(FakeSource::history(90, 1, 30), Duration::from_secs(1));
        let start = tokio::time::Instant::now();
        let report = crawler.crawl(Some(&DrawNumber::from(5))).await;

        assert_eq!(crawler.source.requested(), vec![1, 2, 3]);
        assert_eq!(report.stop, StopReason::ReachedWatermark);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_after_last_page() {
        let crawler = Crawler::new(FakeSource::history(10, 1, 30), Duration::from_secs(1));
        let start = tokio::time::Instant::now();
        let report = crawler.crawl(None).await;

        // Page 1 holds everything, page 2 is empty and ends the crawl.
        assert_eq!(report.pages_fetched, 2);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1) && elapsed < Duration::from_secs(2), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let crawler = crawler(FakeSource::new(vec![]));
        let report = crawler.crawl(None).await;

        assert!(report.records.is_empty());
        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(report.pages_fetched, 1);
    }
}
