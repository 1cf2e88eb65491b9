//! Paginated access to the draw history API.
//!
//! # Architecture
//!
//! - [`PageSource`]: trait for anything that can deliver one page of raw
//!   entries; the crawl loop is generic over it
//! - [`HttpPageSource`]: the real implementation backed by `reqwest`
//!
//! One call is one HTTP request: there is no retry here, a failed page ends
//! the crawl.

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::{GAME_NO, IS_VERIFY, PAGE_SIZE, PROVINCE_ID};
use crate::error::FetchError;
use crate::models::{HistoryResponse, RawPage};
use crate::utils::truncate_for_log;

/// Source of history pages.
pub trait PageSource {
    /// Fetch page `page_no` (1-based).
    ///
    /// An empty page means there is no more data. A missing `value.list`
    /// field, a transport failure or a malformed body is a [`FetchError`].
    async fn fetch_page(&self, page_no: u32) -> Result<RawPage, FetchError>;
}

/// [`PageSource`] talking to the sporttery gateway.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    base_url: String,
}

impl HttpPageSource {
    /// Build a source with the given per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dlt_crawler/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl PageSource for HttpPageSource {
    #[instrument(level = "debug", skip(self), fields(url = %self.base_url))]
    async fn fetch_page(&self, page_no: u32) -> Result<RawPage, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(&self.base_url)
            .query(&query_params(page_no))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        debug!(
            page_no,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Received history page"
        );

        decode_page(&body).inspect_err(|e| {
            warn!(
                page_no,
                error = %e,
                body_preview = %truncate_for_log(&String::from_utf8_lossy(&body), 300),
                "Could not decode history page"
            );
        })
    }
}

/// Query string of one page request.
pub fn query_params(page_no: u32) -> [(&'static str, String); 5] {
    [
        ("gameNo", GAME_NO.to_string()),
        ("provinceId", PROVINCE_ID.to_string()),
        ("pageSize", PAGE_SIZE.to_string()),
        ("isVerify", IS_VERIFY.to_string()),
        ("pageNo", page_no.to_string()),
    ]
}

/// Extract `value.list` from a response body.
///
/// `null` and `[]` both yield an empty page; an absent field is an error.
pub fn decode_page(body: &[u8]) -> Result<RawPage, FetchError> {
    let response: HistoryResponse = serde_json::from_slice(body)?;
    match response.value.and_then(|v| v.list) {
        Some(list) => Ok(list.unwrap_or_default()),
        None => Err(FetchError::MissingList),
    }
}
