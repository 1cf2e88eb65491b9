//! Error types for every stage of a crawl cycle.
//!
//! Each failure domain has its own enum so callers can decide locally how to
//! recover:
//!
//! | Error | Raised by | Recovery |
//! |-------|-----------|----------|
//! | [`FetchError`] | page fetcher | ends pagination, keeps accumulated records |
//! | [`ParseError`] | record parser | the offending record is skipped |
//! | [`StoreReadError`] | store reader | treated as "no watermark" |
//! | [`WriteError`] | store writer | surfaced to the top level |
//!
//! [`AppError`] is the union returned by the runner and logged once in `main`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("response is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("response has no `value.list` field")]
    MissingList,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("entry does not match the draw schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("draw number {0:?} is not a non-negative integer")]
    InvalidDrawNumber(String),

    #[error("draw result {result:?} has {found} tokens, at least 7 required")]
    TooFewTokens { result: String, found: usize },

    #[error("prize tier list has {found} entries, at least 2 required")]
    MissingPrizeTiers { found: usize },
}

#[derive(Debug, Error)]
pub enum StoreReadError {
    #[error("cannot read workbook: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("workbook has no worksheet")]
    EmptyWorkbook,

    #[error("worksheet has no `{0}` column")]
    MissingColumn(&'static str),

    #[error("stored draw number {0:?} is not numeric")]
    InvalidDrawNumber(String),
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("prior store exists but cannot be read: {0}")]
    PriorUnreadable(#[source] StoreReadError),

    #[error("prior store columns {found:?} do not match the draw history layout")]
    SchemaMismatch { found: Vec<String> },

    #[error("spreadsheet encoding failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("cannot persist store: {0}")]
    Write(#[from] WriteError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
