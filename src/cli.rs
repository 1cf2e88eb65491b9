//! Command-line interface definitions.
//!
//! The crawler is meant to run with no arguments at all; every option below
//! only overrides a default and can also be given through an environment
//! variable.

use clap::Parser;

use crate::config::{DEFAULT_API_URL, DEFAULT_PAGE_DELAY_MS, DEFAULT_TIMEOUT_SECS};

/// Command-line arguments for the Super Lotto history crawler.
///
/// # Examples
///
/// ```sh
/// # Default run: ./data/大乐透历史数据_<today>.xlsx, logs in ./logs
/// dlt_crawler
///
/// # Keep one store across days
/// dlt_crawler --store-file ./data/dlt_history.xlsx
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the dated spreadsheet stores
    #[arg(short, long, env = "DLT_DATA_DIR", default_value = "data")]
    pub data_dir: String,

    /// Directory for the daily log files
    #[arg(short, long, env = "DLT_LOG_DIR", default_value = "logs")]
    pub log_dir: String,

    /// Use this store file instead of the dated one in the data directory
    #[arg(short, long, env = "DLT_STORE_FILE")]
    pub store_file: Option<String>,

    /// History list endpoint
    #[arg(long, env = "DLT_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Pause between two page requests, in milliseconds
    #[arg(long, env = "DLT_PAGE_DELAY_MS", default_value_t = DEFAULT_PAGE_DELAY_MS)]
    pub page_delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, env = "DLT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}
