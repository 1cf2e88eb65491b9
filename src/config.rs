use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use url::Url;

use crate::cli::Cli;
use crate::error::{AppError, Result};

pub const DEFAULT_API_URL: &str =
    "https://webapi.sporttery.cn/gateway/lottery/getHistoryPageListV1.qry";

/// Super Lotto on the sporttery gateway.
pub const GAME_NO: u32 = 85;
/// 0 selects all provinces.
pub const PROVINCE_ID: u32 = 0;
pub const PAGE_SIZE: u32 = 30;
/// Only verified draw results.
pub const IS_VERIFY: u32 = 1;

pub const DEFAULT_PAGE_DELAY_MS: u64 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Stem of the dated store file name.
pub const STORE_FILE_STEM: &str = "大乐透历史数据";
pub const LOG_FILE_PREFIX: &str = "dlt_crawler";

/// Settings for one crawl cycle, resolved from the CLI.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub api_url: Url,
    pub data_dir: PathBuf,
    /// Spreadsheet read for the watermark and rewritten at the end.
    pub store_path: PathBuf,
    pub page_delay: Duration,
    pub timeout: Duration,
}

impl CrawlerConfig {
    /// Resolve the CLI into settings; `today` keys the store file name.
    pub fn from_cli(cli: &Cli, today: NaiveDate) -> Result<Self> {
        let api_url = Url::parse(&cli.api_url)
            .map_err(|e| AppError::Config(format!("invalid API URL {:?}: {e}", cli.api_url)))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "API URL must be http(s), got {:?}",
                api_url.scheme()
            )));
        }
        if cli.timeout_secs == 0 {
            return Err(AppError::Config("timeout must be at least 1 second".to_string()));
        }

        let data_dir = PathBuf::from(&cli.data_dir);
        let store_path = match &cli.store_file {
            Some(file) => PathBuf::from(file),
            None => dated_store_path(&data_dir, today),
        };

        Ok(Self {
            api_url,
            data_dir,
            store_path,
            page_delay: Duration::from_millis(cli.page_delay_ms),
            timeout: Duration::from_secs(cli.timeout_secs),
        })
    }
}

/// `<data_dir>/大乐透历史数据_YYYYMMDD.xlsx`
///
/// Keyed by the run date, so a run on a new day does not see the previous
/// day's file and starts a full-history fetch.
pub fn dated_store_path(data_dir: &Path, date: NaiveDate) -> PathBuf {
    data_dir.join(format!("{STORE_FILE_STEM}_{}.xlsx", date.format("%Y%m%d")))
}
