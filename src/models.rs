//! Data models for draw results, both as delivered by the remote API and as
//! stored in the spreadsheet.
//!
//! - [`RawDrawEntry`] / [`RawPrizeLevel`]: the typed view of one entry of the
//!   `value.list` array, used to schema-check the untyped JSON of a page
//! - [`DrawNumber`]: the draw identifier, compared numerically
//! - [`NumericText`]: an amount or count, kept as sent
//! - [`DrawRecord`]: one draw, ready to become a store row
//!
//! The remote API uses camelCase keys, mapped with `#[serde(rename_all)]`.

use serde::Deserialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Entries of one page, newest-first, exactly as returned by the API.
pub type RawPage = Vec<serde_json::Value>;

/// Envelope of a list response: `{ "value": { "list": [...] } }`.
///
/// `list` is optional so that an explicit `null` can be told apart from a
/// missing field.
#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub value: Option<HistoryValue>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryValue {
    #[serde(default, deserialize_with = "deserialize_present")]
    pub list: Option<Option<RawPage>>,
}

/// Distinguishes `"list": null` (`Some(None)`) from an absent key (`None`).
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<RawPage>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<RawPage>::deserialize(deserializer).map(Some)
}

/// A JSON scalar that may be sent either as a number or as text.
///
/// Amounts in the history API are usually strings with thousands separators
/// (`"1,064,549,484.52"`), but numbers are accepted as well. Placeholders
/// such as `""`, `"---"` or `null` are kept as they are.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericText {
    Number(serde_json::Number),
    Text(String),
    Null,
}

impl NumericText {
    /// Text as sent; empty for `null`.
    pub fn literal(&self) -> String {
        match self {
            NumericText::Number(n) => n.to_string(),
            NumericText::Text(s) => s.clone(),
            NumericText::Null => String::new(),
        }
    }

    /// Numeric value, if the literal decodes as one once separators are removed.
    pub fn to_number(&self) -> Option<f64> {
        let cleaned = self.literal().trim().replace(',', "");
        cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl From<&str> for NumericText {
    fn from(s: &str) -> Self {
        NumericText::Text(s.to_string())
    }
}

/// One entry of the history list, schema-checked.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDrawEntry {
    pub lottery_draw_num: NumericText,
    pub lottery_draw_time: String,
    pub lottery_draw_result: String,
    pub pool_balance_amt: NumericText,
    pub total_sale_amount: NumericText,
    pub prize_level_info: Vec<RawPrizeLevel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPrizeLevel {
    pub stake_count: NumericText,
    pub stake_amount: NumericText,
}

/// Draw identifier such as `"24120"`.
///
/// Ordering and equality use the numeric value; the text as received (which
/// may carry leading zeros, e.g. `"07001"`) is kept for persistence.
#[derive(Debug, Clone)]
pub struct DrawNumber {
    text: String,
    value: u64,
}

impl DrawNumber {
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl FromStr for DrawNumber {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidDrawNumber(s.to_string()));
        }
        let value = text
            .parse()
            .map_err(|_| ParseError::InvalidDrawNumber(s.to_string()))?;
        Ok(Self {
            text: text.to_string(),
            value,
        })
    }
}

impl From<u64> for DrawNumber {
    fn from(value: u64) -> Self {
        Self {
            text: value.to_string(),
            value,
        }
    }
}

impl PartialEq for DrawNumber {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for DrawNumber {}

impl PartialOrd for DrawNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DrawNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl fmt::Display for DrawNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One draw result, ready to become a store row.
///
/// Only the draw number and the result tokens are interpreted; the other
/// fields are carried as received and decoded when the row is written.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub draw_number: DrawNumber,
    /// `lotteryDrawTime` as sent, e.g. `2024-10-19`.
    pub draw_date: String,
    /// Front zone numbers 1-5, as two-digit strings.
    pub front_zone: [String; 5],
    /// Back zone numbers 1-2.
    pub back_zone: [String; 2],
    pub pool_balance: NumericText,
    pub tier1_count: NumericText,
    pub tier1_amount: NumericText,
    pub tier2_count: NumericText,
    pub tier2_amount: NumericText,
    pub total_sales: NumericText,
}
