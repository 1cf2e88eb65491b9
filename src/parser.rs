//! Decoding of raw history entries into [`DrawRecord`]s.
//!
//! Decoding is two-step: the untyped JSON entry is first deserialized into
//! [`RawDrawEntry`] (so every missing or mistyped key becomes a
//! [`ParseError::Schema`]), then the positional fields are bound by name
//! after their counts have been checked. Dates and amounts are not
//! interpreted here.

use serde_json::Value;

use crate::error::ParseError;
use crate::models::{DrawNumber, DrawRecord, NumericText, RawDrawEntry};

/// Tokens required in `lotteryDrawResult`: five front, two back.
pub const RESULT_TOKENS: usize = 7;

/// Read only the draw number of an entry.
///
/// Used by the crawl loop to compare against the watermark before paying for
/// a full decode.
pub fn peek_draw_number(entry: &Value) -> Result<DrawNumber, ParseError> {
    let raw = entry.get("lotteryDrawNum").cloned().unwrap_or(Value::Null);
    let num: NumericText = serde_json::from_value(raw)?;
    num.literal().parse()
}

/// Convert one raw entry into a [`DrawRecord`].
///
/// # Errors
///
/// - [`ParseError::Schema`] if a key is missing or has the wrong JSON type
/// - [`ParseError::TooFewTokens`] if the result string has fewer than 7 tokens
/// - [`ParseError::MissingPrizeTiers`] if fewer than 2 prize tiers are listed
/// - [`ParseError::InvalidDrawNumber`] if the draw number is not an integer
pub fn parse_draw_result(entry: &Value) -> Result<DrawRecord, ParseError> {
    let raw = RawDrawEntry::deserialize_from(entry)?;

    let draw_number: DrawNumber = raw.lottery_draw_num.literal().parse()?;
    let (front_zone, back_zone) = split_draw_result(&raw.lottery_draw_result)?;

    let found = raw.prize_level_info.len();
    let mut tiers = raw.prize_level_info.into_iter();
    let (Some(tier1), Some(tier2)) = (tiers.next(), tiers.next()) else {
        return Err(ParseError::MissingPrizeTiers { found });
    };

    Ok(DrawRecord {
        draw_number,
        draw_date: raw.lottery_draw_time,
        front_zone,
        back_zone,
        pool_balance: raw.pool_balance_amt,
        tier1_count: tier1.stake_count,
        tier1_amount: tier1.stake_amount,
        tier2_count: tier2.stake_count,
        tier2_amount: tier2.stake_amount,
        total_sales: raw.total_sale_amount,
    })
}

impl RawDrawEntry {
    fn deserialize_from(entry: &Value) -> Result<Self, ParseError> {
        Ok(serde_json::from_value(entry.clone())?)
    }
}

/// Split `"05 12 19 28 33 03 11"` into front and back zone numbers.
///
/// The string is split on single spaces; tokens past the seventh are ignored.
fn split_draw_result(result: &str) -> Result<([String; 5], [String; 2]), ParseError> {
    let tokens: Vec<&str> = result.split(' ').collect();
    if tokens.len() < RESULT_TOKENS {
        return Err(ParseError::TooFewTokens {
            result: result.to_string(),
            found: tokens.len(),
        });
    }
    let front = [0, 1, 2, 3, 4].map(|i| tokens[i].to_string());
    let back = [5, 6].map(|i| tokens[i].to_string());
    Ok((front, back))
}
