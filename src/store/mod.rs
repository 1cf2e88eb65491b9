//! The persisted draw history: one `.xlsx` worksheet, newest draw first.
//!
//! # Submodules
//!
//! - [`watermark`]: reads the newest stored draw number
//! - [`writer`]: merges a batch of new draws into the store and saves it
//!
//! # Layout
//!
//! ```text
//! 期号 | 开奖日期 | 前区1..前区5 | 后区1 后区2 | 奖池奖金(元) | 一等奖注数 | ... | 总投注额(元)
//! 24120 | 2024-10-19 | 05 12 19 28 33 | 03 11 | 868423396.6 | 3 | ... | 338556862
//! 24119 | ...
//! ```
//!
//! Rows already in the store are handled as raw [`Cell`]s so that a merge
//! carries them over exactly as they were read, blank rows included.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};

use crate::error::StoreReadError;
use crate::models::{DrawNumber, DrawRecord, NumericText};

pub mod watermark;
pub mod writer;

/// Header of the draw number column.
pub const DRAW_NUMBER_COLUMN: &str = "期号";

/// The 15 store columns, in order.
pub const COLUMNS: [&str; 15] = [
    DRAW_NUMBER_COLUMN,
    "开奖日期",
    "前区1",
    "前区2",
    "前区3",
    "前区4",
    "前区5",
    "后区1",
    "后区2",
    "奖池奖金(元)",
    "一等奖注数",
    "一等奖奖金(元)",
    "二等奖注数",
    "二等奖奖金(元)",
    "总投注额(元)",
];

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// The literal string shown for this cell, used for column sizing.
    pub fn literal(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Interpret the cell as a draw number, whether stored as text or number.
    pub fn draw_number(&self) -> Option<DrawNumber> {
        match self {
            Cell::Text(s) => s.parse().ok(),
            Cell::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(DrawNumber::from(*n as u64)),
            _ => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

/// A whole worksheet: header row plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// A table with the standard columns holding `records` in the given order.
    pub fn from_records(records: &[DrawRecord]) -> Self {
        Self {
            headers: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: records.iter().map(record_row).collect(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Draw number of every row, `None` where the cell does not decode.
    pub fn draw_numbers(&self) -> Result<Vec<Option<DrawNumber>>, StoreReadError> {
        let idx = self
            .column_index(DRAW_NUMBER_COLUMN)
            .ok_or(StoreReadError::MissingColumn(DRAW_NUMBER_COLUMN))?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).and_then(Cell::draw_number))
            .collect())
    }

    /// Width of each column: longest literal (header included) plus 2.
    pub fn column_widths(&self) -> Vec<usize> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);

        (0..columns)
            .map(|col| {
                let header = self.headers.get(col).map_or(0, |h| h.chars().count());
                let longest = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.literal().chars().count())
                    .max()
                    .unwrap_or(0);
                header.max(longest) + 2
            })
            .collect()
    }
}

/// Store row of one record, in [`COLUMNS`] order.
pub fn record_row(record: &DrawRecord) -> Vec<Cell> {
    let mut row = Vec::with_capacity(COLUMNS.len());
    row.push(Cell::Text(record.draw_number.as_str().to_string()));
    row.push(Cell::Text(record.draw_date.clone()));
    row.extend(record.front_zone.iter().cloned().map(Cell::Text));
    row.extend(record.back_zone.iter().cloned().map(Cell::Text));
    row.extend(
        [
            &record.pool_balance,
            &record.tier1_count,
            &record.tier1_amount,
            &record.tier2_count,
            &record.tier2_amount,
            &record.total_sales,
        ]
        .into_iter()
        .map(numeric_cell),
    );
    row
}

/// A number cell when the value decodes, otherwise its text as sent.
fn numeric_cell(value: &NumericText) -> Cell {
    match value.to_number() {
        Some(n) => Cell::Number(n),
        None => match value.literal() {
            text if text.is_empty() => Cell::Empty,
            text => Cell::Text(text),
        },
    }
}

/// Read the first worksheet of the store at `path`.
///
/// The first row is taken as the header; every later row is kept, blank or
/// not.
pub fn load_table(path: &Path) -> Result<Table, StoreReadError> {
    let mut workbook: Xlsx<BufReader<File>> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(StoreReadError::EmptyWorkbook)??;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|header| header.iter().map(|d| Cell::from(d).literal()).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();

    Ok(Table { headers, rows })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Record with predictable content for `draw`.
    pub(crate) fn record(draw: u64) -> DrawRecord {
        DrawRecord {
            draw_number: DrawNumber::from(draw),
            draw_date: "2024-10-19".to_string(),
            front_zone: ["01", "02", "03", "04", "05"].map(String::from),
            back_zone: ["06", "07"].map(String::from),
            pool_balance: NumericText::from("868,423,396.6"),
            tier1_count: NumericText::from("3"),
            tier1_amount: NumericText::from("10,000,000"),
            tier2_count: NumericText::from("112"),
            tier2_amount: NumericText::from("148,573"),
            total_sales: NumericText::from("338,556,862"),
        }
    }

    #[test]
    fn test_record_row_layout() {
        let row = record_row(&record(24120));
        assert_eq!(row.len(), COLUMNS.len());
        assert_eq!(row[0], Cell::Text("24120".into()));
        assert_eq!(row[1], Cell::Text("2024-10-19".into()));
        assert_eq!(row[2], Cell::Text("01".into()));
        assert_eq!(row[8], Cell::Text("07".into()));
        assert_eq!(row[9], Cell::Number(868_423_396.6));
        assert_eq!(row[10], Cell::Number(3.0));
        assert_eq!(row[14], Cell::Number(338_556_862.0));
    }

    #[test]
    fn test_record_row_keeps_undecodable_values_as_text() {
        let mut rec = record(24120);
        rec.pool_balance = NumericText::from("");
        rec.tier2_amount = NumericText::from("---");
        rec.total_sales = NumericText::Null;
        rec.draw_date = "2024-10-19 21:25:00".to_string();

        let row = record_row(&rec);
        assert_eq!(row[1], Cell::Text("2024-10-19 21:25:00".into()));
        assert_eq!(row[9], Cell::Empty);
        assert_eq!(row[13], Cell::Text("---".into()));
        assert_eq!(row[14], Cell::Empty);
        assert_eq!(row[10], Cell::Number(3.0));
    }

    #[test]
    fn test_cell_literals() {
        assert_eq!(Cell::Number(3.0).literal(), "3");
        assert_eq!(Cell::Number(868_423_396.6).literal(), "868423396.6");
        assert_eq!(Cell::Text("前区1".into()).literal(), "前区1");
        assert_eq!(Cell::Empty.literal(), "");
    }

    #[test]
    fn test_cell_draw_number() {
        assert_eq!(Cell::Text("07001".into()).draw_number(), Some(DrawNumber::from(7001)));
        assert_eq!(Cell::Number(24120.0).draw_number(), Some(DrawNumber::from(24120)));
        assert_eq!(Cell::Number(1.5).draw_number(), None);
        assert_eq!(Cell::Empty.draw_number(), None);
    }

    #[test]
    fn test_column_widths_count_characters() {
        let table = Table {
            headers: vec!["期号".into(), "奖池奖金(元)".into()],
            rows: vec![
                vec![Cell::Text("24120".into()), Cell::Number(5.0)],
                vec![Cell::Text("9".into()), Cell::Number(123_456_789_012.0)],
            ],
        };
        // "24120" = 5 chars; "123456789012" = 12 chars.
        assert_eq!(table.column_widths(), vec![7, 14]);
    }

    #[test]
    fn test_column_widths_header_only() {
        let table = Table::from_records(&[]);
        let widths = table.column_widths();
        assert_eq!(widths.len(), 15);
        // "奖池奖金(元)" is 7 characters.
        assert_eq!(widths[9], 9);
    }
}
