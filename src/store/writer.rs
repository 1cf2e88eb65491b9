//! Merging new draws into the store and saving it.
//!
//! # Merge
//!
//! New records are newest-first and all newer than the watermark, so the
//! merged table is simply `new ++ prior`. Prior rows are copied cell for
//! cell, blank rows included; only rows whose draw number also occurs in
//! the new batch are dropped, keeping the table unique by draw number.
//!
//! # Atomicity
//!
//! The workbook is saved next to the target as `<name>.tmp` and renamed over
//! it, so a failed save never leaves a half-written store behind.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use tracing::{error, info, instrument, warn};

use super::{Cell, Table, load_table};
use crate::error::WriteError;
use crate::models::DrawRecord;

/// What a successful write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub new_rows: usize,
    pub prior_rows: usize,
    /// Prior rows replaced by a new row with the same draw number.
    pub replaced_rows: usize,
}

impl WriteSummary {
    pub fn total_rows(&self) -> usize {
        self.new_rows + self.prior_rows
    }
}

/// Persist `new_records` (newest-first) to the store at `path`.
///
/// With `has_watermark` set and an existing store, the prior rows are loaded
/// and appended after the new ones; otherwise the new records are written
/// alone, replacing any file at `path`.
///
/// # Errors
///
/// - [`WriteError::PriorUnreadable`] if the prior store exists but cannot be
///   read; nothing is written in that case
/// - [`WriteError::SchemaMismatch`] if the prior store has other columns
///   (surrounding whitespace in its headers is ignored)
/// - [`WriteError::Xlsx`] / [`WriteError::Io`] if saving fails
#[instrument(level = "info", skip(path, new_records), fields(path = %path.display(), new = new_records.len()))]
pub fn write_store(
    path: &Path,
    new_records: &[DrawRecord],
    has_watermark: bool,
) -> Result<WriteSummary, WriteError> {
    let mut table = Table::from_records(new_records);
    let new_rows = table.rows.len();
    let mut prior_rows = 0;
    let mut replaced_rows = 0;

    if has_watermark && path.exists() {
        let prior = load_table(path).map_err(|e| {
            error!(error = %e, "Prior store is unreadable; refusing to overwrite it");
            WriteError::PriorUnreadable(e)
        })?;
        let same_columns = prior
            .headers
            .iter()
            .map(|h| h.trim())
            .eq(table.headers.iter().map(String::as_str));
        if !same_columns {
            return Err(WriteError::SchemaMismatch {
                found: prior.headers,
            });
        }

        let incoming: HashSet<u64> = new_records.iter().map(|r| r.draw_number.value()).collect();
        let prior_numbers = prior.draw_numbers().map_err(WriteError::PriorUnreadable)?;
        for (row, number) in prior.rows.into_iter().zip(prior_numbers) {
            if number.is_some_and(|n| incoming.contains(&n.value())) {
                replaced_rows += 1;
                continue;
            }
            table.rows.push(row);
            prior_rows += 1;
        }
        if replaced_rows > 0 {
            warn!(replaced_rows, "Prior store already held some of the new draws");
        }
    }

    save_table(path, &table)?;
    info!(
        new_rows,
        prior_rows,
        total = new_rows + prior_rows,
        "Saved store to {}",
        path.display()
    );

    Ok(WriteSummary {
        path: path.to_path_buf(),
        new_rows,
        prior_rows,
        replaced_rows,
    })
}

/// Save `table` to `path` atomically, sizing every column to its content.
pub fn save_table(path: &Path, table: &Table) -> Result<(), WriteError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;

    let header_format = Format::new().set_bold();
    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, col_num(col), header, &header_format)?;
    }
    for (i, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(i + 1).unwrap_or(u32::MAX);
        for (col, cell) in row.iter().enumerate() {
            let col = col_num(col);
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(row_num, col, s)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(row_num, col, *n)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(row_num, col, *b)?;
                }
            }
        }
    }
    for (col, width) in table.column_widths().into_iter().enumerate() {
        sheet.set_column_width(col_num(col), width as f64)?;
    }

    let tmp = temp_path(path);
    if let Err(e) = workbook.save(&tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn col_num(col: usize) -> u16 {
    u16::try_from(col).unwrap_or(u16::MAX)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
