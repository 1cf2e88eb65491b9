//! Newest draw number already present in the store.

use std::path::Path;

use tracing::{debug, instrument};

use super::{Cell, DRAW_NUMBER_COLUMN, load_table};
use crate::error::StoreReadError;
use crate::models::DrawNumber;

/// Read the watermark from the store at `path`.
///
/// The store is newest-first, so this is the draw number of the first data
/// row. Blank rows carry no draw and are passed over.
///
/// # Returns
///
/// - `Ok(None)` if the file does not exist or holds no non-blank rows
/// - `Ok(Some(n))` with the first row's draw number
/// - `Err(_)` if the file exists but cannot be read or its first draw number
///   does not decode
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_watermark(path: &Path) -> Result<Option<DrawNumber>, StoreReadError> {
    if !path.exists() {
        debug!("No store file yet");
        return Ok(None);
    }

    let table = load_table(path)?;
    let idx = table
        .column_index(DRAW_NUMBER_COLUMN)
        .ok_or(StoreReadError::MissingColumn(DRAW_NUMBER_COLUMN))?;

    let Some(first) = table
        .rows
        .iter()
        .find(|row| !row.iter().all(Cell::is_empty))
    else {
        debug!("Store has a header but no rows");
        return Ok(None);
    };
    let cell = first.get(idx).cloned().unwrap_or(Cell::Empty);
    cell.draw_number()
        .map(Some)
        .ok_or_else(|| StoreReadError::InvalidDrawNumber(cell.literal()))
}
