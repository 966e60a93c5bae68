// src/specs/tables.rs
// The two table shapes found on ranking-site pages.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::Scan;
use crate::core::html::row_cells;
use crate::core::sanitize::{cell_header, cell_value};
use crate::record::{HistoryEntry, LIST_COLUMN};

use super::ExtractError;

pub const SUMMARY_CLASS: &str = "table-condensed";
pub const HISTORY_CLASS: &str = "table-responsive";

/// Row-wise `<th>Header:</th><td>value</td>` pairs.
///
/// Each row is paired with itself, so a row missing its header or its value
/// is dropped instead of shifting every later field by one.
pub fn summary_fields(doc: &Scan) -> Result<BTreeMap<String, String>, ExtractError> {
    let table = doc
        .first_with_class("table", SUMMARY_CLASS)
        .ok_or(ExtractError::MissingTable(SUMMARY_CLASS))?;

    let mut fields = BTreeMap::new();
    for tr in Scan::new(table).blocks("tr") {
        let header = row_cells(tr, "th").join("");
        let value = row_cells(tr, "td").join("");
        let header = cell_header(&header);
        if header.is_empty() || value.is_empty() {
            debug!(header = %header, "summary row without header/value pair dropped");
            continue;
        }
        fields.insert(header, cell_value(&value));
    }
    Ok(fields)
}

/// First row = column headers; every later row becomes one [`HistoryEntry`].
pub fn history_entries(doc: &Scan) -> Result<Vec<HistoryEntry>, ExtractError> {
    let table = doc
        .first_with_class("table", HISTORY_CLASS)
        .ok_or(ExtractError::MissingTable(HISTORY_CLASS))?;

    let rows = Scan::new(table).blocks("tr");
    let Some((head, body)) = rows.split_first() else {
        return Err(ExtractError::EmptyTable(HISTORY_CLASS));
    };
    let headers: Vec<String> = row_cells(head, "th").iter().map(|h| cell_header(h)).collect();
    if headers.is_empty() {
        return Err(ExtractError::EmptyTable(HISTORY_CLASS));
    }

    let mut entries = Vec::with_capacity(body.len());
    for tr in body {
        let cells = row_cells(tr, "td");
        if cells.is_empty() { continue; }

        // zip stops at the shorter side; surplus cells have no column to land in
        let mut columns: BTreeMap<String, String> = headers
            .iter()
            .zip(cells.iter())
            .map(|(h, c)| (h.clone(), cell_value(c)))
            .collect();
        let list_date = columns.remove(LIST_COLUMN).unwrap_or_default();
        entries.push(HistoryEntry { list_date, columns });
    }
    Ok(entries)
}
