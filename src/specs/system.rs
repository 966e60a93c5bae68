// src/specs/system.rs
//! Extractor for `/system/<id>` pages.
//!
//! - Heading `<h1>` reads `"<title> - <platform>, <details...>"`.
//! - Summary table (`table-condensed`) holds the header fields.
//! - History table (`table-responsive`) holds one row per ranking list.

use crate::core::Scan;
use crate::record::Record;

use super::{ExtractError, tables};

pub fn extract(id: &str, html: &str) -> Result<Record, ExtractError> {
    let doc = Scan::new(html);

    let heading = doc.first_text("h1").ok_or(ExtractError::MissingHeading)?;
    let (title, platform) = split_heading(&heading);

    let fields = tables::summary_fields(&doc)?;
    let rank_entries = tables::history_entries(&doc)?;

    Ok(Record { id: s!(id), title, platform, fields, rank_entries })
}

/// `"Fugaku - Supercomputer Fugaku, A64FX 48C 2.2GHz"` → `("Fugaku", "Supercomputer Fugaku")`.
fn split_heading(heading: &str) -> (String, String) {
    let mut parts = heading.split(" - ");
    let title = parts.next().unwrap_or_default().trim().to_string();
    let platform = parts
        .next()
        .and_then(|seg| seg.split(',').next())
        .map(|p| p.trim().to_string())
        .unwrap_or_default();
    (title, platform)
}
