// src/specs/site.rs
//! Extractor for `/site/<id>` pages: `<title>` reads `"<site name> | TOP500"`,
//! only the summary table is present.

use crate::core::Scan;
use crate::record::Record;

use super::{ExtractError, tables};

pub fn extract(id: &str, html: &str) -> Result<Record, ExtractError> {
    let doc = Scan::new(html);

    let title = doc.first_text("title").ok_or(ExtractError::MissingHeading)?;
    let title = title.split(" | ").next().unwrap_or_default().trim().to_string();

    let fields = tables::summary_fields(&doc)?;

    Ok(Record { id: s!(id), title, fields, ..Default::default() })
}
