// src/specs/mod.rs
//! # Page extractors
//!
//! Each extractor knows where the ground truth lives in one ranking-site page and
//! turns the raw HTML into a [`Record`](crate::record::Record).
//!
//! ## What lives here
//! - Pure parsing of `/system/<id>` and `/site/<id>` pages.
//! - The two known table shapes (`tables`): the row-wise summary table and
//!   the ranking history table.
//!
//! ## What does **not** live here
//! - Networking and caching (`fetch`).
//! - Any mapping to knowledge-base claims (`claims`, `update`).
//!
//! Specs are testable offline against saved pages (`tests/fixtures/`).
pub mod site;
pub mod system;
pub mod tables;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("page heading not found")]
    MissingHeading,
    #[error("table with class `{0}` not found")]
    MissingTable(&'static str),
    #[error("table with class `{0}` has no header row")]
    EmptyTable(&'static str),
}
