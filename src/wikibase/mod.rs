// src/wikibase/mod.rs
//! Knowledge-base data model and client seam.
//!
//! The importer only needs a handful of operations: create an item, set its
//! labels, read the statements of one property, add a claim, add a qualifier
//! to a claim, and read/write plain wiki pages (change log, status page).
//! [`KnowledgeBase`] is that surface; [`MemoryKnowledgeBase`] and
//! [`WikibaseApi`] implement it.

mod api;
mod memory;
mod value;

pub use api::WikibaseApi;
pub use memory::MemoryKnowledgeBase;

use std::{collections::BTreeMap, fmt};

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::core::normalize::YearMonth;

/// `Q<digits>`; `Q0` is reserved as the create-new sentinel and never parses here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('Q')?;
        if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u64>().ok()?;
        Some(Self(s.to_string()))
    }

    pub fn from_number(n: u64) -> Option<Self> {
        if n == 0 { None } else { Some(Self(format!("Q{n}"))) }
    }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn number(&self) -> u64 {
        self.0[1..].parse().unwrap_or_default()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// `P<digits>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(String);

impl PropertyId {
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('P')?;
        if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Where an update lands: an existing item, or a new one to be created first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemRef {
    New,
    Existing(ItemId),
}

impl ItemRef {
    /// `Q0` is the create-new sentinel; anything else must be a valid item id.
    pub fn parse(s: &str) -> Option<Self> {
        if s == "Q0" { return Some(ItemRef::New); }
        ItemId::parse(s).map(ItemRef::Existing)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::New => f.write_str("Q0"),
            ItemRef::Existing(id) => id.fmt(f),
        }
    }
}

/// Statement id as issued by the knowledge base (`Q42$5A1B...`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClaimId(pub String);

/// Language code → label text.
pub type Labels = BTreeMap<String, String>;

/// A typed value for a claim or qualifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Text(String),
    Quantity { amount: BigDecimal, unit: Option<ItemId> },
    Time(YearMonth),
    Item(ItemId),
}

/// Property + value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snak {
    pub property: PropertyId,
    pub target: Target,
}

impl Snak {
    pub fn new(property: PropertyId, target: Target) -> Self { Self { property, target } }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub id: ClaimId,
    pub mainsnak: Snak,
    pub qualifiers: Vec<Snak>,
}

impl Statement {
    /// Same qualifier set regardless of order.
    pub fn has_qualifiers(&self, wanted: &[Snak]) -> bool {
        self.qualifiers.len() == wanted.len() && wanted.iter().all(|q| self.qualifiers.contains(q))
    }
}

/// A wiki page as read, with the markers a later save is checked against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageRevision {
    /// Empty for a missing page.
    pub text: String,
    /// Timestamp of the revision read; `None` when the page did not exist.
    pub base: Option<String>,
    /// Server time of the read.
    pub start: Option<String>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum KbError {
    #[error("edit conflict on {0}")]
    EditConflict(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("api rejected request ({code}): {info}")]
    Rejected { code: String, info: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("no such entity: {0}")]
    NotFound(String),
}

impl KbError {
    /// Failures worth repeating the same write for.
    pub fn is_retryable(&self) -> bool {
        matches!(self, KbError::EditConflict(_) | KbError::Timeout(_) | KbError::Server(_))
    }
}

pub trait KnowledgeBase {
    fn create_item(&mut self, labels: &Labels, summary: &str) -> Result<ItemId, KbError>;
    fn set_labels(&mut self, item: &ItemId, labels: &Labels, summary: &str) -> Result<(), KbError>;
    /// Existing statements of `property` on `item`.
    fn statements(&mut self, item: &ItemId, property: &PropertyId) -> Result<Vec<Statement>, KbError>;
    fn add_claim(&mut self, item: &ItemId, snak: &Snak, summary: &str) -> Result<ClaimId, KbError>;
    fn add_qualifier(&mut self, claim: &ClaimId, snak: &Snak, summary: &str) -> Result<(), KbError>;
    /// Current revision of a wiki page; a missing page reads as empty.
    fn read_page(&mut self, title: &str) -> Result<PageRevision, KbError>;
    /// Overwrite a page. With `based_on`, a page changed since that read is
    /// refused with [`KbError::EditConflict`].
    fn save_page(&mut self, title: &str, text: &str, summary: &str, based_on: Option<&PageRevision>) -> Result<(), KbError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_ids() {
        assert!(ItemId::parse("Q42").is_some());
        assert!(ItemId::parse("Q0").is_none());
        assert!(ItemId::parse("Q042").is_none());
        assert!(ItemId::parse("P42").is_none());
        assert!(ItemId::parse("Q").is_none());
        assert!(ItemId::parse("Q+5").is_none());
        assert!(ItemId::parse("Q 5").is_none());
        assert_eq!(ItemId::parse("Q42").unwrap().number(), 42);
    }

    #[test]
    fn item_refs() {
        assert_eq!(ItemRef::parse("Q0"), Some(ItemRef::New));
        assert_eq!(ItemRef::parse("Q7"), Some(ItemRef::Existing(ItemId::parse("Q7").unwrap())));
        assert_eq!(ItemRef::parse("banana"), None);
        assert_eq!(ItemRef::parse("Q+5"), None);
        assert_eq!(ItemRef::New.to_string(), "Q0");
    }

    #[test]
    fn property_ids() {
        assert!(PropertyId::parse("P31").is_some());
        assert!(PropertyId::parse("P").is_none());
        assert!(PropertyId::parse("P3a").is_none());
        assert!(PropertyId::parse("Q31").is_none());
    }

    #[test]
    fn retryable_classes() {
        assert!(KbError::EditConflict(s!("x")).is_retryable());
        assert!(KbError::Timeout(s!("x")).is_retryable());
        assert!(!KbError::Rejected { code: s!("badtoken"), info: s!() }.is_retryable());
    }
}
