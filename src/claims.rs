// src/claims.rs
//! Claim mapping engine.
//!
//! Turns one `(field key, raw value)` pair into a typed statement write:
//! the key resolves to a property, the raw value is encoded according to its
//! [`StatementValue`] kind, and optional qualifiers are attached afterwards.
//! Qualifier failures are skipped; they never abort the parent claim.

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::normalize::{format_decimal, parse_list_date};
use crate::core::sanitize::printable_ascii;
use crate::lookup::{LookupTables, PropertyKey, Unit};
use crate::wikibase::{ItemId, ItemRef, KbError, KnowledgeBase, Labels, PropertyId, Snak, Target};

/// Qualifier keys with their own encoding; any other key is attached as raw text.
pub const ROLE_QUALIFIER: &str = "has_role";
pub const DATE_QUALIFIER: &str = "date";

/// A raw value tagged with how it must be encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatementValue {
    /// Plain text, reduced to printable ASCII.
    String(String),
    /// `"<number> [<unit-token>]"`.
    Amount(String),
    /// `mm/yyyy`.
    Date(String),
    /// A human value resolved through the entity table.
    Statement(String),
    /// Language → label; only valid with the `label` key.
    Label(Labels),
}

/// Primary value plus ordered `(qualifier key, raw value)` pairs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimValue {
    pub value: StatementValue,
    pub qualifiers: Vec<(String, String)>,
}

impl ClaimValue {
    pub fn new(value: StatementValue) -> Self {
        Self { value, qualifiers: Vec::new() }
    }

    pub fn qualified(mut self, key: &str, raw: &str) -> Self {
        self.qualifiers.push((s!(key), s!(raw)));
        self
    }
}

impl From<StatementValue> for ClaimValue {
    fn from(value: StatementValue) -> Self { Self::new(value) }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Claim written (qualifiers attached best-effort).
    Written,
    /// A new item was created with the given labels.
    Created(ItemId),
    /// Labels set on an existing item.
    Labelled,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("unknown property key `{0}`")]
    UnknownProperty(String),
    #[error("a new item can only be created from labels")]
    MissingTarget,
    #[error("value kind does not fit the `{0}` key")]
    KindMismatch(String),
    #[error("{0} already has a matching statement")]
    Duplicate(PropertyId),
    #[error("empty value")]
    EmptyValue,
    #[error("`{0}` is not a number")]
    NotNumeric(String),
    #[error("unknown unit `{0}`")]
    UnknownUnit(String),
    #[error("`{0}` is not a mm/yyyy date")]
    BadDate(String),
    #[error("no entity known for `{0}`")]
    UnknownEntity(String),
    #[error(transparent)]
    Kb(#[from] KbError),
}

pub struct ClaimMapper<'a, K: KnowledgeBase + ?Sized> {
    kb: &'a mut K,
    lookup: &'a LookupTables,
    summary: &'a str,
}

impl<'a, K: KnowledgeBase + ?Sized> ClaimMapper<'a, K> {
    pub fn new(kb: &'a mut K, lookup: &'a LookupTables, summary: &'a str) -> Self {
        Self { kb, lookup, summary }
    }

    pub fn lookup(&self) -> &LookupTables { self.lookup }

    /// Write one claim.
    ///
    /// With `allow_duplicate == false` the write is refused when the item
    /// already carries a statement for the property: any statement for an
    /// unqualified value, or one with the same qualifier set for a qualified
    /// value.
    pub fn add_claim(
        &mut self,
        target: &ItemRef,
        key: &str,
        value: &ClaimValue,
        allow_duplicate: bool,
    ) -> Result<ClaimOutcome, ClaimError> {
        let property = self
            .lookup
            .property(key)
            .ok_or_else(|| ClaimError::UnknownProperty(s!(key)))?;

        let property = match (property, &value.value) {
            (PropertyKey::Label, StatementValue::Label(labels)) => return self.apply_labels(target, labels),
            (PropertyKey::Label, _) | (PropertyKey::Property(_), StatementValue::Label(_)) => {
                return Err(ClaimError::KindMismatch(s!(key)));
            }
            (PropertyKey::Property(p), _) => p,
        };

        let item = match target {
            ItemRef::New => return Err(ClaimError::MissingTarget),
            ItemRef::Existing(item) => item,
        };

        let qualifiers = self.resolve_qualifiers(&value.qualifiers);

        if !allow_duplicate {
            let existing = self.kb.statements(item, &property)?;
            let clash = existing
                .iter()
                .any(|s| qualifiers.is_empty() || s.has_qualifiers(&qualifiers));
            if clash {
                return Err(ClaimError::Duplicate(property));
            }
        }

        let snak = Snak::new(property, self.encode(&value.value)?);
        let claim = self.kb.add_claim(item, &snak, self.summary)?;

        for qualifier in &qualifiers {
            if let Err(e) = self.kb.add_qualifier(&claim, qualifier, self.summary) {
                warn!(%item, property = %qualifier.property, error = %e, "qualifier not attached");
            }
        }
        Ok(ClaimOutcome::Written)
    }

    fn apply_labels(&mut self, target: &ItemRef, labels: &Labels) -> Result<ClaimOutcome, ClaimError> {
        if labels.is_empty() {
            return Err(ClaimError::EmptyValue);
        }
        match target {
            ItemRef::New => Ok(ClaimOutcome::Created(self.kb.create_item(labels, self.summary)?)),
            ItemRef::Existing(item) => {
                self.kb.set_labels(item, labels, self.summary)?;
                Ok(ClaimOutcome::Labelled)
            }
        }
    }

    fn encode(&self, value: &StatementValue) -> Result<Target, ClaimError> {
        match value {
            StatementValue::String(raw) => {
                let text = printable_ascii(raw);
                if text.trim().is_empty() { return Err(ClaimError::EmptyValue); }
                Ok(Target::Text(text))
            }
            StatementValue::Amount(raw) => self.encode_amount(raw),
            StatementValue::Date(raw) => parse_list_date(raw)
                .map(Target::Time)
                .ok_or_else(|| ClaimError::BadDate(s!(raw))),
            StatementValue::Statement(raw) => self.resolve_entity(raw).map(Target::Item),
            StatementValue::Label(_) => Err(ClaimError::KindMismatch(s!("label"))),
        }
    }

    fn encode_amount(&self, raw: &str) -> Result<Target, ClaimError> {
        let mut tokens = raw.split_whitespace();
        let magnitude = tokens.next().ok_or(ClaimError::EmptyValue)?;
        // "2,589.00" → "2589.00"
        let amount = format_decimal(&magnitude.replace(',', ""))
            .ok_or_else(|| ClaimError::NotNumeric(s!(magnitude)))?;
        let unit = match tokens.next() {
            None => None,
            Some(token) => match self.lookup.unit(token) {
                Some(Unit::One) => None,
                Some(Unit::Item(id)) => Some(id),
                None => return Err(ClaimError::UnknownUnit(s!(token))),
            },
        };
        Ok(Target::Quantity { amount, unit })
    }

    fn resolve_entity(&self, raw: &str) -> Result<ItemId, ClaimError> {
        let name = printable_ascii(raw);
        self.lookup
            .entity(name.trim())
            .ok_or_else(|| ClaimError::UnknownEntity(name))
    }

    fn resolve_qualifiers(&self, raw: &[(String, String)]) -> Vec<Snak> {
        raw.iter()
            .filter_map(|(key, value)| match self.resolve_qualifier(key, value) {
                Ok(snak) => Some(snak),
                Err(e) => {
                    debug!(qualifier = %key, value = %value, error = %e, "qualifier skipped");
                    None
                }
            })
            .collect()
    }

    fn resolve_qualifier(&self, key: &str, raw: &str) -> Result<Snak, ClaimError> {
        let property = self
            .lookup
            .property_id(key)
            .cloned()
            .ok_or_else(|| ClaimError::UnknownProperty(s!(key)))?;
        let target = match key {
            ROLE_QUALIFIER => Target::Item(self.resolve_entity(raw)?),
            DATE_QUALIFIER => Target::Time(parse_list_date(raw).ok_or_else(|| ClaimError::BadDate(s!(raw)))?),
            _ => Target::Text(s!(raw)),
        };
        Ok(Snak::new(property, target))
    }
}
