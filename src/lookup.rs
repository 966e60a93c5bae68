// src/lookup.rs
//! Static name tables: field keys → property ids, human values → item ids,
//! property ids → external-identifier URL templates.
//!
//! The built-in tables ship as `assets/lookup.toml`; a deployment can point
//! `lookup_path` at its own copy. Tables are immutable once loaded.

use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::wikibase::{ItemId, PropertyId};

const BUILTIN: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/lookup.toml"));

/// Reserved key that passes through property resolution unchanged.
pub const LABEL_KEY: &str = "label";

/// Wikibase's unit value for dimensionless quantities.
pub const DIMENSIONLESS: &str = "1";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("cannot read lookup table {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("malformed lookup table: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("lookup table entry `{key}` has invalid id `{value}`")]
    BadId { key: String, value: String },
}

#[derive(Debug, Deserialize)]
struct RawTables {
    #[serde(default)]
    properties: HashMap<String, String>,
    #[serde(default)]
    entities: HashMap<String, String>,
    #[serde(default)]
    identifiers: HashMap<String, String>,
}

/// What a field key resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyKey {
    Label,
    Property(PropertyId),
}

/// What a unit token resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Unit {
    One,
    Item(ItemId),
}

#[derive(Clone, Debug, Default)]
pub struct LookupTables {
    properties: HashMap<String, PropertyId>,
    entities: HashMap<String, String>,
    identifiers: HashMap<PropertyId, String>,
}

impl LookupTables {
    pub fn builtin() -> Result<Self, LookupError> {
        Self::from_toml_str(BUILTIN)
    }

    pub fn load(path: &Path) -> Result<Self, LookupError> {
        let text = fs::read_to_string(path)
            .map_err(|source| LookupError::Io { path: path.display().to_string(), source })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, LookupError> {
        let raw: RawTables = toml::from_str(text)?;

        let mut properties = HashMap::with_capacity(raw.properties.len());
        for (key, value) in raw.properties {
            let id = PropertyId::parse(&value)
                .ok_or_else(|| LookupError::BadId { key: key.clone(), value: value.clone() })?;
            properties.insert(key, id);
        }

        for (key, value) in &raw.entities {
            if value != DIMENSIONLESS && ItemId::parse(value).is_none() {
                return Err(LookupError::BadId { key: key.clone(), value: value.clone() });
            }
        }

        let mut identifiers = HashMap::with_capacity(raw.identifiers.len());
        for (key, template) in raw.identifiers {
            let id = PropertyId::parse(&key)
                .ok_or_else(|| LookupError::BadId { key: key.clone(), value: template.clone() })?;
            identifiers.insert(id, template);
        }

        Ok(Self { properties, entities: raw.entities, identifiers })
    }

    pub fn property(&self, key: &str) -> Option<PropertyKey> {
        if key == LABEL_KEY {
            return Some(PropertyKey::Label);
        }
        self.properties.get(key).cloned().map(PropertyKey::Property)
    }

    /// Property id for a qualifier or field key (`label` has none).
    pub fn property_id(&self, key: &str) -> Option<&PropertyId> {
        self.properties.get(key)
    }

    /// Item for a human value. The dimensionless marker is not an item.
    pub fn entity(&self, name: &str) -> Option<ItemId> {
        self.entities.get(name).and_then(|v| ItemId::parse(v))
    }

    pub fn unit(&self, token: &str) -> Option<Unit> {
        match self.entities.get(token)?.as_str() {
            DIMENSIONLESS => Some(Unit::One),
            other => ItemId::parse(other).map(Unit::Item),
        }
    }

    pub fn identifier_url(&self, property: &PropertyId) -> Option<&str> {
        self.identifiers.get(property).map(String::as_str)
    }

    /// External URL for an identifier value, if the property has a template.
    pub fn formatter_url(&self, property: &PropertyId, value: &str) -> Option<String> {
        self.identifier_url(property).map(|t| t.replace("$1", value))
    }
}
