// src/record.rs
//! Normalized form of one ranking-site page.
//!
//! A [`Record`] carries the flat header fields of the summary table plus the
//! ordered ranking history. Missing fields are absent keys, never empty strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Column holding the ranking list date in the history table.
pub const LIST_COLUMN: &str = "List";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub rank_entries: Vec<HistoryEntry>,
}

impl Record {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// `platform` as an optional value; an empty platform is treated as absent.
    pub fn platform(&self) -> Option<&str> {
        Some(self.platform.as_str()).filter(|p| !p.is_empty())
    }
}

/// One appearance of a system in a periodic ranking.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub list_date: String,
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlopsTier {
    GFlops,
    TFlops,
    PFlops,
}

impl FlopsTier {
    /// Probe order for history entries.
    pub const PROBE_ORDER: [FlopsTier; 3] = [FlopsTier::GFlops, FlopsTier::TFlops, FlopsTier::PFlops];

    pub fn unit(self) -> &'static str {
        match self {
            FlopsTier::GFlops => "GFlops",
            FlopsTier::TFlops => "TFlops",
            FlopsTier::PFlops => "PFlops",
        }
    }

    pub fn rmax_key(self) -> String { format!("Rmax ({})", self.unit()) }
    pub fn rpeak_key(self) -> String { format!("Rpeak ({})", self.unit()) }
}

/// Rmax/Rpeak of one history entry, already suffixed with the tier unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Performance {
    pub tier: FlopsTier,
    pub rmax: String,
    pub rpeak: String,
}

impl HistoryEntry {
    /// First tier with both magnitudes present and non-empty.
    pub fn performance(&self) -> Option<Performance> {
        FlopsTier::PROBE_ORDER.into_iter().find_map(|tier| {
            let rmax = self.columns.get(&tier.rmax_key()).filter(|v| !v.is_empty())?;
            let rpeak = self.columns.get(&tier.rpeak_key()).filter(|v| !v.is_empty())?;
            Some(Performance {
                tier,
                rmax: join!(rmax, " ", tier.unit()),
                rpeak: join!(rpeak, " ", tier.unit()),
            })
        })
    }
}

/// Source identifiers are plain decimal digit strings.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}
