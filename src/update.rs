// src/update.rs
//! Item update orchestrator.
//!
//! Drives the fixed field sequence for one [`Record`] against one item. Each
//! field is an independent write: a missing or unmappable value is recorded
//! in the [`UpdateReport`] and the sequence moves on. Only failing to create
//! a new item aborts the update.

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::claims::{ClaimError, ClaimMapper, ClaimOutcome, ClaimValue, DATE_QUALIFIER, ROLE_QUALIFIER, StatementValue};
use crate::config::ImporterOptions;
use crate::config::consts::LOG_END_MARKER;
use crate::lookup::{LABEL_KEY, LookupTables};
use crate::record::Record;
use crate::wikibase::{ItemId, ItemRef, KbError, KnowledgeBase, Labels};

pub const PERFORMANCE_KEY: &str = "performance";
pub const IDENTIFIER_KEY: &str = "top500identifier";

#[derive(Clone, Copy, Debug)]
enum Source {
    /// The configured instance-of entity.
    InstanceOf,
    Field(&'static str),
    Platform,
    Id,
}

#[derive(Clone, Copy, Debug)]
enum Kind {
    String,
    Amount,
    Statement,
}

/// Property key, where its value comes from, how it is encoded. Order is the write order.
const FIELD_MAP: [(&str, Source, Kind); 10] = [
    ("instance_of", Source::InstanceOf, Kind::Statement),
    ("manufacturer", Source::Field("Manufacturer"), Kind::Statement),
    ("site", Source::Field("Site"), Kind::Statement),
    ("cores", Source::Field("Cores"), Kind::Amount),
    ("memory", Source::Field("Memory"), Kind::Amount),
    ("cpu", Source::Field("Processor"), Kind::Statement),
    ("power", Source::Field("Power Consumption"), Kind::Amount),
    ("os", Source::Field("Operating System"), Kind::Statement),
    ("platform", Source::Platform, Kind::Statement),
    (IDENTIFIER_KEY, Source::Id, Kind::String),
];

#[derive(Debug, PartialEq, Eq)]
pub enum FieldOutcome {
    Written,
    /// The record has no value for the field.
    Missing,
    /// The item already carries a matching statement.
    Duplicate,
    Failed(ClaimError),
}

impl From<Result<ClaimOutcome, ClaimError>> for FieldOutcome {
    fn from(result: Result<ClaimOutcome, ClaimError>) -> Self {
        match result {
            Ok(_) => FieldOutcome::Written,
            Err(ClaimError::Duplicate(_)) => FieldOutcome::Duplicate,
            Err(e) => FieldOutcome::Failed(e),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct PerformanceOutcome {
    pub list_date: String,
    pub rmax: FieldOutcome,
    pub rpeak: FieldOutcome,
}

#[derive(Debug, PartialEq, Eq)]
pub struct UpdateReport {
    pub item: ItemId,
    pub created: bool,
    pub fields: Vec<(&'static str, FieldOutcome)>,
    pub performance: Vec<PerformanceOutcome>,
    /// `None` when no change-log entry was requested.
    pub logged: Option<bool>,
}

impl UpdateReport {
    pub fn field(&self, key: &str) -> Option<&FieldOutcome> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, o)| o)
    }

    fn all_outcomes(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.fields
            .iter()
            .map(|(_, o)| o)
            .chain(self.performance.iter().flat_map(|p| [&p.rmax, &p.rpeak]))
    }

    pub fn written(&self) -> usize {
        self.all_outcomes().filter(|o| **o == FieldOutcome::Written).count()
    }

    pub fn failed(&self) -> usize {
        self.all_outcomes().filter(|o| matches!(o, FieldOutcome::Failed(_))).count()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpdateError {
    #[error("could not create an item for `{title}`: {source}")]
    Create { title: String, source: ClaimError },
}

pub struct ItemUpdater<'a, K: KnowledgeBase + ?Sized> {
    kb: &'a mut K,
    lookup: &'a LookupTables,
    options: &'a ImporterOptions,
}

impl<'a, K: KnowledgeBase + ?Sized> ItemUpdater<'a, K> {
    pub fn new(kb: &'a mut K, lookup: &'a LookupTables, options: &'a ImporterOptions) -> Self {
        Self { kb, lookup, options }
    }

    /// Apply `record` to `target`, creating the item first for [`ItemRef::New`].
    ///
    /// `Ok` once the field pass completes, however many fields were skipped;
    /// the report says which.
    pub fn update_item(&mut self, record: &Record, target: &ItemRef, log_change: bool) -> Result<UpdateReport, UpdateError> {
        let lookup = self.lookup;
        let options = self.options;
        let mut mapper = ClaimMapper::new(&mut *self.kb, lookup, &options.edit_summary);

        let (item, created) = match target {
            ItemRef::Existing(item) => (item.clone(), false),
            ItemRef::New => (create(&mut mapper, options, record)?, true),
        };
        let at = ItemRef::Existing(item.clone());

        let fields = FIELD_MAP
            .iter()
            .map(|&(key, source, kind)| {
                let outcome = match source_value(options, record, source) {
                    None => FieldOutcome::Missing,
                    Some(raw) => mapper.add_claim(&at, key, &encode(kind, raw).into(), false).into(),
                };
                match &outcome {
                    FieldOutcome::Failed(e) => debug!(%item, field = key, error = %e, "field skipped"),
                    FieldOutcome::Missing => debug!(%item, field = key, "field absent"),
                    _ => {}
                }
                (key, outcome)
            })
            .collect::<Vec<_>>();

        if fields.iter().any(|(k, o)| *k == IDENTIFIER_KEY && *o == FieldOutcome::Written) {
            if let Some(url) = lookup.property_id(IDENTIFIER_KEY).and_then(|p| lookup.formatter_url(p, &record.id)) {
                info!(%item, %url, "identifier linked");
            }
        }

        let performance = record
            .rank_entries
            .iter()
            .map(|entry| {
                let Some(perf) = entry.performance() else {
                    debug!(%item, list = %entry.list_date, "history entry has no populated tier");
                    return PerformanceOutcome {
                        list_date: entry.list_date.clone(),
                        rmax: FieldOutcome::Missing,
                        rpeak: FieldOutcome::Missing,
                    };
                };
                let mut claim = |amount: &str, role: &str| -> FieldOutcome {
                    let value = ClaimValue::new(StatementValue::Amount(s!(amount)))
                        .qualified(ROLE_QUALIFIER, role)
                        .qualified(DATE_QUALIFIER, &entry.list_date);
                    mapper.add_claim(&at, PERFORMANCE_KEY, &value, false).into()
                };
                PerformanceOutcome {
                    list_date: entry.list_date.clone(),
                    rmax: claim(&perf.rmax, "rmax"),
                    rpeak: claim(&perf.rpeak, "rpeak"),
                }
            })
            .collect();

        let mut report = UpdateReport { item, created, fields, performance, logged: None };
        info!(item = %report.item, source = %record.id, written = report.written(), failed = report.failed(), "item updated");

        if log_change {
            let logged = match self.append_change_log(&report.item) {
                Ok(()) => true,
                Err(e) => {
                    error!(item = %report.item, error = %e, "giving up on change log");
                    false
                }
            };
            report.logged = Some(logged);
        }
        Ok(report)
    }

    /// Re-reads the page on every attempt and saves against that read, so a
    /// concurrent append surfaces as an edit conflict. Only retryable failures
    /// are repeated.
    fn append_change_log(&mut self, item: &ItemId) -> Result<(), KbError> {
        let options = self.options;
        let page = options.log_page.as_str();
        let summary = format!("Item [[{item}]] successfuly updated");
        let attempts = options.log_retries.max(1);

        let mut attempt = 1;
        loop {
            let result = self
                .kb
                .read_page(page)
                .and_then(|rev| self.kb.save_page(page, &change_log_text(&rev.text, item), &summary, Some(&rev)));
            match result {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(%item, attempt, error = %e, "change log write failed, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn create<K: KnowledgeBase + ?Sized>(
    mapper: &mut ClaimMapper<'_, K>,
    options: &ImporterOptions,
    record: &Record,
) -> Result<ItemId, UpdateError> {
    let title = record.title.trim();
    let labels: Labels = if title.is_empty() {
        Labels::new()
    } else {
        options.languages.iter().map(|lang| (lang.clone(), s!(title))).collect()
    };
    let fail = |source| UpdateError::Create { title: s!(title), source };
    match mapper.add_claim(&ItemRef::New, LABEL_KEY, &StatementValue::Label(labels).into(), false) {
        Ok(ClaimOutcome::Created(item)) => {
            info!(%item, title, "item created");
            Ok(item)
        }
        Ok(_) => Err(fail(ClaimError::MissingTarget)),
        Err(e) => Err(fail(e)),
    }
}

fn source_value<'r>(options: &'r ImporterOptions, record: &'r Record, source: Source) -> Option<&'r str> {
    let raw = match source {
        Source::InstanceOf => Some(options.instance_of.as_str()),
        Source::Field(name) => record.field(name),
        Source::Platform => record.platform(),
        Source::Id => Some(record.id.as_str()),
    };
    raw.filter(|v| !v.trim().is_empty())
}

fn encode(kind: Kind, raw: &str) -> StatementValue {
    match kind {
        Kind::String => StatementValue::String(s!(raw)),
        Kind::Amount => StatementValue::Amount(s!(raw)),
        Kind::Statement => StatementValue::Statement(s!(raw)),
    }
}

/// Page text with `item` appended before the end-of-list marker.
pub fn change_log_text(current: &str, item: &ItemId) -> String {
    let head = current.replace(LOG_END_MARKER, "");
    let head = head.trim_end();
    let mut text = if head.is_empty() { s!() } else { join!(head, "\n") };
    text.push_str(&format!("* {{{{q|{item}}}}}\n{LOG_END_MARKER}\n"));
    text
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::record::HistoryEntry;
    use crate::wikibase::MemoryKnowledgeBase;

    fn record() -> Record {
        let fields: BTreeMap<String, String> = [
            ("Manufacturer", "IBM"),
            ("Cores", "128 Cores"),
            ("Memory", "1,024 GB"),
            ("Power Consumption", "10 kW"),
            ("Operating System", "Linux"),
        ]
        .into_iter()
        .map(|(k, v)| (s!(k), s!(v)))
        .collect();
        Record {
            id: s!("179"),
            title: s!("Summit"),
            platform: s!("IBM Power System AC922"),
            fields,
            rank_entries: vec![HistoryEntry {
                list_date: s!("11/2020"),
                columns: [("Rmax (PFlops)", "148.6"), ("Rpeak (PFlops)", "200.79")]
                    .into_iter()
                    .map(|(k, v)| (s!(k), s!(v)))
                    .collect(),
            }],
        }
    }

    fn run(kb: &mut MemoryKnowledgeBase, rec: &Record, target: &ItemRef, log: bool) -> Result<UpdateReport, UpdateError> {
        let lookup = LookupTables::builtin().unwrap();
        let options = ImporterOptions::default();
        ItemUpdater::new(kb, &lookup, &options).update_item(rec, target, log)
    }

    #[test]
    fn creates_item_labelled_in_every_language() {
        let mut kb = MemoryKnowledgeBase::new();
        let report = run(&mut kb, &record(), &ItemRef::New, false).unwrap();
        assert!(report.created);
        let labels = &kb.item(&report.item).unwrap().labels;
        assert_eq!(labels.get("en").map(String::as_str), Some("Summit"));
        assert_eq!(labels.get("es").map(String::as_str), Some("Summit"));
        assert_eq!(report.logged, None);
    }

    #[test]
    fn untitled_record_cannot_create() {
        let mut kb = MemoryKnowledgeBase::new();
        let rec = Record { title: s!("  "), ..record() };
        assert!(matches!(run(&mut kb, &rec, &ItemRef::New, true), Err(UpdateError::Create { .. })));
        assert_eq!(kb.items().count(), 0);
    }

    #[test]
    fn missing_memory_does_not_stop_later_fields() {
        let mut kb = MemoryKnowledgeBase::new();
        let mut rec = record();
        rec.fields.remove("Memory");
        let report = run(&mut kb, &rec, &ItemRef::New, false).unwrap();

        assert_eq!(report.field("memory"), Some(&FieldOutcome::Missing));
        assert_eq!(report.fields.len(), FIELD_MAP.len());
        for key in ["instance_of", "manufacturer", "cores", "power", "os", IDENTIFIER_KEY] {
            assert_eq!(report.field(key), Some(&FieldOutcome::Written), "{key}");
        }
        assert_eq!(report.field("site"), Some(&FieldOutcome::Missing));
        assert_eq!(report.field("cpu"), Some(&FieldOutcome::Missing));
        assert_eq!(report.field("platform"), Some(&FieldOutcome::Written));
        assert_eq!(report.performance[0].rmax, FieldOutcome::Written);
        assert_eq!(report.performance[0].rpeak, FieldOutcome::Written);
    }

    #[test]
    fn rerun_on_same_item_writes_nothing_new() {
        let mut kb = MemoryKnowledgeBase::new();
        let first = run(&mut kb, &record(), &ItemRef::New, false).unwrap();
        let writes = kb.claim_writes();

        let again = run(&mut kb, &record(), &ItemRef::Existing(first.item.clone()), false).unwrap();
        assert!(!again.created);
        assert_eq!(kb.claim_writes(), writes);
        assert_eq!(again.written(), 0);
        assert_eq!(again.performance[0].rmax, FieldOutcome::Duplicate);
    }

    #[test]
    fn entry_without_tier_is_missing() {
        let mut kb = MemoryKnowledgeBase::new();
        let mut rec = record();
        rec.rank_entries.push(HistoryEntry { list_date: s!("06/2021"), columns: BTreeMap::new() });
        let report = run(&mut kb, &rec, &ItemRef::New, false).unwrap();
        assert_eq!(report.performance[1].rmax, FieldOutcome::Missing);
    }

    #[test]
    fn change_log_appends_before_marker() {
        let q = ItemId::parse("Q7").unwrap();
        assert_eq!(change_log_text("", &q), "* {{q|Q7}}\n<!-- End List -->\n");
        assert_eq!(
            change_log_text("* {{q|Q1}}\n<!-- End List -->\n", &q),
            "* {{q|Q1}}\n* {{q|Q7}}\n<!-- End List -->\n"
        );
    }

    #[test]
    fn change_log_retries_edit_conflicts() {
        let mut kb = MemoryKnowledgeBase::new();
        kb.fail_next_saves([KbError::EditConflict(s!("log")), KbError::Timeout(s!("log"))]);
        let report = run(&mut kb, &record(), &ItemRef::New, true).unwrap();
        assert_eq!(report.logged, Some(true));
        let page = kb.page(crate::config::consts::LOG_PAGE).unwrap();
        assert!(page.contains(&format!("{{{{q|{}}}}}", report.item)));
    }

    #[test]
    fn concurrent_append_is_kept() {
        let mut kb = MemoryKnowledgeBase::new();
        let page = crate::config::consts::LOG_PAGE;
        kb.set_page(page, "* {{q|Q900}}\n<!-- End List -->\n");
        kb.edit_after_next_read(page, "* {{q|Q900}}\n* {{q|Q901}}\n<!-- End List -->\n");

        let report = run(&mut kb, &record(), &ItemRef::New, true).unwrap();
        assert_eq!(report.logged, Some(true));
        let text = kb.page(page).unwrap();
        assert!(text.contains("{{q|Q901}}"), "{text}");
        assert!(text.contains(&format!("{{{{q|{}}}}}", report.item)), "{text}");
        assert!(text.ends_with("<!-- End List -->\n"));
    }

    #[test]
    fn change_log_gives_up_but_update_succeeds() {
        let mut kb = MemoryKnowledgeBase::new();
        kb.fail_next_saves((0..3).map(|_| KbError::EditConflict(s!("log"))));
        let report = run(&mut kb, &record(), &ItemRef::New, true).unwrap();
        assert_eq!(report.logged, Some(false));

        let mut kb = MemoryKnowledgeBase::new();
        kb.fail_next_saves([KbError::Rejected { code: s!("protectedpage"), info: s!() }]);
        let report = run(&mut kb, &record(), &ItemRef::New, true).unwrap();
        assert_eq!(report.logged, Some(false));
    }
}
