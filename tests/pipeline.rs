// tests/pipeline.rs
mod common;

use std::str::FromStr;

use bigdecimal::BigDecimal;
use top500_importer::{
    claims::{ClaimError, ClaimMapper, StatementValue},
    cli::{Mode, execute, exit},
    core::normalize::YearMonth,
    fetch::FetchError,
    specs,
    status::StopFlag,
    store::Cache,
    update::FieldOutcome,
    wikibase::{ItemId, ItemRef, KnowledgeBase, Labels, MemoryKnowledgeBase, PropertyId, Statement, Target},
};

use common::{FakeSite, SYSTEM_1, fetcher, importer, lookup};

fn statements_for<'a>(all: &'a [Statement], property: &str) -> Vec<&'a Statement> {
    all.iter().filter(|s| s.mainsnak.property.as_str() == property).collect()
}

fn q(id: &str) -> ItemId { ItemId::parse(id).unwrap() }

fn dec(s: &str) -> BigDecimal { BigDecimal::from_str(s).unwrap() }

#[test]
fn fixture_page_extracts() {
    let rec = specs::system::extract("1", SYSTEM_1).unwrap();
    assert_eq!(rec.title, "Acme One");
    assert_eq!(rec.platform, "Acme Box");
    assert_eq!(rec.field("Manufacturer"), Some("Acme"));
    assert_eq!(rec.field("Cores"), Some("128 Cores"));
    assert_eq!(rec.field("Power Consumption"), Some("10 kW"));
    assert_eq!(rec.field("Memory"), None);
    assert_eq!(rec.rank_entries.len(), 1);
    assert_eq!(rec.rank_entries[0].list_date, "11/2020");
    let perf = rec.rank_entries[0].performance().unwrap();
    assert_eq!((perf.rmax.as_str(), perf.rpeak.as_str()), ("1.1 PFlops", "1.5 PFlops"));
}

#[test]
fn second_fetch_comes_from_cache() {
    let f = fetcher(FakeSite::new().with_system(1, SYSTEM_1));
    let first = f.fetch_system("1").unwrap();
    let second = f.fetch_system("1").unwrap();
    assert_eq!(first, second);
    assert_eq!(f.source().requests(), vec![format!("{}/system/1", common::BASE)]);
    assert!(f.cache().get("top500-sys-1").unwrap().is_some());
}

#[test]
fn non_numeric_ids_touch_neither_network_nor_cache() {
    let f = fetcher(FakeSite::new().with_system(1, SYSTEM_1));
    for bad in ["", "1a", " 1", "../1"] {
        assert_eq!(f.fetch_system(bad), Err(FetchError::InvalidId(bad.to_string())));
        assert!(matches!(f.fetch_site(bad), Err(FetchError::InvalidId(_))));
    }
    assert!(f.source().requests().is_empty());
    assert_eq!(f.cache().gets(), 0);
}

#[test]
fn cache_write_failure_is_not_fatal() {
    let f = fetcher(FakeSite::new().with_system(1, SYSTEM_1));
    f.cache().fail_writes(true);
    assert!(f.fetch_system("1").is_ok());
    assert!(f.fetch_system("1").is_ok());
    assert_eq!(f.source().requests().len(), 2);
}

#[test]
fn end_to_end_claims() {
    let dir = tempfile::tempdir().unwrap();
    let mut imp = importer(FakeSite::new().with_system(1, SYSTEM_1), dir.path(), 2000);

    let report = imp.run_single("1", &ItemRef::New, &StopFlag::new()).unwrap();
    assert!(report.created);
    assert_eq!(report.field("memory"), Some(&FieldOutcome::Missing));
    assert!(matches!(report.field("cpu"), Some(FieldOutcome::Failed(ClaimError::UnknownEntity(_)))));

    let item = imp.kb().item(&report.item).unwrap();
    assert_eq!(item.labels.get("en").map(String::as_str), Some("Acme One"));
    let all = &item.statements;

    let manufacturer = statements_for(all, "P176");
    assert_eq!(manufacturer.len(), 1);
    assert_eq!(manufacturer[0].mainsnak.target, Target::Item(q("Q900001")));

    let cores = statements_for(all, "P1141");
    assert_eq!(cores[0].mainsnak.target, Target::Quantity { amount: dec("128"), unit: None });

    let power = statements_for(all, "P2791");
    assert_eq!(power[0].mainsnak.target, Target::Quantity { amount: dec("10"), unit: Some(q("Q3079")) });

    let ident = statements_for(all, "P7307");
    assert_eq!(ident[0].mainsnak.target, Target::Text(String::from("1")));

    let perf = statements_for(all, "P2149");
    assert_eq!(perf.len(), 2);
    let nov_2020 = Target::Time(YearMonth { year: 2020, month: 11 });
    for (statement, amount, role) in [(perf[0], "1.1", "Q67201233"), (perf[1], "1.5", "Q67201237")] {
        assert_eq!(statement.mainsnak.target, Target::Quantity { amount: dec(amount), unit: Some(q("Q3095871")) });
        let targets: Vec<&Target> = statement.qualifiers.iter().map(|s| &s.target).collect();
        assert!(targets.contains(&&Target::Item(q(role))), "{targets:?}");
        assert!(targets.contains(&&nov_2020), "{targets:?}");
    }

    // single mode leaves the change log alone
    assert_eq!(imp.kb().page(&imp.options().log_page), None);
}

#[test]
fn unknown_record_is_an_error_in_single_mode() {
    let dir = tempfile::tempdir().unwrap();
    let mut imp = importer(FakeSite::new(), dir.path(), 2000);
    assert!(imp.run_single("77", &ItemRef::New, &StopFlag::new()).is_err());
    assert_eq!(imp.kb().items().count(), 0);
}

#[test]
fn reimport_onto_existing_item_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut imp = importer(FakeSite::new().with_system(1, SYSTEM_1), dir.path(), 2000);
    let first = imp.run_single("1", &ItemRef::New, &StopFlag::new()).unwrap();
    let writes = imp.kb().claim_writes();

    let again = imp.run_single("1", &ItemRef::Existing(first.item.clone()), &StopFlag::new()).unwrap();
    assert_eq!(again.item, first.item);
    assert_eq!(again.written(), 0);
    assert_eq!(imp.kb().claim_writes(), writes);
}

#[test]
fn add_claim_twice_writes_once() {
    let lookup = lookup();
    let mut kb = MemoryKnowledgeBase::new();
    let item = kb.create_item(&Labels::new(), "").unwrap();
    let target = ItemRef::Existing(item.clone());
    let value = StatementValue::Statement(String::from("Acme")).into();

    let mut mapper = ClaimMapper::new(&mut kb, &lookup, "test");
    assert!(mapper.add_claim(&target, "manufacturer", &value, false).is_ok());
    assert!(matches!(mapper.add_claim(&target, "manufacturer", &value, false), Err(ClaimError::Duplicate(_))));

    let p176 = PropertyId::parse("P176").unwrap();
    assert_eq!(kb.statements(&item, &p176).unwrap().len(), 1);
    assert_eq!(kb.claim_writes(), 1);
}

#[test]
fn interrupted_single_run_reports_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let mut imp = importer(FakeSite::new().with_system(1, SYSTEM_1), dir.path(), 2000);
    let stop = StopFlag::new();
    stop.request();

    let mode = Mode::Single { source: String::from("1"), item: ItemRef::New };
    assert_eq!(execute(&mut imp, mode, &stop), exit::INTERRUPTED);
    assert_eq!(imp.kb().page(&imp.options().status_page), Some("2"));
    assert_eq!(imp.kb().items().count(), 0);
    assert!(imp.fetcher().source().requests().is_empty());
}

#[test]
fn finished_single_run_reports_running_code() {
    let dir = tempfile::tempdir().unwrap();
    let mut imp = importer(FakeSite::new().with_system(1, SYSTEM_1), dir.path(), 2000);

    let mode = Mode::Single { source: String::from("1"), item: ItemRef::New };
    assert_eq!(execute(&mut imp, mode, &StopFlag::new()), exit::OK);
    assert_eq!(imp.kb().page(&imp.options().status_page), Some("0"));
    assert_eq!(imp.kb().items().count(), 1);
}
