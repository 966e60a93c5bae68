// tests/common/mod.rs
#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    io,
    path::Path,
};

use top500_importer::{
    config::ImporterOptions,
    core::net::{Page, SourceClient},
    fetch::Fetcher,
    lookup::LookupTables,
    runner::Importer,
    store::{Cache, CacheError},
    wikibase::MemoryKnowledgeBase,
};

pub const BASE: &str = "https://top500.test";
pub const SYSTEM_1: &str = include_str!("../fixtures/system_1.html");
const LOOKUP: &str = include_str!("../fixtures/lookup.toml");

/// Serves canned pages by URL; anything else is a 404. Records every request.
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Self { Self::default() }

    pub fn with_system(mut self, id: u64, html: &str) -> Self {
        self.pages.insert(format!("{BASE}/system/{id}"), html.to_string());
        self
    }

    pub fn with_site(mut self, id: u64, html: &str) -> Self {
        self.pages.insert(format!("{BASE}/site/{id}"), html.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> { self.requests.borrow().clone() }
}

impl SourceClient for FakeSite {
    fn get(&self, url: &str) -> Result<Page, String> {
        self.requests.borrow_mut().push(url.to_string());
        Ok(match self.pages.get(url) {
            Some(body) => Page { status: 200, body: body.clone() },
            None => Page { status: 404, body: String::from("Not Found") },
        })
    }
}

/// In-process cache that counts its traffic.
#[derive(Default)]
pub struct MemoryCache {
    entries: RefCell<HashMap<String, Vec<u8>>>,
    gets: Cell<usize>,
    sets: Cell<usize>,
    fail_writes: Cell<bool>,
}

impl MemoryCache {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, key: &str, value: &[u8]) {
        self.entries.borrow_mut().insert(key.to_string(), value.to_vec());
    }

    pub fn gets(&self) -> usize { self.gets.get() }
    pub fn sets(&self) -> usize { self.sets.get() }

    /// Make every later `set` fail.
    pub fn fail_writes(&self, fail: bool) { self.fail_writes.set(fail); }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.gets.set(self.gets.get() + 1);
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.sets.set(self.sets.get() + 1);
        if self.fail_writes.get() {
            return Err(CacheError::Io(io::Error::other("cache write refused")));
        }
        self.insert(key, value);
        Ok(())
    }
}

pub fn lookup() -> LookupTables {
    LookupTables::from_toml_str(LOOKUP).unwrap()
}

pub fn fetcher(site: FakeSite) -> Fetcher<FakeSite, MemoryCache> {
    Fetcher::new(site, MemoryCache::new(), BASE, "top500")
}

pub fn options(state_dir: &Path, window_size: u64) -> ImporterOptions {
    ImporterOptions {
        source_url: BASE.to_string(),
        state_dir: state_dir.to_path_buf(),
        store_dir: state_dir.join(".store"),
        window_size,
        ..ImporterOptions::default()
    }
}

pub fn importer(site: FakeSite, state_dir: &Path, window_size: u64) -> Importer<FakeSite, MemoryCache, MemoryKnowledgeBase> {
    Importer::new(fetcher(site), MemoryKnowledgeBase::new(), lookup(), options(state_dir, window_size))
}
