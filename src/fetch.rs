// src/fetch.rs
//! Cache-fronted page fetcher.
//!
//! Once a page has been cached it is authoritative: there is no TTL and no
//! invalidation. A missing or undecodable entry falls through to a live fetch,
//! and a successful extraction is written back best-effort.

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::net::SourceClient;
use crate::record::{Record, is_valid_id};
use crate::specs::{self, ExtractError};
use crate::store::{Cache, CacheKind, cache_key};

/// Every variant means "not found" to callers; the variant says why.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("identifier `{0}` is not numeric")]
    InvalidId(String),
    #[error("source answered HTTP {0}")]
    Status(u16),
    #[error("source unreachable: {0}")]
    Transport(String),
    #[error("page layout not recognized: {0}")]
    Extract(#[from] ExtractError),
}

pub struct Fetcher<S, C> {
    source: S,
    cache: C,
    base_url: String,
    namespace: String,
}

impl<S: SourceClient, C: Cache> Fetcher<S, C> {
    pub fn new(source: S, cache: C, base_url: &str, namespace: &str) -> Self {
        Self {
            source,
            cache,
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace: s!(namespace),
        }
    }

    pub fn source(&self) -> &S { &self.source }
    pub fn cache(&self) -> &C { &self.cache }

    pub fn fetch_system(&self, id: &str) -> Result<Record, FetchError> {
        self.fetch(CacheKind::System, id)
    }

    pub fn fetch_site(&self, id: &str) -> Result<Record, FetchError> {
        self.fetch(CacheKind::Site, id)
    }

    fn fetch(&self, kind: CacheKind, id: &str) -> Result<Record, FetchError> {
        if !is_valid_id(id) {
            return Err(FetchError::InvalidId(s!(id)));
        }
        let key = cache_key(&self.namespace, kind, id);

        if let Some(record) = self.cached(&key) {
            return Ok(record);
        }

        let url = match kind {
            CacheKind::System => join!(&self.base_url, "/system/", id),
            CacheKind::Site => join!(&self.base_url, "/site/", id),
        };
        let page = self.source.get(&url).map_err(FetchError::Transport)?;
        if !page.is_ok() {
            return Err(FetchError::Status(page.status));
        }

        let record = match kind {
            CacheKind::System => specs::system::extract(id, &page.body)?,
            CacheKind::Site => specs::site::extract(id, &page.body)?,
        };

        self.remember(&key, &record);
        Ok(record)
    }

    fn cached(&self, key: &str) -> Option<Record> {
        let bytes = match self.cache.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                debug!(key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_slice::<Record>(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(key, error = %e, "cache entry undecodable, refetching");
                None
            }
        }
    }

    fn remember(&self, key: &str, record: &Record) {
        let write = serde_json::to_vec(record)
            .map_err(|e| e.to_string())
            .and_then(|bytes| self.cache.set(key, &bytes).map_err(|e| e.to_string()));
        if let Err(e) = write {
            debug!(key, error = %e, "cache write skipped");
        }
    }
}
