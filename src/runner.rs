// src/runner.rs
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::ImporterOptions,
    core::net::SourceClient,
    counter::{CounterError, ProgressCounter, Window},
    fetch::{FetchError, Fetcher},
    lookup::LookupTables,
    progress::Progress,
    status::StopFlag,
    store::Cache,
    update::{ItemUpdater, UpdateError, UpdateReport},
    wikibase::{ItemRef, KnowledgeBase},
};

#[derive(Debug, Error)]
pub enum SingleError {
    #[error("record {id} not found: {source}")]
    Fetch { id: String, source: FetchError },
    #[error(transparent)]
    Update(#[from] UpdateError),
    #[error("stopped before record {0} was imported")]
    Interrupted(String),
}

/// Outcome of one batch invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport {
    pub window: Window,
    pub resumed_at: u64,
    /// Identifiers advanced past in this run.
    pub processed: u64,
    pub updated: u64,
    pub failed: u64,
    pub missing: u64,
    /// The counter reached the window end.
    pub completed: bool,
}

/// Fetcher, knowledge base and tables wired together.
pub struct Importer<S, C, K> {
    fetcher: Fetcher<S, C>,
    kb: K,
    lookup: LookupTables,
    options: ImporterOptions,
}

impl<S: SourceClient, C: Cache, K: KnowledgeBase> Importer<S, C, K> {
    pub fn new(fetcher: Fetcher<S, C>, kb: K, lookup: LookupTables, options: ImporterOptions) -> Self {
        Self { fetcher, kb, lookup, options }
    }

    pub fn options(&self) -> &ImporterOptions { &self.options }
    pub fn fetcher(&self) -> &Fetcher<S, C> { &self.fetcher }
    pub fn kb(&self) -> &K { &self.kb }
    pub fn kb_mut(&mut self) -> &mut K { &mut self.kb }

    /// One record onto one item; no change-log entry. A stop requested
    /// before the update starts leaves the item untouched; once started the
    /// record is finished.
    pub fn run_single(&mut self, source_id: &str, target: &ItemRef, stop: &StopFlag) -> Result<UpdateReport, SingleError> {
        if stop.is_set() {
            return Err(SingleError::Interrupted(s!(source_id)));
        }
        let record = self
            .fetcher
            .fetch_system(source_id)
            .map_err(|source| SingleError::Fetch { id: s!(source_id), source })?;
        if stop.is_set() {
            return Err(SingleError::Interrupted(s!(source_id)));
        }
        info!(source = source_id, %target, title = %record.title, "single update");
        let report = ItemUpdater::new(&mut self.kb, &self.lookup, &self.options).update_item(&record, target, false)?;
        Ok(report)
    }

    /// Walk the partition's window from its persisted counter, creating one
    /// item per found record. The counter is advanced after every identifier,
    /// whatever happened to it. `stop` is honored between identifiers.
    pub fn run_batch(&mut self, partition: u64, stop: &StopFlag, progress: &mut dyn Progress) -> Result<BatchReport, CounterError> {
        let window = Window::new(partition, self.options.window_size)?;
        let counter = ProgressCounter::new(&self.options.state_dir, partition);
        let mut next = counter.resume(&window)?;

        info!(partition, start = window.start, end = window.end, next, "batch window");
        progress.begin(window.end.saturating_sub(next));

        let mut report = BatchReport {
            window,
            resumed_at: next,
            processed: 0,
            updated: 0,
            failed: 0,
            missing: 0,
            completed: false,
        };

        while next < window.end {
            if stop.is_set() {
                warn!(partition, next, "stop requested");
                progress.log("stop requested");
                break;
            }
            let id = next;
            match self.fetcher.fetch_system(&id.to_string()) {
                Err(e) => {
                    debug!(id, error = %e, "no record");
                    report.missing += 1;
                    progress.item_missing(id);
                }
                Ok(record) => {
                    let mut updater = ItemUpdater::new(&mut self.kb, &self.lookup, &self.options);
                    match updater.update_item(&record, &ItemRef::New, true) {
                        Ok(done) => {
                            report.updated += 1;
                            progress.item_done(id, done.item.as_str());
                        }
                        Err(e) => {
                            warn!(id, error = %e, "record not imported");
                            report.failed += 1;
                            progress.item_failed(id, &e.to_string());
                        }
                    }
                }
            }

            next = id + 1;
            report.processed += 1;
            if let Err(e) = counter.write(next) {
                warn!(partition, next, error = %e, "counter not persisted");
            }
        }

        report.completed = next >= window.end;
        info!(
            partition,
            processed = report.processed,
            updated = report.updated,
            failed = report.failed,
            missing = report.missing,
            completed = report.completed,
            "batch finished"
        );
        progress.finish(report.completed);
        Ok(report)
    }
}
