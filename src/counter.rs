// src/counter.rs
// Persisted "next identifier" marker, one plain-text file per batch partition.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::config::consts::COUNTER_PREFIX;

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("counter {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("counter {path} holds `{content}`, not an identifier")]
    Corrupt { path: String, content: String },
    #[error("partition {0} is out of range")]
    Range(u64),
}

/// Identifiers `[start, end)` assigned to one partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub partition: u64,
    pub start: u64,
    pub end: u64,
}

impl Window {
    /// `start = partition * size + 1`.
    pub fn new(partition: u64, size: u64) -> Result<Self, CounterError> {
        let start = partition
            .checked_mul(size)
            .and_then(|n| n.checked_add(1))
            .ok_or(CounterError::Range(partition))?;
        let end = start.checked_add(size).ok_or(CounterError::Range(partition))?;
        Ok(Self { partition, start, end })
    }

    pub fn len(&self) -> u64 { self.end - self.start }

    pub fn is_empty(&self) -> bool { self.start == self.end }
}

pub struct ProgressCounter {
    path: PathBuf,
}

impl ProgressCounter {
    pub fn new(state_dir: &Path, partition: u64) -> Self {
        Self { path: state_dir.join(format!("{COUNTER_PREFIX}.{partition}")) }
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn read(&self) -> Result<Option<u64>, CounterError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io(source)),
        };
        content
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CounterError::Corrupt { path: self.display(), content: s!(content.trim()) })
    }

    pub fn write(&self, next: u64) -> Result<(), CounterError> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, next.to_string()).map_err(|e| self.io(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io(e))
    }

    /// Next identifier to process in `window`. A missing counter is created at
    /// the window start; a stored value below the start is ignored.
    pub fn resume(&self, window: &Window) -> Result<u64, CounterError> {
        match self.read()? {
            Some(next) => Ok(next.max(window.start)),
            None => {
                self.write(window.start)?;
                Ok(window.start)
            }
        }
    }

    fn display(&self) -> String { self.path.display().to_string() }

    fn io(&self, source: io::Error) -> CounterError {
        CounterError::Io { path: self.display(), source }
    }
}
