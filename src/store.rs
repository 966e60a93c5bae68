// src/store.rs
// Record cache. The cache is an optimization: readers treat every failure as a miss,
// writers swallow failures.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io: {0}")]
    Io(#[from] io::Error),
    #[error("invalid cache key `{0}`")]
    BadKey(String),
}

/// Byte-oriented key-value cache.
pub trait Cache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;
}

/// What a cached page describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheKind {
    System,
    Site,
}

impl CacheKind {
    pub fn tag(self) -> &'static str {
        match self {
            CacheKind::System => "sys",
            CacheKind::Site => "loc",
        }
    }
}

/// `"<namespace>-<kind>-<id>"`.
pub fn cache_key(namespace: &str, kind: CacheKind, id: &str) -> String {
    join!(namespace, "-", kind.tag(), "-", id)
}

/// One file per key under the store directory.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        ensure_directory(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path { &self.dir }

    fn path_for(&self, key: &str) -> Result<PathBuf, CacheError> {
        let ok = !key.is_empty()
            && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !ok {
            return Err(CacheError::BadKey(s!(key)));
        }
        Ok(self.dir.join(join!(key, ".json")))
    }
}

impl Cache for FileCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        // write-then-rename so a crash never leaves a half-written entry
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::other(format!("Path exists but is not a directory: {}", dir.display())));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}
