// src/config/options.rs
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

use super::consts::*;
use crate::lookup::{LookupError, LookupTables};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
}

/// Runtime settings. Every key is optional in the file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImporterOptions {
    pub source_url: String,
    pub api_url: String,
    pub concept_uri: String,
    /// Label languages for newly created items.
    pub languages: Vec<String>,
    /// Entity key written as the instance-of value of every item.
    pub instance_of: String,
    pub log_page: String,
    pub status_page: String,
    pub cache_namespace: String,
    pub store_dir: PathBuf,
    pub state_dir: PathBuf,
    pub window_size: u64,
    pub log_retries: u32,
    pub edit_summary: String,
    pub user_agent: String,
    /// Replaces the built-in lookup tables when set.
    pub lookup_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for ImporterOptions {
    fn default() -> Self {
        Self {
            source_url: s!(SOURCE_URL),
            api_url: s!(API_URL),
            concept_uri: s!(CONCEPT_URI),
            languages: LANGUAGES.iter().map(|l| s!(*l)).collect(),
            instance_of: s!(INSTANCE_OF),
            log_page: s!(LOG_PAGE),
            status_page: s!(STATUS_PAGE),
            cache_namespace: s!(CACHE_NAMESPACE),
            store_dir: PathBuf::from(STORE_DIR),
            state_dir: PathBuf::from(STATE_DIR),
            window_size: WINDOW_SIZE,
            log_retries: LOG_RETRIES,
            edit_summary: s!(EDIT_SUMMARY),
            user_agent: s!(USER_AGENT),
            lookup_path: None,
            timeout_secs: TIMEOUT_SECS,
        }
    }
}

impl ImporterOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let opts: Self = toml::from_str(text)?;
        if opts.window_size == 0 {
            return Err(ConfigError::Zero("window_size"));
        }
        Ok(opts)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Self::from_toml_str(&text)
    }

    /// An explicit path must exist; otherwise `top500_importer.toml` in the
    /// working directory is used when present, else the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(CONFIG_FILE);
                if local.is_file() { Self::load(local) } else { Ok(Self::default()) }
            }
        }
    }

    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

    pub fn lookup_tables(&self) -> Result<LookupTables, LookupError> {
        match &self.lookup_path {
            Some(path) => LookupTables::load(path),
            None => LookupTables::builtin(),
        }
    }

    pub fn log_file(&self) -> PathBuf { self.store_dir.join(LOG_FILE) }
}
