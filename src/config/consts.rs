// src/config/consts.rs

// Source
pub const SOURCE_URL: &str = "https://www.top500.org";

// Knowledge base
pub const API_URL: &str = "https://www.wikidata.org/w/api.php";
pub const CONCEPT_URI: &str = "http://www.wikidata.org/entity/";
pub const LANGUAGES: [&str; 2] = ["en", "es"];
pub const INSTANCE_OF: &str = "supercomputer";
pub const EDIT_SUMMARY: &str = "edited using [[:d:User:TOP500 importer|TOP500 importer]]";

// Wiki pages
pub const LOG_PAGE: &str = "User:TOP500 importer/created";
pub const STATUS_PAGE: &str = "User:TOP500 importer/status";
pub const LOG_END_MARKER: &str = "<!-- End List -->";
pub const LOG_RETRIES: u32 = 3;

// Local cache
pub const STORE_DIR: &str = ".store";
pub const CACHE_NAMESPACE: &str = "top500";
pub const LOG_FILE: &str = "debug.log";

// Batch
pub const STATE_DIR: &str = ".";
pub const COUNTER_PREFIX: &str = "masscount";
pub const WINDOW_SIZE: u64 = 2000;

// Net
pub const USER_AGENT: &str = concat!("top500_importer/", env!("CARGO_PKG_VERSION"));
pub const TIMEOUT_SECS: u64 = 30;

pub const CONFIG_FILE: &str = "top500_importer.toml";
