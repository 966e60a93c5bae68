// src/lib.rs

#[macro_use]
pub mod macros;

pub mod cli;
pub mod config;
pub mod core;
pub mod specs;

pub mod claims;
pub mod counter;
pub mod fetch;
pub mod log;
pub mod lookup;
pub mod progress;
pub mod record;
pub mod runner;
pub mod status;
pub mod store;
pub mod update;
pub mod wikibase;
