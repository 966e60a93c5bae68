// src/cli.rs
use std::{ffi::OsString, path::PathBuf};

use clap::{CommandFactory, Parser, error::ErrorKind};
use color_eyre::eyre::{Result, WrapErr};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    config::ImporterOptions,
    core::net::{HttpSource, SourceClient},
    fetch::Fetcher,
    progress::Progress,
    record::is_valid_id,
    runner::Importer,
    status::{ShutdownGuard, StatusCode, StopFlag, write_status},
    store::{Cache, FileCache},
    wikibase::{ItemRef, KnowledgeBase, MemoryKnowledgeBase, WikibaseApi},
};

pub mod exit {
    pub const OK: i32 = 0;
    /// Bad argument combination, or the run itself failed.
    pub const FAILURE: i32 = 1;
    pub const INTERRUPTED: i32 = 2;
    pub const MALFORMED: i32 = 3;
    pub const WINDOW_COMPLETE: i32 = 128;
}

#[derive(Debug, Parser)]
#[command(name = "top500_importer", version, about = "Import TOP500 supercomputer records into a Wikibase")]
pub struct Args {
    /// TOML settings file (default: ./top500_importer.toml if present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write to an in-memory knowledge base instead of the live site
    #[arg(long)]
    pub dry_run: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// TOP500 system id to import
    #[arg(short = 't', long = "top500", value_name = "SOURCE-ID")]
    pub source: Option<String>,

    /// Target item, or Q0 to create one
    #[arg(short = 'i', long = "item", value_name = "ITEM")]
    pub item: Option<String>,

    /// Import a whole partition window
    #[arg(long, value_name = "PARTITION", conflicts_with_all = ["source", "item"])]
    pub mass: Option<u64>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    Help,
    Single { source: String, item: ItemRef },
    Batch { partition: u64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgError {
    #[error("-t and -i must be given together")]
    Unpaired,
    #[error("`{0}` is not a TOP500 system id")]
    BadSource(String),
    #[error("`{0}` is not an item id (use Q0 to create one)")]
    BadItem(String),
}

impl Args {
    pub fn mode(&self) -> Result<Mode, ArgError> {
        if let Some(partition) = self.mass {
            return Ok(Mode::Batch { partition });
        }
        match (&self.source, &self.item) {
            (None, None) => Ok(Mode::Help),
            (Some(source), Some(item)) => {
                if !is_valid_id(source) {
                    return Err(ArgError::BadSource(source.clone()));
                }
                let item = ItemRef::parse(item).ok_or_else(|| ArgError::BadItem(item.clone()))?;
                Ok(Mode::Single { source: source.clone(), item })
            }
            _ => Err(ArgError::Unpaired),
        }
    }
}

/// Parse, wire, run. The returned value is the process exit code; `Err` is a
/// startup failure.
pub fn run<I, T>(argv: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = match Args::try_parse_from(argv) {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit::OK,
                _ => exit::MALFORMED,
            };
            e.print()?;
            return Ok(code);
        }
    };

    let mode = match args.mode() {
        Ok(Mode::Help) => {
            Args::command().print_help()?;
            println!();
            return Ok(exit::OK);
        }
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(exit::FAILURE);
        }
    };

    let options = ImporterOptions::discover(args.config.as_deref()).wrap_err("loading configuration")?;
    crate::log::init(&options.store_dir, args.verbose).wrap_err("initializing logging")?;
    let lookup = options.lookup_tables().wrap_err("loading lookup tables")?;

    let source = HttpSource::new(&options.user_agent, options.timeout()).wrap_err("building HTTP client")?;
    let cache = FileCache::open(&options.store_dir).wrap_err("opening record cache")?;
    let fetcher = Fetcher::new(source, cache, &options.source_url, &options.cache_namespace);

    if args.dry_run {
        info!("dry run: writes go to an in-memory knowledge base");
        drive(Importer::new(fetcher, MemoryKnowledgeBase::new(), lookup, options), mode)
    } else {
        let kb = WikibaseApi::connect(&options.api_url, &options.concept_uri, &options.user_agent, options.timeout())
            .wrap_err("connecting to the knowledge base")?;
        drive(Importer::new(fetcher, kb, lookup, options), mode)
    }
}

fn drive<S: SourceClient, C: Cache, K: KnowledgeBase>(mut importer: Importer<S, C, K>, mode: Mode) -> Result<i32> {
    let stop = StopFlag::new();
    let handler = stop.clone();
    ctrlc::set_handler(move || handler.request()).wrap_err("installing interrupt handler")?;
    Ok(execute(&mut importer, mode, &stop))
}

/// Run `mode` between the two status-page writes and return the exit code.
/// A stop request seen by the end of the run wins over the mode's own outcome.
pub fn execute<S: SourceClient, C: Cache, K: KnowledgeBase>(importer: &mut Importer<S, C, K>, mode: Mode, stop: &StopFlag) -> i32 {
    let status_page = importer.options().status_page.clone();
    let guard = ShutdownGuard::new(&status_page);
    if let Err(e) = write_status(importer.kb_mut(), &status_page, StatusCode::Started) {
        warn!(error = %e, "status page not updated");
    }

    let code = match mode {
        Mode::Help => exit::OK,
        Mode::Single { source, item } => match importer.run_single(&source, &item, stop) {
            Ok(report) => {
                println!("{} updated from {source}: {} written, {} failed", report.item, report.written(), report.failed());
                exit::OK
            }
            Err(e) => {
                error!(%source, %item, error = %e, "single import failed");
                exit::FAILURE
            }
        },
        Mode::Batch { partition } => match importer.run_batch(partition, stop, &mut CliProgress::default()) {
            Ok(report) if report.completed => exit::WINDOW_COMPLETE,
            Ok(_) => exit::INTERRUPTED,
            Err(e) => {
                error!(partition, error = %e, "batch could not start");
                exit::FAILURE
            }
        },
    };
    let code = if stop.is_set() && code != exit::WINDOW_COMPLETE { exit::INTERRUPTED } else { code };

    guard.finish(importer.kb_mut(), StatusCode::from_exit(code));
    code
}

/// One line per identifier on stdout.
#[derive(Default)]
struct CliProgress {
    total: u64,
    seen: u64,
}

impl CliProgress {
    fn tick(&mut self) -> String {
        self.seen += 1;
        format!("[{}/{}]", self.seen, self.total)
    }
}

impl Progress for CliProgress {
    fn begin(&mut self, total: u64) { self.total = total; }

    fn log(&mut self, msg: &str) { println!("{msg}"); }

    fn item_done(&mut self, id: u64, item: &str) {
        println!("{} {id} -> {item}", self.tick());
    }

    fn item_failed(&mut self, id: u64, reason: &str) {
        println!("{} {id} failed: {reason}", self.tick());
    }

    fn item_missing(&mut self, id: u64) {
        println!("{} {id} not found", self.tick());
    }

    fn finish(&mut self, completed: bool) {
        if completed { println!("Everything OK"); } else { println!("Stopped after {} ids", self.seen); }
    }
}
