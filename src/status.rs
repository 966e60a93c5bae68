// src/status.rs
//! Run status on the status wiki page, and the stop flag an interrupt sets.
//!
//! The page holds a single code. [`ShutdownGuard`] makes the final write
//! happen once, whichever path reaches it first.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{info, warn};

use crate::wikibase::{KbError, KnowledgeBase};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusCode {
    Started = 0,
    /// Also left behind by a run that ended in an error.
    Running = 1,
    Stopped = 2,
    WindowComplete = 128,
}

impl StatusCode {
    pub fn code(self) -> u8 { self as u8 }

    pub fn summary(self) -> &'static str {
        match self {
            StatusCode::Started => "update bot status: running",
            StatusCode::Running => "update bot status: error",
            StatusCode::Stopped => "update bot status: stopped",
            StatusCode::WindowComplete => "update bot status: ended one",
        }
    }

    /// Status matching a process exit code.
    pub fn from_exit(code: i32) -> Self {
        match code {
            0 => StatusCode::Started,
            2 => StatusCode::Stopped,
            128 => StatusCode::WindowComplete,
            _ => StatusCode::Running,
        }
    }
}

pub fn write_status<K: KnowledgeBase + ?Sized>(kb: &mut K, page: &str, status: StatusCode) -> Result<(), KbError> {
    kb.save_page(page, &status.code().to_string(), status.summary(), None)
}

/// Shared between the interrupt handler and the batch loop.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self { Self::default() }

    pub fn request(&self) { self.0.store(true, Ordering::SeqCst); }

    pub fn is_set(&self) -> bool { self.0.load(Ordering::SeqCst) }
}

/// Final status write, at most once.
pub struct ShutdownGuard {
    page: String,
    fired: AtomicBool,
}

impl ShutdownGuard {
    pub fn new(page: &str) -> Self {
        Self { page: s!(page), fired: AtomicBool::new(false) }
    }

    /// Best-effort write of `status`. Returns false when the guard already fired.
    pub fn finish<K: KnowledgeBase + ?Sized>(&self, kb: &mut K, status: StatusCode) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        match write_status(kb, &self.page, status) {
            Ok(()) => info!(status = status.code(), "status page updated"),
            Err(e) => warn!(status = status.code(), error = %e, "status page not updated"),
        }
        true
    }

    pub fn has_fired(&self) -> bool { self.fired.load(Ordering::SeqCst) }
}
