// src/progress.rs
/// Progress reporting for batch runs.
/// The CLI implements this to print a running tally; tests record calls.
pub trait Progress {
    /// Called at the start with the number of identifiers left in the window.
    fn begin(&mut self, _total: u64) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// Record fetched and the item updated (`item` is the created item id).
    fn item_done(&mut self, _id: u64, _item: &str) {}

    /// Record fetched but the update could not start.
    fn item_failed(&mut self, _id: u64, _reason: &str) {}

    /// No page, or a page that could not be read, for this identifier.
    fn item_missing(&mut self, _id: u64) {}

    /// Called at the end, completed or interrupted.
    fn finish(&mut self, _completed: bool) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
