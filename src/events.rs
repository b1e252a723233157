//! Notifications pushed from the background workers to whoever drives them.

use crate::cleaner::DeletionReport;
use crate::entry::{DeletionTarget, EntryTree};
use crate::model::Location;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ScanEvent {
    /// Sent before any per-location event of an "all" scan.
    BatchWillBegin,
    /// Sent before the location's roots are touched; `root` is still empty.
    WillBegin { location: Location, root: EntryTree },
    /// Carries the finished tree. The receiver takes ownership of it.
    DidFinish { location: Location, root: EntryTree },
    /// Sent once every location of an "all" scan has finished.
    BatchDidFinish,
}

#[derive(Debug, Clone)]
pub enum DeletionEvent {
    Started {
        total: usize,
        bytes: u64,
    },
    ItemStarted {
        index: usize,
        target: DeletionTarget,
    },
    ItemSucceeded {
        index: usize,
        bytes: u64,
    },
    ItemFailed {
        index: usize,
        path: PathBuf,
        reason: String,
    },
    Finished(DeletionReport),
}
