use crate::config::Config;
use crate::entry::DeletionTarget;
use crate::error::CleanError;
use crate::events::DeletionEvent;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Permanently remove files.
    Remove,
    /// Move files to the Trash.
    Trash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub succeeded: usize,
    pub bytes_freed: u64,
    pub failures: Vec<DeletionFailure>,
}

impl DeletionReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A deletion batch running on its own thread.
pub struct DeletionTask {
    pub events: mpsc::Receiver<DeletionEvent>,
    handle: thread::JoinHandle<DeletionReport>,
}

impl DeletionTask {
    pub fn spawn(targets: Vec<DeletionTarget>, mode: DeleteMode, config: Arc<Config>) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || delete_entries(&targets, mode, &config, &tx));
        Self { events: rx, handle }
    }

    /// Joins the worker. `None` when it panicked before producing a report.
    pub fn finish(self) -> Option<DeletionReport> {
        match self.handle.join() {
            Ok(report) => Some(report),
            Err(_) => {
                tracing::error!("deletion worker panicked");
                None
            }
        }
    }

    /// Blocks until the batch is done. Events not yet received are dropped.
    #[cfg(test)]
    pub fn wait(self) -> DeletionReport {
        self.finish().unwrap_or_default()
    }

    /// Wraps an existing channel, for driving consumers by hand.
    #[cfg(test)]
    pub fn from_channel(events: mpsc::Receiver<DeletionEvent>) -> Self {
        Self {
            events,
            handle: thread::spawn(DeletionReport::default),
        }
    }
}

/// Deletes every target in order. A failing target is recorded and the batch
/// moves on; the returned report lists every failure. Targets that would
/// remove an excluded path are refused.
pub fn delete_entries(
    targets: &[DeletionTarget],
    mode: DeleteMode,
    config: &Config,
    events: &mpsc::Sender<DeletionEvent>,
) -> DeletionReport {
    let total_bytes = targets.iter().map(|t| t.size).sum();
    tracing::info!(
        "deleting {} entries ({total_bytes} bytes, {mode:?})",
        targets.len()
    );
    let _ = events.send(DeletionEvent::Started {
        total: targets.len(),
        bytes: total_bytes,
    });

    let mut report = DeletionReport::default();
    for (index, target) in targets.iter().enumerate() {
        let _ = events.send(DeletionEvent::ItemStarted {
            index,
            target: target.clone(),
        });

        let outcome = if config.protects(&target.path) {
            Err(CleanError::Excluded(target.path.clone()))
        } else {
            delete_path(&target.path, mode)
        };
        match outcome {
            Ok(()) => {
                tracing::debug!("deleted {}", target.path.display());
                report.succeeded += 1;
                report.bytes_freed += target.size;
                let _ = events.send(DeletionEvent::ItemSucceeded {
                    index,
                    bytes: target.size,
                });
            }
            Err(err) => {
                tracing::warn!("failed to delete {}: {err}", target.path.display());
                let reason = err.to_string();
                report.failures.push(DeletionFailure {
                    path: target.path.clone(),
                    reason: reason.clone(),
                });
                let _ = events.send(DeletionEvent::ItemFailed {
                    index,
                    path: target.path.clone(),
                    reason,
                });
            }
        }
    }

    tracing::info!(
        "deletion finished: {} succeeded, {} failed",
        report.succeeded,
        report.failures.len()
    );
    let _ = events.send(DeletionEvent::Finished(report.clone()));
    report
}

/// Removes a file or a whole directory in one operation.
fn delete_path(path: &Path, mode: DeleteMode) -> Result<(), CleanError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| CleanError::unreadable(path, e))?;
    match mode {
        DeleteMode::Trash => trash::delete(path).map_err(|e| {
            CleanError::unreadable(path, std::io::Error::other(e.to_string()))
        }),
        DeleteMode::Remove if metadata.is_dir() => {
            fs::remove_dir_all(path).map_err(|e| CleanError::unreadable(path, e))
        }
        DeleteMode::Remove => fs::remove_file(path).map_err(|e| CleanError::unreadable(path, e)),
    }
}
