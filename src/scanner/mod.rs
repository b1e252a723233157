pub mod archives;
pub mod derived_data;
pub mod device_support;
pub mod simulators;
pub mod utils;

use crate::config::Config;
use crate::entry::EntryTree;
use crate::events::ScanEvent;
use crate::model::{Location, ScanScope};
use crate::paths::XcodePaths;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::thread;

pub trait LocationScanner: Send + Sync {
    fn location(&self) -> Location;
    fn roots(&self) -> Vec<PathBuf>;
    /// Builds a fresh tree for this location. Never fails: missing roots give
    /// an empty tree, unreadable paths are counted in [`EntryTree::skipped`].
    fn scan(&self, config: &Config) -> EntryTree;
}

pub fn scanner_for(location: Location, paths: &XcodePaths) -> Box<dyn LocationScanner> {
    let paths = paths.clone();
    match location {
        Location::DeviceSupport => Box::new(device_support::DeviceSupportScanner { paths }),
        Location::DerivedData => Box::new(derived_data::DerivedDataScanner { paths }),
        Location::Archives => Box::new(archives::ArchivesScanner { paths }),
        Location::Simulators => Box::new(simulators::SimulatorsScanner { paths }),
    }
}

pub fn scan_location(location: Location, paths: &XcodePaths, config: &Config) -> EntryTree {
    let scanner = scanner_for(location, paths);
    tracing::info!("scanning {location} in {:?}", scanner.roots());
    let tree = scanner.scan(config);
    tracing::info!(
        "scanned {location}: {} entries, {} bytes, {} skipped",
        tree.leaf_count(),
        tree.total_size(),
        tree.skipped()
    );
    tree
}

/// Scans every location of `scope` in parallel and reports through `events`.
/// Returns only after all locations are done, so `BatchDidFinish` always
/// follows every `DidFinish`.
pub fn scan_locations(
    scope: ScanScope,
    paths: &XcodePaths,
    config: &Config,
    events: &mpsc::Sender<ScanEvent>,
) {
    if scope.is_batch() {
        let _ = events.send(ScanEvent::BatchWillBegin);
    }

    scope.locations().into_par_iter().for_each(|location| {
        let _ = events.send(ScanEvent::WillBegin {
            location,
            root: EntryTree::new(location),
        });
        let root = scan_location(location, paths, config);
        let _ = events.send(ScanEvent::DidFinish { location, root });
    });

    if scope.is_batch() {
        let _ = events.send(ScanEvent::BatchDidFinish);
    }
}

/// A scan running on its own thread.
pub struct ScanTask {
    pub events: mpsc::Receiver<ScanEvent>,
    handle: thread::JoinHandle<()>,
}

impl ScanTask {
    pub fn spawn(scope: ScanScope, paths: XcodePaths, config: Arc<Config>) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || scan_locations(scope, &paths, &config, &tx));
        Self { events: rx, handle }
    }

    /// Joins the worker once its events are drained. `false` when it
    /// panicked, in which case some locations never reported back.
    pub fn finish(self) -> bool {
        let clean = self.handle.join().is_ok();
        if !clean {
            tracing::error!("scan worker panicked");
        }
        clean
    }

    /// Blocks until the scan is done and returns every event in order.
    #[cfg(test)]
    pub fn wait(self) -> Vec<ScanEvent> {
        let events = self.events.iter().collect();
        self.finish();
        events
    }

    /// Wraps an existing channel, for driving consumers by hand.
    #[cfg(test)]
    pub fn from_channel(events: mpsc::Receiver<ScanEvent>) -> Self {
        Self {
            events,
            handle: thread::spawn(|| {}),
        }
    }
}
