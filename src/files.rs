use crate::cleaner::{DeleteMode, DeletionTask};
use crate::config::Config;
use crate::entry::{DeletionTarget, EntryId, EntryTree};
use crate::events::ScanEvent;
use crate::model::{InstalledVersion, Location, ScanScope};
use crate::paths::XcodePaths;
use crate::scanner::ScanTask;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Owns the latest tree of every scanned location and the aggregate sizes
/// derived from them. Lives on the thread that drives the UI; background
/// workers hand finished trees back through [`Self::absorb`].
#[derive(Debug)]
pub struct XcodeFiles {
    paths: XcodePaths,
    config: Arc<Config>,
    trees: BTreeMap<Location, EntryTree>,
    installed: Vec<InstalledVersion>,
}

impl XcodeFiles {
    pub fn new(paths: XcodePaths, config: Config) -> Self {
        Self {
            paths,
            config: Arc::new(config),
            trees: BTreeMap::new(),
            installed: Vec::new(),
        }
    }

    pub fn paths(&self) -> &XcodePaths {
        &self.paths
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scan_files(&self, scope: ScanScope) -> ScanTask {
        ScanTask::spawn(scope, self.paths.clone(), Arc::clone(&self.config))
    }

    /// Applies a scan notification. A location that starts scanning shows
    /// an empty root until the finished tree replaces it whole; on a rescan
    /// the old tree is emptied in place so its root keeps its id.
    pub fn absorb(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::WillBegin { location, root } => match self.trees.get_mut(&location) {
                Some(tree) => tree.remove_all(tree.root()),
                None => {
                    self.trees.insert(location, root);
                }
            },
            ScanEvent::DidFinish { location, root } => {
                self.trees.insert(location, root);
            }
            ScanEvent::BatchWillBegin | ScanEvent::BatchDidFinish => {}
        }
    }

    pub fn tree(&self, location: Location) -> Option<&EntryTree> {
        self.trees.get(&location)
    }

    pub fn trees(&self) -> impl Iterator<Item = (Location, &EntryTree)> {
        self.trees.iter().map(|(l, t)| (*l, t))
    }

    pub fn toggle(&mut self, location: Location, id: EntryId) {
        if let Some(tree) = self.trees.get_mut(&location) {
            tree.toggle(id);
        }
    }

    pub fn select_all(&mut self) {
        for tree in self.trees.values_mut() {
            let root = tree.root();
            tree.select_with_children(root);
        }
    }

    pub fn deselect_all(&mut self) {
        for tree in self.trees.values_mut() {
            let root = tree.root();
            tree.deselect_with_children(root);
        }
    }

    pub fn total_size(&self) -> u64 {
        self.trees.values().map(EntryTree::total_size).sum()
    }

    pub fn selected_size(&self) -> u64 {
        self.trees.values().map(EntryTree::selected_size).sum()
    }

    pub fn skipped(&self) -> usize {
        self.trees.values().map(EntryTree::skipped).sum()
    }

    pub fn deletion_targets(&self) -> Vec<DeletionTarget> {
        self.trees
            .values()
            .flat_map(EntryTree::deletion_targets)
            .collect()
    }

    pub fn delete_selected_entries(&self, mode: DeleteMode) -> DeletionTask {
        DeletionTask::spawn(self.deletion_targets(), mode, Arc::clone(&self.config))
    }

    pub fn installed(&self) -> &[InstalledVersion] {
        &self.installed
    }

    pub fn set_installed(&mut self, installed: Vec<InstalledVersion>) {
        self.installed = installed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Selection;
    use anyhow::Result;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_file(path: &Path, bytes: usize) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        File::create(path)?.write_all(&vec![0u8; bytes])?;
        Ok(())
    }

    fn scanned(dev: &Path) -> XcodeFiles {
        let mut files = XcodeFiles::new(XcodePaths::new(dev), Config::default());
        for event in files.scan_files(ScanScope::All).wait() {
            files.absorb(event);
        }
        files
    }

    fn fixture(dev: &Path) -> Result<()> {
        write_file(&dev.join("Xcode/iOS DeviceSupport/16.4 (20E247)/a"), 100)?;
        write_file(&dev.join("Xcode/iOS DeviceSupport/17.0 (21A329)/a"), 200)?;
        write_file(&dev.join("Xcode/DerivedData/App-abcdefghijklmnopqrstuvwxyz/b"), 300)?;
        write_file(&dev.join("Xcode/Archives/2024-01-02/App.xcarchive/c"), 400)?;
        write_file(&dev.join("CoreSimulator/Devices/AAAA/data/d"), 500)?;
        Ok(())
    }

    #[test]
    fn aggregates_follow_default_selection() -> Result<()> {
        let dir = tempdir()?;
        fixture(dir.path())?;
        let files = scanned(dir.path());

        assert_eq!(files.trees().count(), 4);
        assert_eq!(files.total_size(), 1500);
        // Older device support + all derived data.
        assert_eq!(files.selected_size(), 400);
        assert!(files.selected_size() <= files.total_size());
        Ok(())
    }

    #[test]
    fn rescan_empties_the_shown_tree() -> Result<()> {
        let dir = tempdir()?;
        fixture(dir.path())?;
        let mut files = scanned(dir.path());
        assert_eq!(files.tree(Location::Archives).map(EntryTree::total_size), Some(400));

        files.absorb(ScanEvent::WillBegin {
            location: Location::Archives,
            root: EntryTree::new(Location::Archives),
        });

        let tree = files.tree(Location::Archives).expect("archives kept");
        assert!(tree.is_empty());
        assert_eq!(tree.total_size(), 0);
        assert_eq!(tree.skipped(), 0);
        assert_eq!(files.total_size(), 1100);
        Ok(())
    }

    #[test]
    fn selected_equals_total_only_when_everything_selected() -> Result<()> {
        let dir = tempdir()?;
        fixture(dir.path())?;
        let mut files = scanned(dir.path());

        files.select_all();
        assert_eq!(files.selected_size(), files.total_size());

        let archives = files.tree(Location::Archives).map(|t| t.children(t.root())[0]);
        if let Some(day) = archives {
            files.toggle(Location::Archives, day);
        }
        assert!(files.selected_size() < files.total_size());
        assert_eq!(
            files
                .tree(Location::Archives)
                .map(|t| t[t.root()].selection()),
            Some(Selection::Off)
        );

        files.deselect_all();
        assert_eq!(files.selected_size(), 0);
        assert!(files.deletion_targets().is_empty());
        Ok(())
    }

    #[test]
    fn rescan_replaces_previous_tree() -> Result<()> {
        let dir = tempdir()?;
        fixture(dir.path())?;
        let mut files = scanned(dir.path());
        assert_eq!(files.tree(Location::DerivedData).map(EntryTree::leaf_count), Some(1));

        write_file(
            &dir.path().join("Xcode/DerivedData/Other-zyxwvutsrqponmlkjihgfedcba/b"),
            1,
        )?;
        for event in files.scan_files(ScanScope::Single(Location::DerivedData)).wait() {
            files.absorb(event);
        }
        assert_eq!(files.tree(Location::DerivedData).map(EntryTree::leaf_count), Some(2));
        assert_eq!(files.total_size(), 1501);
        Ok(())
    }

    #[test]
    fn deleting_selection_then_rescanning_frees_space() -> Result<()> {
        let dir = tempdir()?;
        fixture(dir.path())?;
        let mut files = scanned(dir.path());

        let report = files.delete_selected_entries(DeleteMode::Remove).wait();
        assert_eq!(report.succeeded, 2);
        assert!(report.is_clean());
        assert_eq!(report.bytes_freed, 400);

        for event in files.scan_files(ScanScope::All).wait() {
            files.absorb(event);
        }
        assert_eq!(files.total_size(), 1100);
        assert!(
            dir.path()
                .join("Xcode/iOS DeviceSupport/17.0 (21A329)")
                .exists()
        );
        Ok(())
    }

    #[test]
    fn excluded_archive_survives_deleting_its_day() -> Result<()> {
        let dir = tempdir()?;
        let day = dir.path().join("Xcode/Archives/2024-01-02");
        write_file(&day.join("Keep.xcarchive/Info.plist"), 10)?;
        write_file(&day.join("Drop.xcarchive/Info.plist"), 20)?;
        let config = Config {
            exclude: vec![day.join("Keep.xcarchive")],
            ..Config::default()
        };

        let mut files = XcodeFiles::new(XcodePaths::new(dir.path()), config);
        for event in files.scan_files(ScanScope::Single(Location::Archives)).wait() {
            files.absorb(event);
        }
        files.select_all();
        let targets: Vec<_> = files.deletion_targets().into_iter().map(|t| t.path).collect();
        assert_eq!(targets, vec![day.join("Drop.xcarchive")]);

        let report = files.delete_selected_entries(DeleteMode::Remove).wait();
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.bytes_freed, 20);
        assert!(report.is_clean());
        assert!(day.join("Keep.xcarchive").exists());
        assert!(!day.join("Drop.xcarchive").exists());
        Ok(())
    }
}
