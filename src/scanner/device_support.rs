use crate::config::Config;
use crate::entry::{EntryTree, FileEntry};
use crate::model::{Location, Version};
use crate::paths::XcodePaths;
use crate::scanner::LocationScanner;
use crate::scanner::utils::{list_entries, measure_all};
use std::cmp::Reverse;
use std::path::PathBuf;

/// One group per OS, one leaf per symbol folder. Every version except the
/// newest of each OS starts selected.
pub struct DeviceSupportScanner {
    pub paths: XcodePaths,
}

impl LocationScanner for DeviceSupportScanner {
    fn location(&self) -> Location {
        Location::DeviceSupport
    }

    fn roots(&self) -> Vec<PathBuf> {
        self.paths.roots(Location::DeviceSupport)
    }

    fn scan(&self, config: &Config) -> EntryTree {
        let mut tree = EntryTree::new(self.location());

        for (os, dir) in self.paths.device_support() {
            let entries = list_entries(&mut tree, &dir, config).paths;
            if entries.is_empty() {
                continue;
            }

            let mut versions: Vec<_> = measure_all(&entries)
                .into_iter()
                .map(|m| (Version::find_in(&m.file_name()), m))
                .collect();
            versions.sort_by_key(|(version, m)| (Reverse(version.clone()), m.file_name()));

            let group = tree.add_child(tree.root(), FileEntry::group(os, None));
            for (index, (version, measured)) in versions.into_iter().enumerate() {
                tree.add_skipped(measured.unreadable);
                let mut entry = FileEntry::leaf(
                    format!("{os} {}", measured.file_name()),
                    measured.path,
                    measured.size,
                );
                if version.is_none() {
                    entry = entry.with_detail("unrecognized version");
                }
                let leaf = tree.add_child(group, entry);
                if index > 0 {
                    tree.select_with_children(leaf);
                }
            }
        }

        tree.recalculate_selection();
        tree
    }
}
