use crate::config::Config;
use crate::entry::{EntryTree, FileEntry};
use crate::model::Location;
use crate::paths::XcodePaths;
use crate::scanner::LocationScanner;
use crate::scanner::utils::{list_entries, measure, measure_all};
use std::path::{Path, PathBuf};

/// Xcode files archives under one folder per day (`2024-01-02`). Each day is
/// a group, newest first, backed by that folder only when every entry in it
/// was listed. Nothing starts selected.
pub struct ArchivesScanner {
    pub paths: XcodePaths,
}

impl LocationScanner for ArchivesScanner {
    fn location(&self) -> Location {
        Location::Archives
    }

    fn roots(&self) -> Vec<PathBuf> {
        vec![self.paths.archives()]
    }

    fn scan(&self, config: &Config) -> EntryTree {
        let mut tree = EntryTree::new(self.location());
        let mut days = list_entries(&mut tree, &self.paths.archives(), config).paths;
        days.reverse();

        for day in days {
            if !day.is_dir() {
                let measured = measure(&day);
                tree.add_skipped(measured.unreadable);
                let name = measured.file_name();
                tree.add_child(
                    tree.root(),
                    FileEntry::leaf(name, measured.path, measured.size),
                );
                continue;
            }

            // Removing the whole day would also take whatever was left out.
            let archives = list_entries(&mut tree, &day, config);
            let backing = (!archives.partial).then(|| day.clone());
            let group = tree.add_child(tree.root(), FileEntry::group(file_name(&day), backing));
            for measured in measure_all(&archives.paths) {
                tree.add_skipped(measured.unreadable);
                tree.add_child(
                    group,
                    FileEntry::leaf(archive_label(&measured.path), measured.path, measured.size),
                );
            }
        }

        tree.recalculate_selection();
        tree
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

/// `MyApp 02-01-2024, 10.30.xcarchive` → `MyApp 02-01-2024, 10.30`.
fn archive_label(path: &Path) -> String {
    if path.extension().is_some_and(|ext| ext == "xcarchive") {
        path.file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    } else {
        file_name(path)
    }
}
