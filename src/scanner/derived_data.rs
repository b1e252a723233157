use crate::config::Config;
use crate::constants::{DERIVED_DATA_INFO_PLIST, WORKSPACE_PATH_KEY};
use crate::entry::{EntryTree, FileEntry};
use crate::model::Location;
use crate::paths::XcodePaths;
use crate::scanner::LocationScanner;
use crate::scanner::utils::{Measured, list_entries, measure_all, read_plist_string};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Groups build folders (`MyApp-<hash>`) by project name. Everything starts
/// selected since derived data is always rebuilt on demand.
pub struct DerivedDataScanner {
    pub paths: XcodePaths,
}

impl LocationScanner for DerivedDataScanner {
    fn location(&self) -> Location {
        Location::DerivedData
    }

    fn roots(&self) -> Vec<PathBuf> {
        vec![self.paths.derived_data()]
    }

    fn scan(&self, config: &Config) -> EntryTree {
        let mut tree = EntryTree::new(self.location());
        let entries = list_entries(&mut tree, &self.paths.derived_data(), config).paths;

        let mut projects: BTreeMap<String, Vec<Measured>> = BTreeMap::new();
        for measured in measure_all(&entries) {
            projects
                .entry(project_name(&measured.file_name()).to_string())
                .or_default()
                .push(measured);
        }

        for (project, builds) in projects {
            let group = tree.add_child(tree.root(), FileEntry::group(project, None));
            for measured in builds {
                tree.add_skipped(measured.unreadable);
                let workspace =
                    read_plist_string(&measured.path.join(DERIVED_DATA_INFO_PLIST), WORKSPACE_PATH_KEY);
                let mut entry =
                    FileEntry::leaf(measured.file_name(), measured.path, measured.size);
                if let Some(workspace) = workspace {
                    entry = entry.with_detail(workspace);
                }
                tree.add_child(group, entry);
            }
        }

        tree.select_with_children(tree.root());
        tree.recalculate_selection();
        tree
    }
}

/// `MyApp-bqwxyzfmhnoiktcrgtsgqjhdjwbp` → `MyApp`. Folders without a hash
/// suffix (`ModuleCache.noindex`) are their own project.
pub fn project_name(folder: &str) -> &str {
    match folder.rsplit_once('-') {
        Some((name, hash))
            if !name.is_empty()
                && hash.len() >= 20
                && hash.chars().all(|c| c.is_ascii_lowercase()) =>
        {
            name
        }
        _ => folder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Selection;
    use anyhow::Result;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn project_name_strips_hash_suffix() {
        assert_eq!(project_name("MyApp-bqwxyzfmhnoiktcrgtsgqjhdjwbp"), "MyApp");
        assert_eq!(
            project_name("My-Great-App-aaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            "My-Great-App"
        );
        assert_eq!(project_name("ModuleCache.noindex"), "ModuleCache.noindex");
        assert_eq!(project_name("Some-Thing"), "Some-Thing");
    }

    #[test]
    fn builds_are_grouped_per_project() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("Xcode/DerivedData");
        let builds = [
            ("MyApp-bqwxyzfmhnoiktcrgtsgqjhdjwbp", 100usize),
            ("MyApp-cdefghijklmnopqrstuvwxyzab", 50),
            ("Other-abcdefghijklmnopqrstuvwxyz", 25),
            ("ModuleCache.noindex", 5),
        ];
        for (name, bytes) in builds {
            fs::create_dir_all(root.join(name).join("Build"))?;
            File::create(root.join(name).join("Build/out"))?.write_all(&vec![0u8; bytes])?;
        }
        let plist = "<?xml version=\"1.0\"?><plist version=\"1.0\"><dict><key>WorkspacePath</key>\
                     <string>/Code/MyApp.xcodeproj</string></dict></plist>";
        fs::write(
            root.join("MyApp-bqwxyzfmhnoiktcrgtsgqjhdjwbp/info.plist"),
            plist,
        )?;

        let scanner = DerivedDataScanner {
            paths: XcodePaths::new(dir.path()),
        };
        let tree = scanner.scan(&Config::default());

        let names: Vec<_> = tree
            .children(tree.root())
            .iter()
            .map(|id| tree[*id].name.as_str())
            .collect();
        assert_eq!(names, vec!["ModuleCache.noindex", "MyApp", "Other"]);

        let my_app = tree.children(tree.root())[1];
        assert_eq!(tree.children(my_app).len(), 2);
        assert_eq!(tree[my_app].size(), 150 + plist.len() as u64);
        let first = tree.children(my_app)[0];
        assert_eq!(tree[first].detail.as_deref(), Some("/Code/MyApp.xcodeproj"));

        assert_eq!(tree[tree.root()].selection(), Selection::On);
        assert_eq!(tree.selected_size(), tree.total_size());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn locked_build_folders_are_counted_as_skipped() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let build = dir.path().join("Xcode/DerivedData/MyApp-bqwxyzfmhnoiktcrgtsgqjhdjwbp");
        let locked = build.join("Index.noindex");
        fs::create_dir_all(build.join("Build"))?;
        fs::create_dir_all(&locked)?;
        File::create(build.join("Build/out"))?.write_all(&[0u8; 100])?;
        File::create(locked.join("store"))?.write_all(&[0u8; 50])?;

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;
        let bypassed = fs::read_dir(&locked).is_ok();
        let scanner = DerivedDataScanner {
            paths: XcodePaths::new(dir.path()),
        };
        let tree = scanner.scan(&Config::default());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;
        if bypassed {
            return Ok(());
        }

        assert_eq!(tree.total_size(), 100);
        assert!(tree.skipped() >= 1);
        Ok(())
    }
}
