use crate::config::Config;
use crate::constants::{DEVICE_PLIST, SIM_RUNTIME_PREFIX, UNKNOWN_RUNTIME};
use crate::entry::{EntryTree, FileEntry};
use crate::model::Location;
use crate::paths::XcodePaths;
use crate::scanner::LocationScanner;
use crate::scanner::utils::{Measured, list_entries, measure_all, read_plist_string};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Simulator devices grouped by runtime, read from each device's
/// `device.plist`. Nothing starts selected.
pub struct SimulatorsScanner {
    pub paths: XcodePaths,
}

impl LocationScanner for SimulatorsScanner {
    fn location(&self) -> Location {
        Location::Simulators
    }

    fn roots(&self) -> Vec<PathBuf> {
        vec![self.paths.simulator_devices()]
    }

    fn scan(&self, config: &Config) -> EntryTree {
        let mut tree = EntryTree::new(self.location());
        let devices: Vec<PathBuf> = list_entries(&mut tree, &self.paths.simulator_devices(), config)
            .paths
            .into_iter()
            .filter(|path| path.is_dir())
            .collect();

        let mut runtimes: BTreeMap<String, Vec<(Option<String>, Measured)>> = BTreeMap::new();
        for measured in measure_all(&devices) {
            let plist = measured.path.join(DEVICE_PLIST);
            let name = read_plist_string(&plist, "name");
            let runtime = read_plist_string(&plist, "runtime")
                .map_or_else(|| UNKNOWN_RUNTIME.to_string(), |r| runtime_label(&r));
            runtimes.entry(runtime).or_default().push((name, measured));
        }

        for (runtime, devices) in runtimes {
            let group = tree.add_child(tree.root(), FileEntry::group(runtime, None));
            for (name, measured) in devices {
                tree.add_skipped(measured.unreadable);
                let udid = measured.file_name();
                let entry = FileEntry::leaf(
                    name.unwrap_or_else(|| udid.clone()),
                    measured.path,
                    measured.size,
                )
                .with_detail(udid);
                tree.add_child(group, entry);
            }
        }

        tree.recalculate_selection();
        tree
    }
}

/// `com.apple.CoreSimulator.SimRuntime.iOS-17-2` → `iOS 17.2`.
pub fn runtime_label(identifier: &str) -> String {
    let short = identifier
        .strip_prefix(SIM_RUNTIME_PREFIX)
        .unwrap_or(identifier);
    match short.split_once('-') {
        Some((os, version)) => format!("{os} {}", version.replace('-', ".")),
        None => short.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    fn device(root: &Path, udid: &str, name: &str, runtime: &str, bytes: usize) -> Result<()> {
        let dir = root.join(udid);
        fs::create_dir_all(dir.join("data"))?;
        File::create(dir.join("data/blob"))?.write_all(&vec![0u8; bytes])?;
        fs::write(
            dir.join("device.plist"),
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<plist version=\"1.0\"><dict>\
                 <key>UDID</key><string>{udid}</string>\
                 <key>name</key><string>{name}</string>\
                 <key>runtime</key><string>{runtime}</string>\
                 </dict></plist>"
            ),
        )?;
        Ok(())
    }

    #[test]
    fn runtime_identifiers_become_labels() {
        assert_eq!(
            runtime_label("com.apple.CoreSimulator.SimRuntime.iOS-17-2"),
            "iOS 17.2"
        );
        assert_eq!(
            runtime_label("com.apple.CoreSimulator.SimRuntime.watchOS-10-0"),
            "watchOS 10.0"
        );
        assert_eq!(runtime_label("custom"), "custom");
    }

    #[test]
    fn devices_grouped_by_runtime() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("CoreSimulator/Devices");
        device(&root, "AAAA-1", "iPhone 15", "com.apple.CoreSimulator.SimRuntime.iOS-17-2", 10)?;
        device(&root, "BBBB-2", "iPhone 15 Pro", "com.apple.CoreSimulator.SimRuntime.iOS-17-2", 20)?;
        device(&root, "CCCC-3", "Apple Watch", "com.apple.CoreSimulator.SimRuntime.watchOS-10-0", 30)?;
        fs::create_dir_all(root.join("DDDD-4"))?;
        File::create(root.join("device_set.plist"))?;

        let scanner = SimulatorsScanner {
            paths: XcodePaths::new(dir.path()),
        };
        let tree = scanner.scan(&Config::default());

        let groups: Vec<_> = tree
            .children(tree.root())
            .iter()
            .map(|id| tree[*id].name.as_str())
            .collect();
        assert_eq!(groups, vec![UNKNOWN_RUNTIME, "iOS 17.2", "watchOS 10.0"]);

        let ios = tree.children(tree.root())[1];
        let devices: Vec<_> = tree
            .children(ios)
            .iter()
            .map(|id| (tree[*id].name.as_str(), tree[*id].detail.as_deref()))
            .collect();
        assert_eq!(
            devices,
            vec![("iPhone 15", Some("AAAA-1")), ("iPhone 15 Pro", Some("BBBB-2"))]
        );

        let unknown = tree.children(tree.root())[0];
        assert_eq!(tree[tree.children(unknown)[0]].name, "DDDD-4");
        assert_eq!(tree.leaf_count(), 4);
        Ok(())
    }
}
