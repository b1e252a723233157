use crate::config::Config;
use crate::entry::EntryTree;
use crate::error::CleanError;
use jwalk::WalkDir;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Measured {
    pub path: PathBuf,
    pub size: u64,
    /// Subpaths that could not be read and were counted as zero bytes.
    pub unreadable: usize,
}

impl Measured {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    }
}

/// Direct children of a directory that survived filtering.
#[derive(Debug, Default)]
pub struct Listing {
    pub paths: Vec<PathBuf>,
    /// Set when a hidden, excluded or unreadable entry was left out, so the
    /// directory holds more than `paths`.
    pub partial: bool,
}

/// Lists the direct children of `root`, skipping hidden and excluded entries.
/// A missing root is an empty listing; an unreadable one is counted as
/// skipped on `tree`.
pub fn list_entries(tree: &mut EntryTree, root: &Path, config: &Config) -> Listing {
    if !root.exists() {
        let err = CleanError::RootUnavailable {
            location: tree.location(),
            path: root.to_path_buf(),
        };
        tracing::debug!("{err}");
        return Listing::default();
    }

    let read_dir = match fs::read_dir(root) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            tracing::warn!("{}", CleanError::unreadable(root, e));
            tree.add_skipped(1);
            return Listing {
                paths: vec![],
                partial: true,
            };
        }
    };

    let mut listing = Listing::default();
    for entry in read_dir {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_name().to_string_lossy().starts_with('.') {
                    listing.partial = true;
                    continue;
                }
                if config.is_excluded(&path) {
                    tracing::debug!("excluded {}", path.display());
                    listing.partial = true;
                    continue;
                }
                listing.paths.push(path);
            }
            Err(e) => {
                tracing::warn!("{}", CleanError::unreadable(root, e));
                tree.add_skipped(1);
                listing.partial = true;
            }
        }
    }
    listing.paths.sort();
    listing
}

/// Sizes every path in parallel, keeping input order.
pub fn measure_all(paths: &[PathBuf]) -> Vec<Measured> {
    paths.par_iter().map(|path| measure(path)).collect()
}

/// Sums the sizes of all files below `path`. Anything that cannot be read is
/// logged and contributes nothing.
pub fn measure(path: &Path) -> Measured {
    let mut size = 0;
    let mut unreadable = 0;

    match fs::symlink_metadata(path) {
        Ok(metadata) if !metadata.is_dir() => {
            return Measured {
                path: path.to_path_buf(),
                size: metadata.len(),
                unreadable,
            };
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!("{}", CleanError::unreadable(path, e));
            return Measured {
                path: path.to_path_buf(),
                size: 0,
                unreadable: 1,
            };
        }
    }

    // Serial per item; callers parallelize across items.
    for entry in WalkDir::new(path)
        .skip_hidden(false)
        .parallelism(jwalk::Parallelism::Serial)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable path under {}: {e}", path.display());
                unreadable += 1;
                continue;
            }
        };
        // A directory that cannot be listed still shows up as an entry.
        if let Some(e) = &entry.read_children_error {
            tracing::warn!("skipping contents of {}: {e}", entry.path().display());
            unreadable += 1;
        }
        match entry.metadata() {
            Ok(metadata) if metadata.is_file() => size += metadata.len(),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("skipping {}: {e}", entry.path().display());
                unreadable += 1;
            }
        }
    }

    Measured {
        path: path.to_path_buf(),
        size,
        unreadable,
    }
}

/// Reads a string stored under `key` in the top-level dictionary of a
/// property list, XML or binary.
pub fn read_plist_string(path: &Path, key: &str) -> Option<String> {
    let value = match plist::Value::from_file(path) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("cannot read {}: {e}", path.display());
            return None;
        }
    };
    value
        .as_dictionary()?
        .get(key)?
        .as_string()
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;
    use anyhow::Result;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn measure_sums_nested_files() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("MyApp-abc");
        fs::create_dir_all(root.join("Build/Intermediates.noindex"))?;
        File::create(root.join("info.plist"))?.write_all(&[0u8; 100])?;
        File::create(root.join("Build/Intermediates.noindex/a.o"))?.write_all(&[0u8; 200])?;

        let measured = measure(&root);
        assert_eq!(measured.size, 300);
        assert_eq!(measured.unreadable, 0);
        Ok(())
    }

    #[test]
    fn measure_single_file() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("stray.txt");
        File::create(&file)?.write_all(&[0u8; 42])?;
        assert_eq!(measure(&file).size, 42);
        Ok(())
    }

    #[test]
    fn measure_missing_path_counts_as_unreadable() {
        let path = PathBuf::from("/path/to/non/existent/directory/xcleaner_test_random_12345");
        let measured = measure(&path);
        assert_eq!(measured.size, 0);
        assert_eq!(measured.unreadable, 1);
    }

    #[cfg(unix)]
    #[test]
    fn measure_skips_locked_subdirectory() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let root = dir.path().join("MyApp-abc");
        let locked = root.join("Locked");
        fs::create_dir_all(root.join("Open"))?;
        fs::create_dir_all(&locked)?;
        File::create(root.join("Open/a"))?.write_all(&[0u8; 100])?;
        File::create(locked.join("b"))?.write_all(&[0u8; 50])?;

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;
        // Permission bits do not bind root.
        let bypassed = fs::read_dir(&locked).is_ok();
        let measured = measure(&root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;
        if bypassed {
            return Ok(());
        }

        assert_eq!(measured.size, 100);
        assert!(measured.unreadable >= 1);
        Ok(())
    }

    #[test]
    fn list_entries_skips_hidden_and_excluded() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        fs::create_dir(root.join("B-project"))?;
        fs::create_dir(root.join("A-project"))?;
        fs::create_dir(root.join("Keep-project"))?;

        let config = Config {
            exclude: vec![root.join("Keep-project")],
            ..Config::default()
        };
        let mut tree = EntryTree::new(Location::DerivedData);
        let listing = list_entries(&mut tree, root, &config);

        assert_eq!(
            listing.paths,
            vec![root.join("A-project"), root.join("B-project")]
        );
        assert!(listing.partial);
        assert_eq!(tree.skipped(), 0);
        Ok(())
    }

    #[test]
    fn hidden_files_make_a_listing_partial() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("A-project"))?;
        let mut tree = EntryTree::new(Location::DerivedData);

        let listing = list_entries(&mut tree, dir.path(), &Config::default());
        assert!(!listing.partial);

        File::create(dir.path().join(".DS_Store"))?;
        let listing = list_entries(&mut tree, dir.path(), &Config::default());
        assert_eq!(listing.paths, vec![dir.path().join("A-project")]);
        assert!(listing.partial);
        Ok(())
    }

    #[test]
    fn list_entries_of_missing_root_is_empty() {
        let mut tree = EntryTree::new(Location::Archives);
        let listing = list_entries(
            &mut tree,
            Path::new("/path/to/non/existent/xcleaner_archives"),
            &Config::default(),
        );
        assert!(listing.paths.is_empty());
        assert!(!listing.partial);
        assert_eq!(tree.skipped(), 0);
    }

    #[test]
    fn plist_string_lookup() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("info.plist");
        fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>LastAccessedDate</key>
	<date>2024-01-02T10:00:00Z</date>
	<key>Nested</key>
	<dict>
		<key>Scheme</key>
		<string>Inner</string>
	</dict>
	<key>Empty</key>
	<string/>
	<key>WorkspacePath</key>
	<string>/Users/me/Code/R&amp;D/MyApp.xcodeproj</string>
</dict>
</plist>"#,
        )?;

        assert_eq!(
            read_plist_string(&path, "WorkspacePath").as_deref(),
            Some("/Users/me/Code/R&D/MyApp.xcodeproj")
        );
        assert_eq!(read_plist_string(&path, "Empty").as_deref(), Some(""));
        assert_eq!(read_plist_string(&path, "Scheme"), None);
        assert_eq!(read_plist_string(&path, "LastAccessedDate"), None);
        assert_eq!(read_plist_string(&path, "Missing"), None);
        Ok(())
    }

    #[test]
    fn binary_plists_are_read_directly() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("device.plist");
        let mut dict = plist::Dictionary::new();
        dict.insert("name".to_string(), plist::Value::from("iPhone 15"));
        plist::Value::Dictionary(dict).to_file_binary(&path)?;

        assert_eq!(read_plist_string(&path, "name").as_deref(), Some("iPhone 15"));
        Ok(())
    }

    #[test]
    fn garbage_is_not_a_plist() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("info.plist");
        fs::write(&path, [0u8; 16])?;
        assert_eq!(read_plist_string(&path, "WorkspacePath"), None);
        Ok(())
    }
}
