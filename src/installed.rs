//! Detection of installed Xcode bundles. The result is informational only, so
//! every failure degrades to a shorter (or empty) list.

use crate::constants::{
    APP_BUNDLE_SUFFIX, BUILD_VERSION_KEY, BUNDLE_VERSION_KEY, XCODE_APP_PREFIX,
};
use crate::model::{InstalledVersion, Version};
use crate::scanner::utils::read_plist_string;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

/// Looks up installed Xcodes on a worker thread and calls `completion`
/// exactly once with the list, newest first.
pub fn check_for_installed_xcodes<F>(applications_dir: PathBuf, completion: F)
where
    F: FnOnce(Vec<InstalledVersion>) + Send + 'static,
{
    thread::spawn(move || completion(detect_installed_xcodes(&applications_dir)));
}

pub fn detect_installed_xcodes(applications_dir: &Path) -> Vec<InstalledVersion> {
    let entries = match fs::read_dir(applications_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("cannot list {}: {e}", applications_dir.display());
            return vec![];
        }
    };

    let mut installed: Vec<InstalledVersion> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|path| is_xcode_bundle(path))
        .filter_map(|path| read_bundle_version(&path))
        .collect();
    installed.sort_by(|a, b| b.version.cmp(&a.version));

    tracing::info!(
        "found {} Xcode installation(s) in {}",
        installed.len(),
        applications_dir.display()
    );
    installed
}

fn is_xcode_bundle(path: &Path) -> bool {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    name.starts_with(XCODE_APP_PREFIX) && name.ends_with(APP_BUNDLE_SUFFIX) && path.is_dir()
}

fn read_bundle_version(app: &Path) -> Option<InstalledVersion> {
    let contents = app.join("Contents");
    let Some(raw) = read_plist_string(&contents.join("Info.plist"), BUNDLE_VERSION_KEY) else {
        tracing::warn!("no version found in {}", app.display());
        return None;
    };
    let version = match raw.parse::<Version>() {
        Ok(version) => version,
        Err(e) => {
            tracing::warn!("{}: {e}", app.display());
            return None;
        }
    };
    let build = read_plist_string(&contents.join("version.plist"), BUILD_VERSION_KEY);

    Some(InstalledVersion {
        version,
        build,
        app_path: app.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::tempdir;

    fn fake_xcode(apps: &Path, bundle: &str, version: &str, build: Option<&str>) -> Result<()> {
        let contents = apps.join(bundle).join("Contents");
        fs::create_dir_all(&contents)?;
        fs::write(
            contents.join("Info.plist"),
            format!(
                "<?xml version=\"1.0\"?><plist version=\"1.0\"><dict>\
                 <key>CFBundleShortVersionString</key><string>{version}</string>\
                 </dict></plist>"
            ),
        )?;
        if let Some(build) = build {
            fs::write(
                contents.join("version.plist"),
                format!(
                    "<?xml version=\"1.0\"?><plist version=\"1.0\"><dict>\
                     <key>ProductBuildVersion</key><string>{build}</string>\
                     </dict></plist>"
                ),
            )?;
        }
        Ok(())
    }

    #[test]
    fn finds_xcode_bundles_newest_first() -> Result<()> {
        let dir = tempdir()?;
        let apps = dir.path();
        fake_xcode(apps, "Xcode.app", "15.2", Some("15C500b"))?;
        fake_xcode(apps, "Xcode-beta.app", "16.0", None)?;
        fake_xcode(apps, "Xcode_14.3.1.app", "14.3.1", Some("14E300c"))?;
        fake_xcode(apps, "Safari.app", "17.0", None)?;
        fs::create_dir_all(apps.join("Xcode-broken.app"))?;

        let found = detect_installed_xcodes(apps);
        let labels: Vec<String> = found.iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            vec!["Xcode 16.0", "Xcode 15.2 (15C500b)", "Xcode 14.3.1 (14E300c)"]
        );
        Ok(())
    }

    #[test]
    fn missing_directory_gives_empty_list() {
        let found = detect_installed_xcodes(Path::new("/path/to/non/existent/Applications"));
        assert!(found.is_empty());
    }

    #[test]
    fn completion_called_once_with_results() -> Result<()> {
        let dir = tempdir()?;
        fake_xcode(dir.path(), "Xcode.app", "15.2", None)?;

        let (tx, rx) = mpsc::channel();
        check_for_installed_xcodes(dir.path().to_path_buf(), move |found| {
            let _ = tx.send(found);
        });

        let found = rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].version.to_string(), "15.2");
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        Ok(())
    }
}
