use crate::constants::{APP_DIR, PREFERENCES_FILE};
use crate::error::CleanError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Counters kept across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    total_bytes_cleaned: u64,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Preferences {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(PREFERENCES_FILE))
    }

    /// Never fails: unreadable or corrupt preferences start from zero.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let mut prefs = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("ignoring corrupt preferences {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        prefs.path = Some(path.to_path_buf());
        prefs
    }

    pub fn save(&self) -> Result<(), CleanError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn total_bytes_cleaned(&self) -> u64 {
        self.total_bytes_cleaned
    }

    pub fn record_cleaned(&mut self, bytes: u64) {
        self.total_bytes_cleaned = self.total_bytes_cleaned.saturating_add(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn counter_survives_reload() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("xcleaner/preferences.toml");

        let mut prefs = Preferences::load_from(&path);
        assert_eq!(prefs.total_bytes_cleaned(), 0);
        prefs.record_cleaned(1024);
        prefs.record_cleaned(512);
        prefs.save()?;

        let reloaded = Preferences::load_from(&path);
        assert_eq!(reloaded.total_bytes_cleaned(), 1536);
        Ok(())
    }

    #[test]
    fn corrupt_file_starts_from_zero() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("preferences.toml");
        fs::write(&path, "total_bytes_cleaned = \"lots\"")?;
        assert_eq!(Preferences::load_from(&path).total_bytes_cleaned(), 0);
        Ok(())
    }
}
