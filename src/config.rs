use crate::cleaner::DeleteMode;
use crate::constants::{APP_DIR, APPLICATIONS_DIR, CONFIG_FILE};
use crate::error::CleanError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Overrides `~/Library/Developer`.
    pub developer_dir: Option<PathBuf>,
    /// Where installed Xcode bundles are looked up.
    pub applications_dir: Option<PathBuf>,
    /// Move deleted entries to the Trash instead of removing them.
    pub move_to_trash: bool,
    /// Paths that are never scanned nor deleted.
    pub exclude: Vec<PathBuf>,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads `path`, or the default location when `None`. A missing file
    /// yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, CleanError> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config = Self::parse(&content).map_err(|source| CleanError::Config {
            path: path.clone(),
            source,
        })?;
        tracing::info!(
            "loaded config from {} ({} exclusions)",
            path.display(),
            config.exclude.len()
        );
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn applications_dir(&self) -> PathBuf {
        self.applications_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(APPLICATIONS_DIR))
    }

    pub fn delete_mode(&self) -> DeleteMode {
        if self.move_to_trash {
            DeleteMode::Trash
        } else {
            DeleteMode::Remove
        }
    }

    /// Exact match or anything below an excluded directory.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.iter().any(|rule| path.starts_with(rule))
    }

    /// Whether removing `path` would touch an excluded path, either because
    /// it is excluded itself or because an excluded path lies below it.
    pub fn protects(&self, path: &Path) -> bool {
        self.is_excluded(path) || self.exclude.iter().any(|rule| rule.starts_with(path))
    }
}
