use crate::config::Config;
use crate::constants::{
    CORE_SIMULATOR_DEVICES, DEVICE_SUPPORT_DIRS, LIBRARY_DEVELOPER, XCODE_ARCHIVES,
    XCODE_DERIVED_DATA,
};
use crate::error::CleanError;
use crate::model::Location;
use std::path::{Path, PathBuf};

/// Well-known directories every location scanner starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XcodePaths {
    developer: PathBuf,
}

impl XcodePaths {
    pub fn new(developer: impl Into<PathBuf>) -> Self {
        Self {
            developer: developer.into(),
        }
    }

    /// Resolves the developer directory from the config override or the
    /// invoking user's home. Fails when it does not exist, since no location
    /// can be scanned without it.
    pub fn resolve(config: &Config) -> Result<Self, CleanError> {
        let developer = match &config.developer_dir {
            Some(dir) => dir.clone(),
            None => home_dir()
                .ok_or_else(|| CleanError::FatalEnvironment(PathBuf::from("~")))?
                .join(LIBRARY_DEVELOPER),
        };
        if !developer.is_dir() {
            return Err(CleanError::FatalEnvironment(developer));
        }
        tracing::debug!("developer directory: {}", developer.display());
        Ok(Self::new(developer))
    }

    pub fn developer(&self) -> &Path {
        &self.developer
    }

    pub fn derived_data(&self) -> PathBuf {
        self.developer.join(XCODE_DERIVED_DATA)
    }

    pub fn archives(&self) -> PathBuf {
        self.developer.join(XCODE_ARCHIVES)
    }

    pub fn simulator_devices(&self) -> PathBuf {
        self.developer.join(CORE_SIMULATOR_DEVICES)
    }

    pub fn device_support(&self) -> Vec<(&'static str, PathBuf)> {
        DEVICE_SUPPORT_DIRS
            .iter()
            .map(|(os, dir)| (*os, self.developer.join(dir)))
            .collect()
    }

    pub fn roots(&self, location: Location) -> Vec<PathBuf> {
        match location {
            Location::DeviceSupport => self
                .device_support()
                .into_iter()
                .map(|(_, path)| path)
                .collect(),
            Location::DerivedData => vec![self.derived_data()],
            Location::Archives => vec![self.archives()],
            Location::Simulators => vec![self.simulator_devices()],
        }
    }
}

/// Home of the user who invoked us, even under `sudo`.
fn home_dir() -> Option<PathBuf> {
    if let Ok(sudo_user) = std::env::var("SUDO_USER")
        && !sudo_user.is_empty()
    {
        return Some(PathBuf::from("/Users").join(sudo_user));
    }
    dirs::home_dir()
}
