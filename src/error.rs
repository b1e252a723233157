use crate::model::Location;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanError {
    /// The expected root of a location is not on disk. Scans treat this as an
    /// empty result.
    #[error("{location} root {} does not exist", path.display())]
    RootUnavailable { location: Location, path: PathBuf },

    #[error("cannot access {}: {source}", path.display())]
    PathUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Nothing can be scanned without the developer directory.
    #[error("developer directory {} not found; is Xcode installed?", .0.display())]
    FatalEnvironment(PathBuf),

    /// Refused at deletion time because the config excludes the path or
    /// something below it.
    #[error("{} is protected by the exclude list", .0.display())]
    Excluded(PathBuf),

    #[error("invalid config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CleanError {
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PathUnreadable {
            path: path.into(),
            source,
        }
    }
}
