use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Location {
    DeviceSupport,
    DerivedData,
    Archives,
    Simulators,
}

impl Location {
    pub const ALL: [Self; 4] = [
        Self::DeviceSupport,
        Self::DerivedData,
        Self::Archives,
        Self::Simulators,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DeviceSupport => "Device Support",
            Self::DerivedData => "Derived Data",
            Self::Archives => "Archives",
            Self::Simulators => "Simulators",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::DeviceSupport => {
                "Debug symbols copied from connected devices, one folder per OS version."
            }
            Self::DerivedData => "Intermediate build products and indexes, grouped by project.",
            Self::Archives => "Archived app builds, grouped by the day they were created.",
            Self::Simulators => "Simulator devices and their data, grouped by runtime.",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::DeviceSupport => "DevSup",
            Self::DerivedData => "Derived",
            Self::Archives => "Archive",
            Self::Simulators => "Sims",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "devicesupport" => Ok(Self::DeviceSupport),
            "deriveddata" => Ok(Self::DerivedData),
            "archives" => Ok(Self::Archives),
            "simulators" => Ok(Self::Simulators),
            other => Err(format!("unknown location '{other}'")),
        }
    }
}

/// What a scan request covers. `All` additionally wraps the per-location
/// notifications in a batch begin/finish pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanScope {
    Single(Location),
    All,
}

impl ScanScope {
    pub fn locations(&self) -> Vec<Location> {
        match self {
            Self::Single(location) => vec![*location],
            Self::All => Location::ALL.to_vec(),
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Dotted numeric version such as `17.0.1`. Missing trailing components compare
/// as zero, so `17` == `17.0`.
#[derive(Debug, Clone, Eq)]
pub struct Version {
    parts: Vec<u32>,
}

impl Version {
    /// Finds the first whitespace-separated token that parses as a version.
    /// Device support folders look like `17.0 (21A329)` or
    /// `iPhone15,2 17.0 (21A329)`.
    pub fn find_in(text: &str) -> Option<Self> {
        text.split_whitespace().find_map(|token| token.parse().ok())
    }

    fn component(&self, index: usize) -> u32 {
        self.parts.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty version".to_string());
        }
        let parts = s
            .split('.')
            .map(|p| p.parse::<u32>().map_err(|_| format!("invalid version '{s}'")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { parts })
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: Vec<String> = self.parts.iter().map(ToString::to_string).collect();
        f.write_str(&text.join("."))
    }
}

/// An Xcode installation found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub version: Version,
    pub build: Option<String>,
    pub app_path: PathBuf,
}

impl fmt::Display for InstalledVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.build {
            Some(build) => write!(f, "Xcode {} ({build})", self.version),
            None => write!(f, "Xcode {}", self.version),
        }
    }
}
