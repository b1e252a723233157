pub const APP_DIR: &str = "xcleaner";
pub const CONFIG_FILE: &str = "config.toml";
pub const PREFERENCES_FILE: &str = "preferences.toml";
pub const LOG_FILE: &str = "xcleaner.log";
pub const LOG_ENV: &str = "XCLEANER_LOG";

pub const LIBRARY_DEVELOPER: &str = "Library/Developer";
pub const APPLICATIONS_DIR: &str = "/Applications";

// Relative to the developer directory.
pub const XCODE_DERIVED_DATA: &str = "Xcode/DerivedData";
pub const XCODE_ARCHIVES: &str = "Xcode/Archives";
pub const CORE_SIMULATOR_DEVICES: &str = "CoreSimulator/Devices";

/// OS label and device support folder, relative to the developer directory.
pub const DEVICE_SUPPORT_DIRS: [(&str, &str); 4] = [
    ("iOS", "Xcode/iOS DeviceSupport"),
    ("watchOS", "Xcode/watchOS DeviceSupport"),
    ("tvOS", "Xcode/tvOS DeviceSupport"),
    ("macOS", "Xcode/macOS DeviceSupport"),
];

pub const DERIVED_DATA_INFO_PLIST: &str = "info.plist";
pub const WORKSPACE_PATH_KEY: &str = "WorkspacePath";
pub const DEVICE_PLIST: &str = "device.plist";
pub const SIM_RUNTIME_PREFIX: &str = "com.apple.CoreSimulator.SimRuntime.";
pub const UNKNOWN_RUNTIME: &str = "Unknown Runtime";

pub const XCODE_APP_PREFIX: &str = "Xcode";
pub const APP_BUNDLE_SUFFIX: &str = ".app";
pub const BUNDLE_VERSION_KEY: &str = "CFBundleShortVersionString";
pub const BUILD_VERSION_KEY: &str = "ProductBuildVersion";
