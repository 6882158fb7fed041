//! Configuration struct definitions.

use serde::Deserialize;

/// General configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Minimum log level.
    pub level: String,
    /// ANSI-colored level prefixes.
    pub colored: bool,
    /// Include the `file:line` call-site segment in each record.
    pub location: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            colored: true,
            location: true,
        }
    }
}

/// Destination file configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Target path; `~` expands to the home directory.
    pub path: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        let path = directories::ProjectDirs::from("", "", "logspool").map_or_else(
            || "logspool.log".to_string(),
            |dirs| {
                dirs.state_dir()
                    .unwrap_or_else(|| dirs.data_dir())
                    .join("logspool.log")
                    .to_string_lossy()
                    .into_owned()
            },
        );
        Self { path }
    }
}

/// Rotation configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Rotate on calendar-day boundaries.
    pub daily: bool,
    /// Byte threshold in "512K"/"10M"/"1G" notation; empty or "0" disables.
    pub size: String,
    /// Line threshold; 0 disables.
    pub lines: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            daily: false,
            size: String::new(),
            lines: 0,
        }
    }
}
