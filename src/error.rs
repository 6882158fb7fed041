//! Unified error type for all logspool operations.
//!
//! Logging itself is best-effort and never unwinds into the caller; the variants
//! here surface at construction, configuration, and explicit `flush` time.
//! Rotation and formatting failures on the write path are reported through the
//! writer's counters instead of this type.

use std::path::PathBuf;

/// Error type for logspool operations.
#[derive(Debug)]
pub enum Error {
    /// Target file could not be opened at construction; fatal, no writer produced.
    Open(PathBuf, std::io::Error),
    /// TOML config parsing error.
    ConfigParse(toml::de::Error),
    /// Other I/O error.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(path, e) => write!(f, "cannot open log file {}: {e}", path.display()),
            Self::ConfigParse(e) => write!(f, "parse error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open(_, e) | Self::Io(e) => Some(e),
            Self::ConfigParse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::ConfigParse(e)
    }
}
