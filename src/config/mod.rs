//! TOML configuration loading.
//!
//! Separated from struct definitions so that the loading logic (file I/O, tilde
//! expansion, size parsing) stays independent of the serde schema.

mod size;
mod structs;

pub use size::{format_size, parse_size};
pub use structs::{FileConfig, GeneralConfig, RotationConfig};

use crate::error::Error;
use crate::level::Level;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A completely empty config file must still produce a working logger;
/// `#[serde(default)]` on every field keeps zero-config working.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Severity filtering and record decoration apply regardless of destination.
    pub general: GeneralConfig,
    /// Where records land.
    pub file: FileConfig,
    /// When the active file is archived and a fresh one opened.
    pub rotation: RotationConfig,
}

impl Config {
    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    /// [`Error::Io`] on read failure, [`Error::ConfigParse`] on malformed TOML.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses TOML content directly; tests and embedded configs skip the file read.
    ///
    /// # Errors
    /// [`Error::ConfigParse`] on malformed TOML.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(Error::from)
    }

    /// An unknown level string falls back to Info rather than refusing to log at all.
    #[must_use]
    pub fn parse_level(&self) -> Level {
        self.general.level.parse().unwrap_or_default()
    }

    /// Byte threshold from the "512K"/"10M" notation; unparsable input disables
    /// size rotation rather than guessing.
    #[must_use]
    pub fn rotate_size_bytes(&self) -> u64 {
        if self.rotation.size.trim().is_empty() {
            return 0;
        }
        parse_size(&self.rotation.size).unwrap_or(0)
    }

    /// Destination path with `~` expanded.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.file.path).into_owned())
    }
}
