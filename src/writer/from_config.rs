//! Bridges the serde config schema to the builder so `FileLogger::from_config`
//! stays a one-liner.

use super::FileLoggerBuilder;
use crate::config::Config;
use crate::writer::FileLogger;

pub(super) fn builder_from_config(config: &Config) -> FileLoggerBuilder {
    FileLogger::builder(config.resolved_path())
        .level(config.parse_level())
        .colored(config.general.colored)
        .location(config.general.location)
        .time_rotation(config.rotation.daily)
        .rotate_size(config.rotate_size_bytes())
        .rotate_lines(config.rotation.lines)
}
