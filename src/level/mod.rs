//! Severity levels that gate which records reach the file.

use crate::fmt::Color;
use std::fmt;
use std::str::FromStr;

/// Derives `Ord` so the writer can compare a record's level against the configured minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Level {
    /// High-volume instrumentation that would be too noisy outside of development.
    Trace = 0,
    /// Startup, teardown, and state-change details useful for diagnosing issues.
    Debug = 1,
    /// Normal operational milestones: connection established, config loaded, etc.
    #[default]
    Info = 2,
    /// Non-fatal anomalies that may need attention (deprecated features, retries).
    Warn = 3,
    /// Unrecoverable failures that prevent the operation from completing.
    Error = 4,
    /// Failures severe enough to page someone; the process may not survive them.
    Critical = 5,
}

impl Level {
    /// Per-level lookup tables (prefix strings) are sized by this and indexed by `repr()`.
    pub const COUNT: usize = 6;

    /// Lowercase because config files use lowercase level strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Uppercase form used in on-disk record prefixes.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Per-level prefix color, applied only when the colored toggle is on.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Trace => Color::purple(),
            Self::Debug => Color::cyan(),
            Self::Info => Color::green(),
            Self::Warn => Color::yellow(),
            Self::Error => Color::red(),
            Self::Critical => Color::pink(),
        }
    }

    /// Convenience for iteration, used by prefix tables and tests.
    #[must_use]
    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::Trace,
            Self::Debug,
            Self::Info,
            Self::Warn,
            Self::Error,
            Self::Critical,
        ]
    }

    /// Numeric form stored in the writer's atomic minimum-level cell.
    #[must_use]
    pub const fn repr(self) -> u8 {
        self as u8
    }

    /// Inverse of [`repr`](Self::repr); out-of-range values clamp to `Critical`.
    #[must_use]
    pub const fn from_repr(value: u8) -> Self {
        match value {
            0 => Self::Trace,
            1 => Self::Debug,
            2 => Self::Info,
            3 => Self::Warn,
            4 => Self::Error,
            _ => Self::Critical,
        }
    }

    /// Builds the on-disk prefix table for one colored setting. Rebuilt under the
    /// stream lock whenever the colored toggle changes, so a record never mixes
    /// old and new prefix styles.
    #[must_use]
    pub fn prefix_table(colored: bool) -> [String; Self::COUNT] {
        Self::all().map(|level| {
            if colored {
                format!(
                    "{}[{}]{} ",
                    level.color().fg_ansi(),
                    level.label(),
                    Color::RESET
                )
            } else {
                format!("[{}] ", level.label())
            }
        })
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by `FromStr` so callers can distinguish "unknown level" from other parse failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError(String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level: '{}'", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "err" => Ok(Self::Error),
            "critical" | "crit" | "fatal" => Ok(Self::Critical),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}
