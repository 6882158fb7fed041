#![forbid(unsafe_code)]

//! `logspool` - Buffered, rotating file logger.
//!
//! A process-local logger that writes leveled, timestamped records through a
//! lock-guarded buffered stream, rotating the underlying file by calendar day,
//! accumulated size, or line count:
//! - Percent-placeholder templates (`%s`, `%d`, `%f`, `%v`, `%t`) substituted
//!   directly into the output buffer
//! - A per-writer background daemon that owns the 1-second timestamp refresh
//!   and is the only actor allowed to rename or reopen the file
//! - Non-blocking size/line accounting and hook dispatch: the write path never
//!   waits on the daemon
//! - Builder pattern and TOML config for construction
//!
//! # Example
//!
//! ```no_run
//! use logspool::{FileLogger, Level, args};
//!
//! let logger = FileLogger::builder("/var/log/myapp.log")
//!     .level(Level::Debug)
//!     .time_rotation(true)
//!     .rotate_size(10 * 1024 * 1024)
//!     .build()
//!     .expect("open log file");
//!
//! logger.info("application started");
//! logger.debugf("connected to %s in %d ms", args!["db-primary", 12]);
//! logger.warnf("queue depth %d above %f%%", args![870, 99.5]);
//! logger.close();
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod fmt;
pub mod hook;
pub mod level;
mod rotation;
pub mod writer;

// Re-exports for convenience
pub use clock::TimeSnapshot;
pub use config::{Config, format_size, parse_size};
pub use error::Error;
pub use fmt::{Color, FormatError, Template, Value};
pub use hook::Hook;
pub use level::Level;
pub use writer::{FileLogger, FileLoggerBuilder};
