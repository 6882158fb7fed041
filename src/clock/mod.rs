//! Pre-rendered timestamp snapshots, refreshed once per second by the rotation
//! daemon instead of being formatted on every write.
//!
//! The daemon is the single publisher; writers take an `Arc` snapshot per record
//! and never observe a half-updated value.

use chrono::{DateTime, Duration, Local};
use std::sync::{Arc, RwLock};

/// Record prefix format, e.g. `[2026-08-30 14:03:07] `.
pub const PREFIX_FORMAT: &str = "[%Y-%m-%d %H:%M:%S] ";

/// Calendar-day format used for day-rotation comparisons and rotated file names.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One immutable published value: everything a write or a rotation needs to know
/// about "now" without touching the formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSnapshot {
    /// Pre-rendered record prefix.
    pub prefix: String,
    /// Today's calendar date.
    pub date: String,
    /// Yesterday's calendar date; names the rotated file on a day boundary.
    pub yesterday: String,
}

impl TimeSnapshot {
    /// Renders all three fields from one instant so they can never disagree.
    #[must_use]
    pub fn capture(now: DateTime<Local>) -> Self {
        Self {
            prefix: now.format(PREFIX_FORMAT).to_string(),
            date: now.format(DATE_FORMAT).to_string(),
            yesterday: (now - Duration::days(1)).format(DATE_FORMAT).to_string(),
        }
    }
}

/// Single-writer/many-reader publication cell. The daemon swaps in a fresh
/// `Arc<TimeSnapshot>` once per second; readers clone the `Arc` and keep a
/// consistent view for the duration of one record.
#[derive(Debug)]
pub struct Clock {
    current: RwLock<Arc<TimeSnapshot>>,
}

impl Clock {
    #[must_use]
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            current: RwLock::new(Arc::new(TimeSnapshot::capture(now))),
        }
    }

    /// Daemon-only. Replaces the published snapshot atomically from the readers'
    /// point of view: they hold either the old `Arc` or the new one, never a mix.
    pub fn publish(&self, snapshot: TimeSnapshot) {
        match self.current.write() {
            Ok(mut current) => *current = Arc::new(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(snapshot),
        }
    }

    /// Cheap per-record read: one `RwLock` read acquisition and one `Arc` clone.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TimeSnapshot> {
        match self.current.read() {
            Ok(current) => Arc::clone(&current),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}
