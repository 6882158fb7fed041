//! Rotation configuration, counters, and on-disk naming.
//!
//! The state here is pure bookkeeping: the daemon owns the decide-and-act sequence
//! and is the only actor that renames or reopens files. Keeping the decision logic
//! free of I/O lets the threshold and naming rules be tested with synthetic dates
//! instead of waiting for midnight.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Live rotation configuration. Atomics so the mutators on the writer facade take
/// effect without touching either lock.
#[derive(Debug)]
pub(crate) struct RotationFlags {
    /// Rotate on calendar-day boundaries.
    pub time: AtomicBool,
    /// Byte threshold; 0 disables size rotation.
    pub size_limit: AtomicU64,
    /// Line threshold; 0 disables line rotation.
    pub line_limit: AtomicU64,
}

impl RotationFlags {
    pub(crate) const fn new(time: bool, size_limit: u64, line_limit: u64) -> Self {
        Self {
            time: AtomicBool::new(time),
            size_limit: AtomicU64::new(size_limit),
            line_limit: AtomicU64::new(line_limit),
        }
    }

    /// Writers skip the byte-count report entirely when neither threshold is set.
    pub(crate) fn size_or_lines_enabled(&self) -> bool {
        self.size_limit.load(Ordering::Relaxed) > 0 || self.line_limit.load(Ordering::Relaxed) > 0
    }
}

/// Counters guarded by the rotation bookkeeping lock. Held for the whole
/// decide-and-act sequence so two rotations can never race.
#[derive(Debug, Default)]
pub(crate) struct RotationState {
    /// Bytes accumulated since the last rotation.
    pub bytes: u64,
    /// Lines accumulated since the last rotation.
    pub lines: u64,
    /// Size/line rotations since the last day rotation; names the next rotated file.
    pub generation: u64,
    /// A rename succeeded but the fresh reopen failed; the daemon retries on
    /// every tick until the path can be reopened.
    pub reopen_pending: bool,
}

impl RotationState {
    /// One record landed: `bytes` from the write, one line.
    pub(crate) const fn record(&mut self, bytes: u64) {
        self.bytes += bytes;
        self.lines += 1;
    }

    /// Threshold check. A zero limit disables that trigger entirely.
    pub(crate) const fn crossed(&self, size_limit: u64, line_limit: u64) -> bool {
        (size_limit > 0 && self.bytes > size_limit)
            || (line_limit > 0 && self.lines > line_limit)
    }

    /// A size/line rotation landed: next generation, fresh accumulators.
    pub(crate) const fn complete_generation(&mut self) {
        self.generation += 1;
        self.bytes = 0;
        self.lines = 0;
    }

    /// A day rotation landed: generations restart from zero, accumulators reset.
    pub(crate) const fn complete_day(&mut self) {
        self.generation = 0;
        self.bytes = 0;
        self.lines = 0;
    }
}

/// `<name>.<yesterday-date>`, the on-disk contract for a day rotation.
pub(crate) fn day_rotated_name(path: &Path, yesterday: &str) -> PathBuf {
    with_suffix(path, yesterday)
}

/// `<name>.<generation>`, or `<name>.<date>.<generation>` when day rotation is
/// also enabled, generation starting at 1.
pub(crate) fn generation_name(path: &Path, date: Option<&str>, generation: u64) -> PathBuf {
    match date {
        Some(date) => with_suffix(path, &format!("{date}.{generation}")),
        None => with_suffix(path, &generation.to_string()),
    }
}

/// Appends `.suffix` to the complete file name (`app.log` -> `app.log.2026-08-30`),
/// never replacing the extension.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Append mode keeps existing content when the path is recycled between runs.
pub(crate) fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn generation_name_without_date() {
        let name = generation_name(Path::new("/tmp/app.log"), None, 3);
        assert_eq!(name, Path::new("/tmp/app.log.3"));
    }

    #[test]
    fn generation_name_with_date() {
        let name = generation_name(Path::new("/tmp/app.log"), Some("2026-08-30"), 1);
        assert_eq!(name, Path::new("/tmp/app.log.2026-08-30.1"));
    }

    #[test]
    fn day_rotation_uses_yesterday() {
        let name = day_rotated_name(Path::new("app.log"), "2026-08-29");
        assert_eq!(name, Path::new("app.log.2026-08-29"));
    }

    #[test]
    fn zero_limits_disable_triggers() {
        let mut state = RotationState::default();
        for _ in 0..10_000 {
            state.record(1024);
        }
        assert!(!state.crossed(0, 0));
        assert!(state.crossed(1024, 0));
        assert!(state.crossed(0, 9_999));
    }

    #[test]
    fn day_completion_resets_generation() {
        let mut state = RotationState::default();
        state.record(10);
        state.complete_generation();
        state.complete_generation();
        assert_eq!(state.generation, 2);
        state.complete_day();
        assert_eq!(state.generation, 0);
        assert_eq!(state.bytes, 0);
        assert_eq!(state.lines, 0);
    }
}
