//! Direct `FileLogger` construction would expose the shared state, channel wiring,
//! and daemon spawn to every caller; the builder hides all of it behind a
//! stepwise API.

use super::daemon::{Daemon, EVENT_QUEUE_DEPTH};
use super::{DEFAULT_BUFFER_SIZE, FileLogger, Shared, Sink};
use crate::clock::Clock;
use crate::error::Error;
use crate::hook::Hook;
use crate::level::Level;
use crate::rotation::{self, RotationFlags, RotationState};
use chrono::Local;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64};
use std::sync::mpsc::sync_channel;
use std::sync::{Arc, Mutex, RwLock};
use std::thread;

/// Configures and opens one [`FileLogger`].
pub struct FileLoggerBuilder {
    path: PathBuf,
    level: Level,
    colored: bool,
    location: bool,
    time_rotation: bool,
    rotate_size: u64,
    rotate_lines: u64,
    buffer_size: usize,
    hook: Option<Arc<dyn Hook>>,
}

impl FileLoggerBuilder {
    /// Info is the default; Debug/Trace are opt-in.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            level: Level::Info,
            colored: true,
            location: true,
            time_rotation: false,
            rotate_size: 0,
            rotate_lines: 0,
            buffer_size: DEFAULT_BUFFER_SIZE,
            hook: None,
        }
    }

    /// Minimum level; records below it cost one atomic comparison.
    #[must_use]
    pub const fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// ANSI-colored level prefixes. Turn off for files consumed by grep rather
    /// than `tail -f` in a truecolor terminal.
    #[must_use]
    pub const fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Whether records carry the `file:line` call-site segment.
    #[must_use]
    pub const fn location(mut self, location: bool) -> Self {
        self.location = location;
        self
    }

    /// Rotate on calendar-day boundaries, archiving to `<name>.<date>`.
    #[must_use]
    pub const fn time_rotation(mut self, enabled: bool) -> Self {
        self.time_rotation = enabled;
        self
    }

    /// Rotate once the file accumulates this many bytes; 0 disables.
    #[must_use]
    pub const fn rotate_size(mut self, bytes: u64) -> Self {
        self.rotate_size = bytes;
        self
    }

    /// Rotate once the file accumulates this many lines; 0 disables.
    #[must_use]
    pub const fn rotate_lines(mut self, lines: u64) -> Self {
        self.rotate_lines = lines;
        self
    }

    /// Stream buffer capacity; the default is one memory page.
    #[must_use]
    pub const fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    /// Observer fired with each finished record, off the write path.
    #[must_use]
    pub fn hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Opens (or creates) the target in append mode and starts the rotation daemon.
    ///
    /// # Errors
    /// [`Error::Open`] when the file cannot be opened; fatal, no daemon is started.
    /// [`Error::Io`] when the daemon thread cannot be spawned.
    pub fn build(self) -> Result<FileLogger, Error> {
        let file = rotation::open_append(&self.path)
            .map_err(|e| Error::Open(self.path.clone(), e))?;

        let now = Local::now();
        let (events, receiver) = sync_channel(EVENT_QUEUE_DEPTH);

        let shared = Arc::new(Shared {
            path: self.path,
            min_level: AtomicU8::new(self.level.repr()),
            location: self.location,
            closed: AtomicBool::new(false),
            sink: Mutex::new(Sink {
                writer: Some(BufWriter::with_capacity(self.buffer_size, file)),
                prefixes: Level::prefix_table(self.colored),
                buffer_size: self.buffer_size,
            }),
            rotation: Mutex::new(RotationState::default()),
            flags: RotationFlags::new(self.time_rotation, self.rotate_size, self.rotate_lines),
            clock: Clock::new(now),
            hook: RwLock::new(self.hook),
            events,
            rotate_errors: AtomicU64::new(0),
            format_errors: AtomicU64::new(0),
            dropped_events: AtomicU64::new(0),
        });

        let daemon = Daemon::new(Arc::clone(&shared), receiver, now);
        let handle = thread::Builder::new()
            .name("logspool-rotate".into())
            .spawn(move || daemon.run())
            .map_err(Error::Io)?;

        Ok(FileLogger::from_parts(shared, handle))
    }
}
