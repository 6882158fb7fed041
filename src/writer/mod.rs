//! The writer facade: per-level entry points, the lock-guarded buffered sink, and
//! the idempotent close path. The background rotation daemon lives in [`daemon`].

mod builder;
mod daemon;
mod from_config;

pub use builder::FileLoggerBuilder;

use crate::clock::Clock;
use crate::error::Error;
use crate::fmt::{Template, Value};
use crate::hook::Hook;
use crate::level::Level;
use crate::rotation::{RotationFlags, RotationState};
use daemon::Event;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

/// Page-sized by default; larger buffers help bursty workloads but delay visibility.
pub(crate) const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Everything guarded by the stream lock. The buffered stream and the file handle
/// stay consistent because any swap of the handle immediately rewraps the stream,
/// under this lock.
pub(crate) struct Sink {
    /// `None` after close, the one place the descriptor is dropped.
    pub(crate) writer: Option<BufWriter<File>>,
    /// Prefix strings indexed by `Level::repr()`; rebuilt here, under the lock,
    /// when the colored toggle flips.
    pub(crate) prefixes: [String; Level::COUNT],
    pub(crate) buffer_size: usize,
}

impl Sink {
    /// Best-effort: a flush failure must not take down a logging call.
    pub(crate) fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.flush();
        }
    }

    /// Rewraps the stream around a freshly opened handle. The old `BufWriter` is
    /// flushed by the caller before the rename that precedes this swap.
    pub(crate) fn replace_file(&mut self, file: File) {
        self.writer = Some(BufWriter::with_capacity(self.buffer_size, file));
    }
}

/// State shared between the facade, concurrent writers, and the daemon.
pub(crate) struct Shared {
    pub(crate) path: PathBuf,
    pub(crate) min_level: AtomicU8,
    /// Whether records carry the `file:line` call-site segment.
    pub(crate) location: bool,
    pub(crate) closed: AtomicBool,
    /// Stream lock: whole records interleave, never partial ones.
    pub(crate) sink: Mutex<Sink>,
    /// Rotation bookkeeping lock: decide-and-act is a single critical section.
    pub(crate) rotation: Mutex<RotationState>,
    pub(crate) flags: RotationFlags,
    pub(crate) clock: Clock,
    pub(crate) hook: RwLock<Option<Arc<dyn Hook>>>,
    /// Bounded, drop-tolerant channel into the daemon.
    pub(crate) events: SyncSender<Event>,
    pub(crate) rotate_errors: AtomicU64,
    pub(crate) format_errors: AtomicU64,
    pub(crate) dropped_events: AtomicU64,
}

impl Shared {
    pub(crate) fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn min_level(&self) -> Level {
        Level::from_repr(self.min_level.load(Ordering::Relaxed))
    }

    pub(crate) fn bump_rotate_errors(&self) {
        self.rotate_errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// A buffered, rotating writer for one destination file.
///
/// Cheap to share behind an `Arc`; every entry point takes `&self` and is safe to
/// call from any thread. Writes below the configured minimum level cost a single
/// atomic comparison.
pub struct FileLogger {
    pub(crate) shared: Arc<Shared>,
    daemon: Mutex<Option<JoinHandle<()>>>,
}

impl FileLogger {
    /// Entry point for construction; see [`FileLoggerBuilder`] for the knobs.
    pub fn builder(path: impl Into<PathBuf>) -> FileLoggerBuilder {
        FileLoggerBuilder::new(path.into())
    }

    /// Opens the configured destination from a parsed [`Config`](crate::config::Config).
    ///
    /// # Errors
    /// [`Error::Open`] when the target file cannot be opened.
    pub fn from_config(config: &crate::config::Config) -> Result<Self, Error> {
        from_config::builder_from_config(config).build()
    }

    pub(crate) fn from_parts(shared: Arc<Shared>, handle: JoinHandle<()>) -> Self {
        Self {
            shared,
            daemon: Mutex::new(Some(handle)),
        }
    }

    /// Writes one plain record (no placeholder substitution) at `level`.
    #[track_caller]
    pub fn log(&self, level: Level, message: &str) {
        if level < self.shared.min_level() {
            return;
        }
        let location = self.call_site();
        self.write_plain(level, message, location);
    }

    /// Writes one templated record; placeholders are substituted from `args`.
    ///
    /// Too few arguments skip the record and count a format error; logging never
    /// fails the caller. A type-mismatched argument degrades to a `%!(x)` marker.
    #[track_caller]
    pub fn logf(&self, level: Level, template: &str, args: &[Value<'_>]) {
        if level < self.shared.min_level() {
            return;
        }
        let location = self.call_site();
        self.write_formatted(level, template, args, location);
    }

    #[track_caller]
    pub fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }

    #[track_caller]
    pub fn tracef(&self, template: &str, args: &[Value<'_>]) {
        self.logf(Level::Trace, template, args);
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    #[track_caller]
    pub fn debugf(&self, template: &str, args: &[Value<'_>]) {
        self.logf(Level::Debug, template, args);
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    #[track_caller]
    pub fn infof(&self, template: &str, args: &[Value<'_>]) {
        self.logf(Level::Info, template, args);
    }

    #[track_caller]
    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    #[track_caller]
    pub fn warnf(&self, template: &str, args: &[Value<'_>]) {
        self.logf(Level::Warn, template, args);
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    #[track_caller]
    pub fn errorf(&self, template: &str, args: &[Value<'_>]) {
        self.logf(Level::Error, template, args);
    }

    #[track_caller]
    pub fn critical(&self, message: &str) {
        self.log(Level::Critical, message);
    }

    #[track_caller]
    pub fn criticalf(&self, template: &str, args: &[Value<'_>]) {
        self.logf(Level::Critical, template, args);
    }

    /// Lowers or raises the minimum level on a live writer.
    pub fn set_level(&self, level: Level) {
        self.shared.min_level.store(level.repr(), Ordering::Relaxed);
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.shared.min_level()
    }

    /// Enables or disables calendar-day rotation.
    pub fn set_time_rotation(&self, enabled: bool) {
        self.shared.flags.time.store(enabled, Ordering::Relaxed);
    }

    /// Byte threshold for size rotation; 0 disables it.
    pub fn set_rotate_size(&self, bytes: u64) {
        self.shared.flags.size_limit.store(bytes, Ordering::Relaxed);
    }

    /// Line threshold for line rotation; 0 disables it.
    pub fn set_rotate_lines(&self, lines: u64) {
        self.shared.flags.line_limit.store(lines, Ordering::Relaxed);
    }

    /// Flips colored prefixes. The prefix table is rebuilt under the stream lock so
    /// no record mixes the two styles.
    pub fn set_colored(&self, colored: bool) {
        if let Ok(mut sink) = self.shared.sink.lock() {
            sink.prefixes = Level::prefix_table(colored);
        }
    }

    /// Registers the hook, replacing any previous one.
    pub fn set_hook(&self, hook: impl Hook + 'static) {
        if let Ok(mut slot) = self.shared.hook.write() {
            *slot = Some(Arc::new(hook));
        }
    }

    /// Removes the hook; in-flight submissions already queued may still fire.
    pub fn clear_hook(&self) {
        if let Ok(mut slot) = self.shared.hook.write() {
            *slot = None;
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Rename/reopen failures during rotation; the writer keeps writing and the
    /// daemon keeps retrying, so this counter is how breakage is observed.
    #[must_use]
    pub fn rotate_error_count(&self) -> u64 {
        self.shared.rotate_errors.load(Ordering::Relaxed)
    }

    /// Skipped records (too few arguments) plus mismatch markers emitted.
    #[must_use]
    pub fn format_error_count(&self) -> u64 {
        self.shared.format_errors.load(Ordering::Relaxed)
    }

    /// Accounting/hook events dropped because the daemon queue was full.
    #[must_use]
    pub fn dropped_event_count(&self) -> u64 {
        self.shared.dropped_events.load(Ordering::Relaxed)
    }

    /// Forces buffered bytes to the file.
    ///
    /// # Errors
    /// The underlying I/O error; a closed writer flushes trivially.
    pub fn flush(&self) -> Result<(), Error> {
        let Ok(mut sink) = self.shared.sink.lock() else {
            return Ok(());
        };
        if let Some(writer) = sink.writer.as_mut() {
            writer.flush().map_err(Error::Io)?;
        }
        Ok(())
    }

    /// Stops the daemon, flushes, and closes the file handle exactly once.
    /// Safe to call concurrently and repeatedly; later writes are cheap no-ops.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        // Wake the daemon if it is parked in recv_timeout; the closed flag covers
        // the case where the queue is full.
        let _ = self.shared.events.try_send(Event::Shutdown);
        if let Ok(mut slot) = self.daemon.lock()
            && let Some(handle) = slot.take()
        {
            let _ = handle.join();
        }

        if let Ok(mut sink) = self.shared.sink.lock() {
            sink.flush();
            // Dropping the BufWriter here is the single physical close.
            sink.writer = None;
        }
    }

    /// The injected source-locator capability: `#[track_caller]` propagation makes
    /// this the immediate caller of the public entry point, at zero unwinding cost.
    #[track_caller]
    fn call_site(&self) -> Option<&'static Location<'static>> {
        if self.shared.location {
            Some(Location::caller())
        } else {
            None
        }
    }

    fn write_plain(
        &self,
        level: Level,
        message: &str,
        location: Option<&'static Location<'static>>,
    ) {
        if self.shared.closed() {
            return;
        }
        let snapshot = self.shared.clock.snapshot();
        let mut bytes = 0;

        {
            let Ok(mut sink) = self.shared.sink.lock() else {
                return;
            };
            let Sink {
                writer, prefixes, ..
            } = &mut *sink;
            let Some(writer) = writer.as_mut() else {
                return;
            };

            bytes += write_part(writer, snapshot.prefix.as_bytes());
            bytes += write_part(writer, prefixes[level.repr() as usize].as_bytes());
            if let Some(location) = location {
                let segment = format!("{}:{} ", location.file(), location.line());
                bytes += write_part(writer, segment.as_bytes());
            }
            bytes += write_part(writer, message.as_bytes());
            bytes += write_part(writer, b"\n");
        }

        self.after_write(level, bytes, || message.to_string());
    }

    fn write_formatted(
        &self,
        level: Level,
        template: &str,
        args: &[Value<'_>],
        location: Option<&'static Location<'static>>,
    ) {
        if self.shared.closed() {
            return;
        }

        let template = Template::parse(template);
        if args.len() < template.placeholder_count() {
            // Explicit argument-count policy: skip the record, count the error.
            self.shared.format_errors.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let snapshot = self.shared.clock.snapshot();
        let mut bytes = 0;
        let mut mismatches = 0;

        {
            let Ok(mut sink) = self.shared.sink.lock() else {
                return;
            };
            let Sink {
                writer, prefixes, ..
            } = &mut *sink;
            let Some(writer) = writer.as_mut() else {
                return;
            };

            bytes += write_part(writer, snapshot.prefix.as_bytes());
            bytes += write_part(writer, prefixes[level.repr() as usize].as_bytes());
            if let Some(location) = location {
                let segment = format!("{}:{} ", location.file(), location.line());
                bytes += write_part(writer, segment.as_bytes());
            }
            if let Ok(rendered) = template.render_to(writer, args) {
                bytes += rendered.bytes;
                mismatches = rendered.mismatches;
            }
            bytes += write_part(writer, b"\n");
        }

        if mismatches > 0 {
            let count = u64::try_from(mismatches).unwrap_or(u64::MAX);
            self.shared.format_errors.fetch_add(count, Ordering::Relaxed);
        }
        self.after_write(level, bytes, || {
            template.render(args).unwrap_or_default()
        });
    }

    /// Post-record work done outside the stream lock: the byte-count report for the
    /// daemon and the hook submission. Both are best-effort `try_send`s; a full
    /// queue drops the event and counts it rather than stalling the caller.
    fn after_write(&self, level: Level, bytes: usize, render: impl FnOnce() -> String) {
        if bytes > 0 && self.shared.flags.size_or_lines_enabled() {
            let report = Event::Wrote(u64::try_from(bytes).unwrap_or(u64::MAX));
            if self.shared.events.try_send(report).is_err() {
                self.shared.dropped_events.fetch_add(1, Ordering::Relaxed);
            }
        }

        let has_hook = self
            .shared
            .hook
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false);
        if has_hook
            && self
                .shared
                .events
                .try_send(Event::Hook(level, render()))
                .is_err()
        {
            self.shared.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Counts the bytes a part would occupy even when the underlying write fails, so
/// a transient I/O error can't wedge the rotation accounting.
fn write_part(writer: &mut BufWriter<File>, part: &[u8]) -> usize {
    let _ = writer.write_all(part);
    part.len()
}
