//! The per-writer background daemon: sole publisher of timestamp snapshots and the
//! only actor permitted to rename or reopen the log file.
//!
//! It multiplexes a 1-second tick (day rotation, snapshot refresh, reopen retries)
//! with the bounded event queue (size/line accounting, hook submissions). Writers
//! only ever `try_send` into the queue, so a busy daemon can never stall them.

use super::Shared;
use crate::clock::TimeSnapshot;
use crate::level::Level;
use crate::rotation;
use chrono::{DateTime, Local};
use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Queue depth mirrors the reference's accounting channel; overflow drops rather
/// than blocks.
pub(crate) const EVENT_QUEUE_DEPTH: usize = 4096;

const TICK: Duration = Duration::from_secs(1);

/// Everything writers hand off to the daemon.
pub(crate) enum Event {
    /// Byte count of one finished record, for size/line accounting.
    Wrote(u64),
    /// A finished record for the registered hook.
    Hook(Level, String),
    /// Close is underway; stop consuming.
    Shutdown,
}

/// How one rotation attempt ended.
enum RotateOutcome {
    /// Renamed and reopened; the sink now wraps a fresh file.
    Done,
    /// Renamed, but the fresh reopen failed; writes continue into the renamed
    /// file and the reopen is retried on later ticks.
    ReopenPending,
    /// Rename itself failed; nothing changed on disk.
    RenameFailed,
}

pub(crate) struct Daemon {
    shared: Arc<Shared>,
    events: Receiver<Event>,
    /// The daemon's own calendar: the date records are currently written under.
    date: String,
}

impl Daemon {
    pub(crate) fn new(shared: Arc<Shared>, events: Receiver<Event>, now: DateTime<Local>) -> Self {
        let snapshot = TimeSnapshot::capture(now);
        Self {
            shared,
            events,
            date: snapshot.date,
        }
    }

    pub(crate) fn run(mut self) {
        let mut next_tick = Instant::now() + TICK;

        loop {
            if self.shared.closed() {
                break;
            }

            let timeout = next_tick.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(timeout) {
                Ok(Event::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(Event::Wrote(bytes)) => self.handle_wrote(bytes),
                Ok(Event::Hook(level, message)) => self.fire_hook(level, &message),
                Err(RecvTimeoutError::Timeout) => {
                    self.handle_tick(Local::now());
                    next_tick = Instant::now() + TICK;
                }
            }
        }
    }

    /// Once per second: publish a fresh snapshot, retry any pending reopen, and
    /// roll the file when the calendar day changed.
    pub(crate) fn handle_tick(&mut self, now: DateTime<Local>) {
        let snapshot = TimeSnapshot::capture(now);
        let day_changed = snapshot.date != self.date;
        let new_date = snapshot.date.clone();
        self.shared.clock.publish(snapshot);

        let Ok(mut state) = self.shared.rotation.lock() else {
            return;
        };

        if state.reopen_pending {
            self.retry_reopen(&mut state);
        }

        if !day_changed {
            return;
        }

        if self.shared.flags.time.load(Ordering::Relaxed) {
            // Records so far were written under self.date; that names the archive.
            let target = rotation::day_rotated_name(&self.shared.path, &self.date);
            match self.rotate_active_file(&target) {
                RotateOutcome::Done => state.complete_day(),
                RotateOutcome::ReopenPending => {
                    state.complete_day();
                    state.reopen_pending = true;
                }
                // Dates stay put so the next tick retries the same rename.
                RotateOutcome::RenameFailed => return,
            }
        }

        self.date = new_date;
    }

    /// One record's byte count arrived: accumulate, and rotate when a configured
    /// threshold is crossed. The bookkeeping lock is held for the whole sequence.
    pub(crate) fn handle_wrote(&mut self, bytes: u64) {
        let size_limit = self.shared.flags.size_limit.load(Ordering::Relaxed);
        let line_limit = self.shared.flags.line_limit.load(Ordering::Relaxed);
        if size_limit == 0 && line_limit == 0 {
            return;
        }

        let Ok(mut state) = self.shared.rotation.lock() else {
            return;
        };
        state.record(bytes);
        if !state.crossed(size_limit, line_limit) {
            return;
        }

        let date = self
            .shared
            .flags
            .time
            .load(Ordering::Relaxed)
            .then(|| self.date.clone());
        let target =
            rotation::generation_name(&self.shared.path, date.as_deref(), state.generation + 1);
        match self.rotate_active_file(&target) {
            RotateOutcome::Done => state.complete_generation(),
            RotateOutcome::ReopenPending => {
                state.complete_generation();
                state.reopen_pending = true;
            }
            // Counters keep accumulating; the next record retries.
            RotateOutcome::RenameFailed => {}
        }
    }

    /// The rename-and-reopen swap, entirely under the stream lock so no record is
    /// lost or split across the two files.
    fn rotate_active_file(&self, target: &Path) -> RotateOutcome {
        let Ok(mut sink) = self.shared.sink.lock() else {
            return RotateOutcome::RenameFailed;
        };
        if sink.writer.is_none() {
            // Closed under us; nothing to rotate.
            return RotateOutcome::RenameFailed;
        }

        // Buffered bytes belong to the file being archived.
        sink.flush();

        if fs::rename(&self.shared.path, target).is_err() {
            self.shared.bump_rotate_errors();
            return RotateOutcome::RenameFailed;
        }

        match rotation::open_append(&self.shared.path) {
            Ok(file) => {
                sink.replace_file(file);
                RotateOutcome::Done
            }
            Err(_) => {
                // Keep the old handle: writes land in the renamed file instead of
                // vanishing, and the tick loop retries the reopen.
                self.shared.bump_rotate_errors();
                RotateOutcome::ReopenPending
            }
        }
    }

    /// A previous rotation renamed the file but could not reopen the path; swap in
    /// a fresh handle as soon as the open succeeds again.
    fn retry_reopen(&self, state: &mut crate::rotation::RotationState) {
        let Ok(mut sink) = self.shared.sink.lock() else {
            return;
        };
        if sink.writer.is_none() {
            state.reopen_pending = false;
            return;
        }

        sink.flush();
        match rotation::open_append(&self.shared.path) {
            Ok(file) => {
                sink.replace_file(file);
                state.reopen_pending = false;
            }
            Err(_) => self.shared.bump_rotate_errors(),
        }
    }

    /// Hook execution is contained here: a panicking hook is swallowed so the
    /// daemon (and with it rotation) survives.
    fn fire_hook(&self, level: Level, message: &str) {
        let hook = self
            .shared
            .hook
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(Arc::clone));
        if let Some(hook) = hook {
            let _ = catch_unwind(AssertUnwindSafe(|| hook.fire(level, message)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::FileLogger;
    use chrono::TimeZone;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::mpsc::sync_channel;
    use tempfile::TempDir;

    fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    /// Spawns the real logger but drives rotation through a hand-fed daemon, so
    /// the calendar and the accounting are fully synthetic.
    fn logger_at(dir: &TempDir, time_rotation: bool) -> (FileLogger, PathBuf) {
        let path = dir.path().join("app.log");
        let logger = FileLogger::builder(&path)
            .colored(false)
            .location(false)
            .time_rotation(time_rotation)
            .build()
            .unwrap();
        (logger, path)
    }

    fn synthetic_daemon(logger: &FileLogger, now: DateTime<Local>) -> Daemon {
        let (_tx, rx) = sync_channel(1);
        Daemon::new(Arc::clone(&logger.shared), rx, now)
    }

    #[test]
    fn day_change_rotates_once_with_prior_date_suffix() {
        let dir = TempDir::new().unwrap();
        let (logger, path) = logger_at(&dir, true);
        logger.info("before midnight");
        logger.flush().unwrap();

        let mut daemon = synthetic_daemon(&logger, local(2031, 8, 29, 23));
        daemon.handle_tick(local(2031, 8, 30, 0));

        let archived = dir.path().join("app.log.2031-08-29");
        let content = fs::read_to_string(&archived).unwrap();
        assert!(content.contains("before midnight"));
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);

        // A second tick on the same day must not rotate again.
        daemon.handle_tick(local(2031, 8, 30, 1));
        assert!(!dir.path().join("app.log.2031-08-30").exists());
        logger.close();
    }

    #[test]
    fn day_change_with_time_rotation_disabled_only_advances_calendar() {
        let dir = TempDir::new().unwrap();
        let (logger, path) = logger_at(&dir, false);
        logger.info("stays put");
        logger.flush().unwrap();

        let mut daemon = synthetic_daemon(&logger, local(2031, 1, 31, 23));
        daemon.handle_tick(local(2031, 2, 1, 0));

        assert!(!dir.path().join("app.log.2031-01-31").exists());
        assert!(fs::metadata(&path).unwrap().len() > 0);
        logger.close();
    }

    #[test]
    fn day_rotation_resets_generation_and_accumulators() {
        let dir = TempDir::new().unwrap();
        let (logger, _path) = logger_at(&dir, true);
        logger.info("x");
        logger.flush().unwrap();

        {
            let mut state = logger.shared.rotation.lock().unwrap();
            state.generation = 4;
            state.record(512);
        }

        let mut daemon = synthetic_daemon(&logger, local(2031, 8, 29, 23));
        daemon.handle_tick(local(2031, 8, 30, 0));

        let state = logger.shared.rotation.lock().unwrap();
        assert_eq!(state.generation, 0);
        assert_eq!(state.bytes, 0);
        assert_eq!(state.lines, 0);
        drop(state);
        logger.close();
    }

    #[test]
    fn size_threshold_rotates_at_the_crossing_report() {
        let dir = TempDir::new().unwrap();
        let (logger, path) = logger_at(&dir, false);
        for msg in ["first", "second", "third"] {
            logger.info(msg);
        }
        logger.flush().unwrap();

        // Enabled only now, so the live daemon saw no reports and all accounting
        // goes through the synthetic one.
        logger.shared.flags.size_limit.store(100, Ordering::Relaxed);
        let mut daemon = synthetic_daemon(&logger, local(2031, 8, 30, 12));
        daemon.handle_wrote(40);
        daemon.handle_wrote(40);
        assert!(!dir.path().join("app.log.1").exists());
        daemon.handle_wrote(40);

        let archived = fs::read_to_string(dir.path().join("app.log.1")).unwrap();
        assert!(archived.contains("first"));
        assert!(archived.contains("third"));
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);

        let state = logger.shared.rotation.lock().unwrap();
        assert_eq!(state.generation, 1);
        assert_eq!(state.bytes, 0);
        assert_eq!(state.lines, 0);
        drop(state);
        logger.close();
    }

    #[test]
    fn line_threshold_rotates_after_limit_plus_one() {
        let dir = TempDir::new().unwrap();
        let (logger, _path) = logger_at(&dir, false);
        logger.info("a");
        logger.flush().unwrap();

        logger.shared.flags.line_limit.store(2, Ordering::Relaxed);
        let mut daemon = synthetic_daemon(&logger, local(2031, 8, 30, 12));
        daemon.handle_wrote(10);
        daemon.handle_wrote(10);
        assert!(!dir.path().join("app.log.1").exists());
        daemon.handle_wrote(10);
        assert!(dir.path().join("app.log.1").exists());
        logger.close();
    }

    #[test]
    fn generation_names_carry_the_date_when_day_rotation_is_on() {
        let dir = TempDir::new().unwrap();
        let (logger, _path) = logger_at(&dir, true);
        logger.info("dated");
        logger.flush().unwrap();

        logger.shared.flags.size_limit.store(5, Ordering::Relaxed);
        let mut daemon = synthetic_daemon(&logger, local(2031, 8, 30, 12));
        daemon.handle_wrote(10);

        assert!(dir.path().join("app.log.2031-08-30.1").exists());
        logger.close();
    }

    #[test]
    fn reopen_failure_keeps_old_handle_and_recovers_on_a_later_tick() {
        let dir = TempDir::new().unwrap();
        let (logger, path) = logger_at(&dir, false);
        logger.info("before");
        logger.flush().unwrap();

        // A rotation whose rename landed but whose reopen cannot succeed: the
        // active file moves aside and a directory occupies the path.
        let archived = dir.path().join("app.log.1");
        fs::rename(&path, &archived).unwrap();
        fs::create_dir(&path).unwrap();
        logger.shared.rotation.lock().unwrap().reopen_pending = true;

        let mut daemon = synthetic_daemon(&logger, local(2031, 8, 30, 12));
        daemon.handle_tick(local(2031, 8, 30, 13));
        assert!(logger.shared.rotation.lock().unwrap().reopen_pending);
        assert!(logger.rotate_error_count() >= 1);

        // The old handle is still live: records keep landing in the renamed
        // file instead of vanishing.
        logger.info("while blocked");
        logger.flush().unwrap();
        assert!(fs::read_to_string(&archived).unwrap().contains("while blocked"));

        fs::remove_dir(&path).unwrap();
        daemon.handle_tick(local(2031, 8, 30, 14));
        assert!(!logger.shared.rotation.lock().unwrap().reopen_pending);

        logger.info("recovered");
        logger.flush().unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("recovered"));
        logger.close();
    }

    #[test]
    fn zero_limits_ignore_reports() {
        let dir = TempDir::new().unwrap();
        let (logger, _path) = logger_at(&dir, false);
        logger.info("a");
        logger.flush().unwrap();

        let mut daemon = synthetic_daemon(&logger, local(2031, 8, 30, 12));
        for _ in 0..1000 {
            daemon.handle_wrote(1_000_000);
        }
        assert!(!dir.path().join("app.log.1").exists());
        logger.close();
    }
}
