//! Per-level log file lifecycle
//!
//! A `LevelWriter` owns at most one open file for its level. Under its lock it
//! triggers the periodic purge, rotates on a day change or when the size
//! threshold would be reached, and appends the record. Nothing here returns
//! an error to the caller: failures are written as a diagnostic line into the
//! previous file, or to stderr when there is none.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local, NaiveDate};

use super::buffer::BufferPool;
use super::prefix::write_prefix;
use super::retention::{purge_due, PurgeCoordinator, PurgeReport};
use crate::config::ConfigStore;
use crate::level::Level;
use crate::naming::{Naming, TokenSource};

/// Shared engine state a writer needs for one write
#[derive(Clone, Copy)]
pub struct WriteContext<'a> {
    pub naming: &'a Naming,
    pub config: &'a ConfigStore,
    pub purge: &'a PurgeCoordinator,
    pub tokens: &'a TokenSource,
    pub pool: &'a BufferPool,
    pub host: &'a str,
}

/// What happened during one write, reported after the lock is released
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// New file opened for this write
    pub rotated: Option<PathBuf>,
    /// Sweep triggered by this write
    pub purged: Option<PurgeReport>,
    /// Diagnostic lines emitted instead of failing
    pub diagnostics: usize,
}

#[derive(Debug, Default)]
struct WriterState {
    file: Option<File>,
    path: Option<PathBuf>,
    day: Option<NaiveDate>,
    size: u64,
    last_purge: Option<DateTime<Local>>,
}

/// File lifecycle state machine for one level
#[derive(Debug)]
pub struct LevelWriter {
    level: Level,
    state: Mutex<WriterState>,
}

impl LevelWriter {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            state: Mutex::new(WriterState::default()),
        }
    }

    /// Write one complete record stamped with `time`
    pub fn write(&self, ctx: &WriteContext<'_>, time: &DateTime<Local>, data: &[u8]) -> WriteOutcome {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let state = &mut *state;
        let mut outcome = WriteOutcome::default();

        if purge_due(state.last_purge, *time) {
            let file = &mut state.file;
            let diagnostics = &mut outcome.diagnostics;
            let report = ctx.purge.sweep(ctx.naming.dir(), ctx.config.max_days(), |path, e| {
                *diagnostics += 1;
                self.diagnose(
                    file.as_mut(),
                    ctx,
                    time,
                    format_args!("failed to purge {}: {}", path.display(), e),
                    None,
                );
            });
            state.last_purge = Some(*time);
            outcome.purged = Some(report);
        }

        let date = time.date_naive();
        let len = data.len() as u64;
        let max_size = ctx.config.max_file_size();
        let needs_rotation = state.file.is_none()
            || state.day != Some(date)
            || (max_size > 0 && state.size + len >= max_size);

        if needs_rotation {
            let path = ctx.naming.log_file(self.level, date, ctx.tokens.next(time));
            let file = match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => file,
                Err(e) => {
                    outcome.diagnostics += 1;
                    self.diagnose(
                        state.file.as_mut(),
                        ctx,
                        time,
                        format_args!("failed to open {}: {}", path.display(), e),
                        Some(data),
                    );
                    return outcome;
                }
            };

            // Dropping the previous handle closes it; close errors are not reported by std
            state.file = Some(file);
            state.path = Some(path.clone());
            state.day = Some(date);
            state.size = 0;

            outcome.diagnostics += self.replace_symlink(state, ctx, time, &path);
            outcome.rotated = Some(path);
        }

        if let Some(file) = state.file.as_mut() {
            match file.write_all(data) {
                Ok(()) => state.size += len,
                Err(e) => {
                    outcome.diagnostics += 1;
                    self.diagnose(
                        None,
                        ctx,
                        time,
                        format_args!("failed to write {} log: {}", self.level, e),
                        Some(data),
                    );
                }
            }
        }

        outcome
    }

    /// Point the level symlink at the newly opened file
    ///
    /// Remove and create are separate steps; observers may briefly see no
    /// link. Returns the number of diagnostics written.
    fn replace_symlink(
        &self,
        state: &mut WriterState,
        ctx: &WriteContext<'_>,
        time: &DateTime<Local>,
        path: &Path,
    ) -> usize {
        let link = ctx.naming.symlink(self.level);
        let mut diagnostics = 0;

        if let Err(e) = remove_existing(link) {
            diagnostics += 1;
            self.diagnose(
                state.file.as_mut(),
                ctx,
                time,
                format_args!("failed to remove {}: {}", link.display(), e),
                None,
            );
        }

        let Some(target) = path.file_name() else {
            return diagnostics;
        };
        if let Err(e) = create_link(Path::new(target), link) {
            diagnostics += 1;
            self.diagnose(
                state.file.as_mut(),
                ctx,
                time,
                format_args!("failed to link {}: {}", link.display(), e),
                None,
            );
        }

        diagnostics
    }

    /// Write `prefix + message` and then the original record to `sink`, or
    /// to stderr when there is no open file
    fn diagnose(
        &self,
        sink: Option<&mut File>,
        ctx: &WriteContext<'_>,
        time: &DateTime<Local>,
        message: fmt::Arguments<'_>,
        original: Option<&[u8]>,
    ) {
        let mut buf = ctx.pool.acquire();
        write_prefix(&mut buf, self.level, time, None, ctx.config, ctx.host);
        let _ = buf.write_fmt(message);
        buf.push(b'\n');

        match sink {
            Some(file) => {
                let _ = file.write_all(&buf);
                if let Some(original) = original {
                    let _ = file.write_all(original);
                }
            }
            None => {
                let mut stderr = io::stderr().lock();
                let _ = stderr.write_all(&buf);
                if let Some(original) = original {
                    let _ = stderr.write_all(original);
                }
            }
        }
    }

    /// Close the open file and forget day, size and purge history
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = WriterState::default();
    }

    /// Path of the currently open file
    pub fn current_path(&self) -> Option<PathBuf> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .path
            .clone()
    }

    /// Bytes written to the currently open file
    pub fn current_size(&self) -> u64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).size
    }
}

fn remove_existing(link: &Path) -> io::Result<()> {
    match fs::symlink_metadata(link) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(link),
        Ok(_) => fs::remove_file(link),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn create_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Without symlinks, a marker file holds the name of the newest file
#[cfg(not(unix))]
fn create_link(target: &Path, link: &Path) -> io::Result<()> {
    fs::write(link, target.to_string_lossy().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        naming: Naming,
        config: ConfigStore,
        purge: PurgeCoordinator,
        tokens: TokenSource,
        pool: BufferPool,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let identity = Identity {
                program: "app".to_string(),
                host: "box".to_string(),
                os_user: "alice".to_string(),
            };
            let naming = Naming::new(dir.path(), "%P", "%P", &identity);
            Self {
                _dir: dir,
                naming,
                config: ConfigStore::default(),
                purge: PurgeCoordinator::new(),
                tokens: TokenSource::new(),
                pool: BufferPool::default(),
            }
        }

        fn ctx(&self) -> WriteContext<'_> {
            WriteContext {
                naming: &self.naming,
                config: &self.config,
                purge: &self.purge,
                tokens: &self.tokens,
                pool: &self.pool,
                host: "box",
            }
        }

        fn log_files(&self) -> Vec<PathBuf> {
            let mut files: Vec<PathBuf> = fs::read_dir(self.naming.dir())
                .unwrap()
                .map(|e| e.unwrap().path())
                .filter(|p| p.extension().map(|e| e == "log").unwrap_or(false))
                .collect();
            files.sort();
            files
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_first_write_opens_file() {
        let fx = Fixture::new();
        let writer = LevelWriter::new(Level::Info);

        let outcome = writer.write(&fx.ctx(), &at(18, 9), b"hello\n");
        let path = outcome.rotated.expect("first write must open a file");
        assert!(outcome.purged.is_some(), "first write triggers a purge");
        assert_eq!(outcome.diagnostics, 0);

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("app.info_20261018."), "{}", name);
        assert!(name.ends_with(".log"));
        assert_eq!(fs::read(&path).unwrap(), b"hello\n");
        assert_eq!(writer.current_size(), 6);
    }

    #[test]
    fn test_same_day_appends_to_one_file() {
        let fx = Fixture::new();
        let writer = LevelWriter::new(Level::Warn);

        for i in 0..20 {
            let outcome = writer.write(&fx.ctx(), &at(18, 10), format!("line {}\n", i).as_bytes());
            assert_eq!(outcome.rotated.is_some(), i == 0);
        }

        let files = fx.log_files();
        assert_eq!(files.len(), 1);
        let content = fs::read_to_string(&files[0]).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 20);
        assert_eq!(lines[0], "line 0");
        assert_eq!(lines[19], "line 19");
    }

    #[test]
    fn test_day_change_rotates() {
        let fx = Fixture::new();
        let writer = LevelWriter::new(Level::Info);

        writer.write(&fx.ctx(), &at(18, 23), b"before midnight\n");
        let outcome = writer.write(&fx.ctx(), &at(19, 0), b"after midnight\n");

        let path = outcome.rotated.expect("day change must rotate");
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("_20261019."));
        assert_eq!(fx.log_files().len(), 2);
    }

    #[test]
    fn test_size_threshold_rotates_before_write() {
        let fx = Fixture::new();
        fx.config.set_max_file_size(20);
        let writer = LevelWriter::new(Level::Error);

        let first = writer.write(&fx.ctx(), &at(18, 9), b"0123456789\n").rotated.unwrap();
        // 11 + 8 = 19 stays below 20
        assert!(writer.write(&fx.ctx(), &at(18, 9), b"abcdefg\n").rotated.is_none());
        // 19 + 1 reaches the threshold
        let second = writer.write(&fx.ctx(), &at(18, 9), b"\n").rotated.unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read(&first).unwrap(), b"0123456789\nabcdefg\n");
        assert_eq!(fs::read(&second).unwrap(), b"\n");
        assert_eq!(writer.current_size(), 1);
    }

    #[test]
    fn test_record_larger_than_threshold_still_lands() {
        let fx = Fixture::new();
        fx.config.set_max_file_size(4);
        let writer = LevelWriter::new(Level::Info);

        let big = b"a record longer than the threshold\n";
        let path = writer.write(&fx.ctx(), &at(18, 9), big).rotated.unwrap();
        assert_eq!(fs::read(&path).unwrap(), big);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_follows_newest_file() {
        let fx = Fixture::new();
        fx.config.set_max_file_size(8);
        let writer = LevelWriter::new(Level::Query);
        let link = fx.naming.symlink(Level::Query).to_path_buf();

        let first = writer.write(&fx.ctx(), &at(18, 9), b"first\n").rotated.unwrap();
        assert_eq!(fs::read_link(&link).unwrap(), Path::new(first.file_name().unwrap()));

        let second = writer.write(&fx.ctx(), &at(18, 9), b"second\n").rotated.unwrap();
        assert_eq!(fs::read_link(&link).unwrap(), Path::new(second.file_name().unwrap()));
        assert_eq!(fs::read_to_string(&link).unwrap(), "second\n");
    }

    #[test]
    fn test_open_failure_keeps_state() {
        let fx = Fixture::new();
        let writer = LevelWriter::new(Level::Info);
        writer.write(&fx.ctx(), &at(18, 9), b"kept\n");
        let before = writer.current_path().unwrap();

        // A log directory that vanished makes the next rotation fail
        let missing = Naming::new(
            &fx.naming.dir().join("gone"),
            "%P",
            "%P",
            &Identity {
                program: "app".to_string(),
                host: "box".to_string(),
                os_user: "alice".to_string(),
            },
        );
        let ctx = WriteContext {
            naming: &missing,
            ..fx.ctx()
        };
        let outcome = writer.write(&ctx, &at(19, 9), b"lost\n");

        assert!(outcome.rotated.is_none());
        assert!(outcome.diagnostics >= 1);
        assert_eq!(writer.current_path().unwrap(), before);

        // The diagnostic and the record land in the previous file
        let content = fs::read_to_string(&before).unwrap();
        assert!(content.starts_with("kept\n"));
        assert!(content.contains("failed to open"));
        assert!(content.ends_with("lost\n"));
    }

    #[test]
    fn test_first_open_failure_without_previous_file() {
        let fx = Fixture::new();
        let writer = LevelWriter::new(Level::Warn);
        let gone = fx.naming.dir().join("gone");
        let missing = Naming::new(
            &gone,
            "%P",
            "%P",
            &Identity {
                program: "app".to_string(),
                host: "box".to_string(),
                os_user: "alice".to_string(),
            },
        );
        let ctx = WriteContext {
            naming: &missing,
            ..fx.ctx()
        };

        // No open file yet, so the diagnostic and record go to stderr
        let outcome = writer.write(&ctx, &at(18, 9), b"lost\n");

        assert!(outcome.rotated.is_none());
        assert!(outcome.diagnostics >= 1);
        assert!(writer.current_path().is_none());
        assert_eq!(writer.current_size(), 0);
        assert!(!gone.exists());
        assert!(fx.log_files().is_empty());

        // Once the directory is usable the writer recovers
        let outcome = writer.write(&fx.ctx(), &at(18, 9), b"found\n");
        let path = outcome.rotated.expect("next write must open a file");
        assert_eq!(fs::read(&path).unwrap(), b"found\n");
    }

    #[test]
    fn test_purge_runs_once_per_interval() {
        let fx = Fixture::new();
        let writer = LevelWriter::new(Level::Info);

        assert!(writer.write(&fx.ctx(), &at(18, 9), b"a\n").purged.is_some());
        assert!(writer.write(&fx.ctx(), &at(18, 9), b"b\n").purged.is_none());

        // Another writer keeps its own cadence
        let other = LevelWriter::new(Level::Warn);
        assert!(other.write(&fx.ctx(), &at(18, 9), b"c\n").purged.is_some());
    }

    #[test]
    fn test_reset_closes_file() {
        let fx = Fixture::new();
        let writer = LevelWriter::new(Level::Info);
        writer.write(&fx.ctx(), &at(18, 9), b"a\n");
        assert!(writer.current_path().is_some());

        writer.reset();
        assert!(writer.current_path().is_none());
        assert_eq!(writer.current_size(), 0);
        assert!(writer.write(&fx.ctx(), &at(18, 9), b"b\n").rotated.is_some());
    }
}
