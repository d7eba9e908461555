//! Sink writer and rotation
//!
//! One owned file handle behind its own guard, so a write through the
//! handle can never race an in-progress rename. Rotation bookkeeping
//! lives with the handle: the post-write trigger check, the rename, and
//! the counter reset form a single critical section.

use crate::config::FileLoggerConfig;
use crate::error::{Error, Result};
use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Bookkeeping for the currently open file; reset whenever the file is
/// (re)opened.
#[derive(Debug)]
struct RotationState {
    cur_lines: u64,
    cur_size: u64,
    open_date: NaiveDate,
}

impl RotationState {
    fn for_file(path: &Path, file: &File) -> Result<Self> {
        let meta = file.metadata()?;
        let cur_size = meta.len();
        // A fresh file after a clean rotation is empty; a non-empty one
        // means the rename failed to vacate the name, so resync the line
        // count by scanning.
        let cur_lines = if cur_size > 0 { count_lines(path)? } else { 0 };
        Ok(Self {
            cur_lines,
            cur_size,
            open_date: Local::now().date_naive(),
        })
    }
}

#[derive(Debug)]
struct Inner {
    file: Option<File>,
    rot: RotationState,
}

/// The single owned file handle, exclusivity-guarded.
#[derive(Debug)]
pub(crate) struct MuxWriter {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl MuxWriter {
    /// Open (or create) the log file in append mode.
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = open_append(path)?;
        let rot = RotationState::for_file(path, &file)?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Inner {
                file: Some(file),
                rot,
            }),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Append `bytes`, update the rotation counters, and evaluate the
    /// rotation trigger. Returns whether a rotation happened.
    ///
    /// Rotation exhaustion is non-fatal: it is reported as an
    /// operator-visible warning and logging continues on the open file.
    pub(crate) fn write(&self, bytes: &[u8], config: &FileLoggerConfig) -> Result<bool> {
        let mut inner = self.inner.lock();
        {
            let file = inner.file.as_mut().ok_or(Error::Closed)?;
            file.write_all(bytes)?;
        }
        inner.rot.cur_size += bytes.len() as u64;
        inner.rot.cur_lines += count_newlines(bytes);

        if !should_rotate(&inner.rot, config) {
            return Ok(false);
        }
        match self.rotate_locked(&mut inner) {
            Ok(()) => Ok(true),
            Err(Error::RotationExhausted { path }) => {
                tracing::warn!(
                    path = %path.display(),
                    "log rotation skipped: no free numbered suffix"
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Force file contents to durable storage.
    pub(crate) fn sync(&self) -> Result<()> {
        let inner = self.inner.lock();
        let file = inner.file.as_ref().ok_or(Error::Closed)?;
        file.sync_all()?;
        Ok(())
    }

    /// Close the handle. Idempotent; subsequent writes fail with
    /// [`Error::Closed`].
    pub(crate) fn close(&self) {
        self.inner.lock().file = None;
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.inner.lock().file.is_none()
    }

    fn rotate_locked(&self, inner: &mut Inner) -> Result<()> {
        let today = Local::now().date_naive();
        let rotated = free_rotation_slot(&self.path, today)
            .ok_or_else(|| Error::RotationExhausted {
                path: self.path.clone(),
            })?;

        // Renaming while the handle is open is safe on Unix; if the
        // reopen fails the old handle still reaches the renamed file and
        // no byte is lost.
        fs::rename(&self.path, &rotated).map_err(|e| {
            Error::Rotation(format!(
                "rename {} -> {}: {e}",
                self.path.display(),
                rotated.display()
            ))
        })?;
        let file = open_append(&self.path)
            .map_err(|e| Error::Rotation(format!("reopen {}: {e}", self.path.display())))?;
        let rot = RotationState::for_file(&self.path, &file)?;
        inner.file = Some(file);
        inner.rot = rot;
        Ok(())
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().append(true).create(true).open(path)
}

fn should_rotate(rot: &RotationState, config: &FileLoggerConfig) -> bool {
    if !config.rotate {
        return false;
    }
    (config.max_lines > 0 && rot.cur_lines >= config.max_lines)
        || (config.max_size > 0 && rot.cur_size >= config.max_size)
        || (config.daily && rot.open_date != Local::now().date_naive())
}

/// Lowest unused `<path>.<date>.<NNN>` name, `NNN` in 001..=999.
fn free_rotation_slot(path: &Path, date: NaiveDate) -> Option<PathBuf> {
    (1..=999)
        .map(|n| rotated_path(path, date, n))
        .find(|candidate| fs::symlink_metadata(candidate).is_err())
}

fn rotated_path(path: &Path, date: NaiveDate, n: u32) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}.{:03}", date.format("%Y-%m-%d"), n));
    PathBuf::from(name)
}

fn count_newlines(bytes: &[u8]) -> u64 {
    bytes.iter().filter(|&&b| b == b'\n').count() as u64
}

fn count_lines(path: &Path) -> Result<u64> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }
        count += count_newlines(chunk);
        let len = chunk.len();
        reader.consume(len);
    }
    Ok(count)
}
