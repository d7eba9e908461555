//! File-based log sink with rotation and double-buffered async writes
//!
//! This crate provides the file backend for `scribe-logger`:
//! - Synchronous or double-buffered asynchronous writes, with rendezvous
//!   backpressure in async mode
//! - Automatic file rotation on line count, byte size, or calendar date
//! - Retention sweeps that retire rotated files past a configurable age
//! - Config via a builder or a serialized key/value document

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod buffer;
mod config;
mod error;
mod retention;
mod writer;

pub use buffer::{FlushErrorPolicy, ReportAndContinue};
pub use config::{
    DEFAULT_MAX_DAYS, DEFAULT_MAX_LINES, DEFAULT_MAX_SIZE, FileLoggerConfig,
    FileLoggerConfigBuilder, MIN_BUFFER_SIZE,
};
pub use error::{Error, Result};

use buffer::DoubleBuffer;
use retention::spawn_sweep;
use scribe_logger::{Level, Sink, SinkError};
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use writer::MuxWriter;

/// File sink: one owned log file with rotation, retention, and an
/// optional double-buffered write path.
///
/// In asynchronous mode a background flusher task services the buffer;
/// construction must then happen inside a Tokio runtime.
pub struct FileLogger {
    config: Arc<FileLoggerConfig>,
    writer: Arc<MuxWriter>,
    buffer: Option<Arc<DoubleBuffer>>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl FileLogger {
    /// Construct the sink with the default flush-error policy.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a missing filename (or, in async
    /// mode, a missing runtime), and I/O errors from creating the parent
    /// directory or opening the file. No partial sink is created.
    pub fn new(config: FileLoggerConfig) -> Result<Self> {
        Self::with_policy(config, Arc::new(ReportAndContinue))
    }

    /// Construct the sink with a custom [`FlushErrorPolicy`].
    ///
    /// # Errors
    ///
    /// See [`FileLogger::new`].
    pub fn with_policy(
        config: FileLoggerConfig,
        policy: Arc<dyn FlushErrorPolicy>,
    ) -> Result<Self> {
        let config = config.validated()?;
        let handle = if config.async_buffer {
            Some(tokio::runtime::Handle::try_current().map_err(|_| {
                Error::Configuration("asyncbuffer requires a running Tokio runtime".to_string())
            })?)
        } else {
            None
        };
        if let Some(parent) = config.filename.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let writer = Arc::new(MuxWriter::open(&config.filename)?);
        let config = Arc::new(config);
        let cancel = CancellationToken::new();
        let tasks = TaskTracker::new();
        let buffer = handle.map(|handle| {
            let (buffer, dispatcher) = buffer::pair(
                Arc::clone(&writer),
                Arc::clone(&config),
                cancel.clone(),
                policy,
            );
            tasks.spawn_on(dispatcher.run(), &handle);
            buffer
        });
        tasks.close();

        Ok(Self {
            config,
            writer,
            buffer,
            cancel,
            tasks,
        })
    }

    /// The sink's configuration.
    #[must_use]
    pub fn config(&self) -> &FileLoggerConfig {
        &self.config
    }

    /// Write one rendered message line. Messages below the configured
    /// level are dropped silently; a missing trailing line terminator is
    /// added.
    ///
    /// In asynchronous mode this appends to the active buffer slot and
    /// only blocks while a full slot is being handed to the flusher.
    ///
    /// # Errors
    ///
    /// Returns write or rotation I/O errors (sync mode), or a channel
    /// error if the flusher task is gone (async mode).
    pub fn write_message(&self, msg: &str, level: Level) -> Result<()> {
        if !level.is_enabled(self.config.level) {
            return Ok(());
        }
        let line: Cow<'_, str> = if msg.ends_with('\n') {
            Cow::Borrowed(msg)
        } else {
            Cow::Owned(format!("{msg}\n"))
        };
        match &self.buffer {
            Some(buffer) => buffer.append(line.as_bytes()),
            None => {
                if self.writer.write(line.as_bytes(), &self.config)? {
                    spawn_sweep(self.config.filename.clone(), self.config.max_days);
                }
                Ok(())
            }
        }
    }

    /// Drain any pending asynchronous buffer, then force a durability
    /// sync of the file.
    ///
    /// # Errors
    ///
    /// Returns the underlying write or sync error.
    pub fn flush(&self) -> Result<()> {
        if let Some(buffer) = &self.buffer {
            if buffer.drain_through(&self.writer, &self.config)? {
                spawn_sweep(self.config.filename.clone(), self.config.max_days);
            }
        }
        self.writer.sync()
    }

    /// Close the file handle. Pending buffered data is *not* drained;
    /// call [`FileLogger::flush`] first. Idempotent.
    pub fn close(&self) {
        self.writer.close();
        self.cancel.cancel();
    }

    /// Orderly teardown: flush pending data, stop the background flusher,
    /// and close the file.
    ///
    /// # Errors
    ///
    /// Returns the flush error, if any; the flusher is stopped and the
    /// file closed regardless.
    pub async fn shutdown(&self) -> Result<()> {
        let flushed = self.flush();
        self.cancel.cancel();
        self.tasks.wait().await;
        self.writer.close();
        flushed
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl fmt::Debug for FileLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLogger")
            .field("filename", &self.config.filename)
            .field("async_buffer", &self.config.async_buffer)
            .field("closed", &self.writer.is_closed())
            .finish()
    }
}

impl Sink for FileLogger {
    fn write_msg(&self, msg: &str, level: Level) -> std::result::Result<(), SinkError> {
        Self::write_message(self, msg, level)?;
        Ok(())
    }

    fn flush(&self) -> std::result::Result<(), SinkError> {
        Self::flush(self)?;
        Ok(())
    }

    fn close(&self) -> std::result::Result<(), SinkError> {
        Self::close(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/app.log");
        let sink = FileLogger::new(FileLoggerConfig::new(&path)).unwrap();
        sink.write_message("hello", Level::Info).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn missing_filename_creates_no_sink() {
        let err = FileLogger::new(FileLoggerConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn sub_threshold_messages_are_dropped_silently() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let config = FileLoggerConfig::builder(&path)
            .level(Level::Warn)
            .build()
            .unwrap();
        let sink = FileLogger::new(config).unwrap();

        sink.write_message("quiet\n", Level::Info).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        sink.write_message("loud\n", Level::Error).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "loud\n");
    }

    #[test]
    fn close_is_idempotent_and_stops_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileLogger::new(FileLoggerConfig::new(&path)).unwrap();
        sink.close();
        sink.close();
        assert!(matches!(
            sink.write_message("late\n", Level::Error),
            Err(Error::Closed)
        ));
    }
}
