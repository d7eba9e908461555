//! Simple stdout sink for development

use crate::level::Level;
use crate::sink::{Sink, SinkError};
use std::io::Write;
use std::sync::Mutex;

/// Sink that writes rendered messages to stdout.
#[derive(Debug)]
pub struct StdoutSink {
    /// Minimum log level
    min_level: Level,
    /// Lock for stdout (to prevent interleaving)
    stdout: Mutex<std::io::Stdout>,
}

impl StdoutSink {
    /// Create a new stdout sink accepting every level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_level: Level::Debug,
            stdout: Mutex::new(std::io::stdout()),
        }
    }

    /// Create with a specific minimum level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for StdoutSink {
    fn write_msg(&self, msg: &str, level: Level) -> Result<(), SinkError> {
        if !level.is_enabled(self.min_level) {
            return Ok(());
        }
        let mut stdout = self
            .stdout
            .lock()
            .map_err(|_| SinkError::from("stdout lock poisoned"))?;
        stdout.write_all(msg.as_bytes())?;
        if !msg.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut stdout = self
            .stdout
            .lock()
            .map_err(|_| SinkError::from("stdout lock poisoned"))?;
        stdout.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        self.flush()
    }
}
