//! Test support utilities
//!
//! An in-memory sink for capturing rendered output during tests.

use crate::level::Level;
use crate::sink::{Sink, SinkError};
use std::sync::{Arc, Mutex};

/// A sink that captures all rendered messages in memory.
#[derive(Debug, Clone)]
pub struct CaptureSink {
    lines: Arc<Mutex<String>>,
    min_level: Level,
}

impl CaptureSink {
    /// Create a new capture sink accepting every level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(String::new())),
            min_level: Level::Debug,
        }
    }

    /// Create with a specific minimum level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Get all captured output.
    #[must_use]
    pub fn logs(&self) -> String {
        self.lines.lock().expect("capture lock").clone()
    }

    /// Check whether the captured output contains `text`.
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.lines.lock().expect("capture lock").contains(text)
    }

    /// Clear captured output.
    pub fn clear(&self) {
        self.lines.lock().expect("capture lock").clear();
    }
}

impl Default for CaptureSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for CaptureSink {
    fn write_msg(&self, msg: &str, level: Level) -> Result<(), SinkError> {
        if !level.is_enabled(self.min_level) {
            return Ok(());
        }
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| SinkError::from("capture lock poisoned"))?;
        lines.push_str(msg);
        if !msg.ends_with('\n') {
            lines.push('\n');
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
