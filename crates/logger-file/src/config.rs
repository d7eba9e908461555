//! File sink configuration
//!
//! Loaded once at sink construction, either from a serialized key/value
//! document (the field names below) or through the builder. Not mutated
//! afterward; rotation bookkeeping lives with the file handle.

use crate::error::{Error, Result};
use scribe_logger::Level;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

/// Default line-count rotation threshold.
pub const DEFAULT_MAX_LINES: u64 = 1_000_000;

/// Default size rotation threshold: 256 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 1 << 28;

/// Default retention window in days.
pub const DEFAULT_MAX_DAYS: u64 = 7;

/// Smallest accepted buffer capacity; configured values below this are
/// raised to it.
pub const MIN_BUFFER_SIZE: usize = 8 * 1024;

/// Configuration for [`crate::FileLogger`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileLoggerConfig {
    /// Path of the active log file; parent directories are created at
    /// construction. Required.
    pub filename: PathBuf,

    /// Rotate when the open file reaches this many lines (0 disables).
    #[serde(rename = "maxlines")]
    pub max_lines: u64,

    /// Rotate when the open file reaches this many bytes (0 disables).
    #[serde(rename = "maxsize")]
    pub max_size: u64,

    /// Rotate when the calendar date changes.
    pub daily: bool,

    /// Retention window for rotated files, in days (0 disables the sweep).
    #[serde(rename = "maxdays")]
    pub max_days: u64,

    /// Master switch for rotation.
    pub rotate: bool,

    /// Minimum severity accepted by the sink; accepts a number
    /// (0 = debug .. 5 = panic) or a level name.
    #[serde(deserialize_with = "level_from_number_or_name")]
    pub level: Level,

    /// Batch writes through the double buffer instead of writing
    /// synchronously.
    #[serde(rename = "asyncbuffer")]
    pub async_buffer: bool,

    /// Capacity of each buffer slot, in bytes.
    #[serde(rename = "buffersize")]
    pub buffer_size: usize,
}

impl Default for FileLoggerConfig {
    fn default() -> Self {
        Self {
            filename: PathBuf::new(),
            max_lines: DEFAULT_MAX_LINES,
            max_size: DEFAULT_MAX_SIZE,
            daily: true,
            max_days: DEFAULT_MAX_DAYS,
            rotate: true,
            level: Level::Info,
            async_buffer: false,
            buffer_size: MIN_BUFFER_SIZE,
        }
    }
}

impl FileLoggerConfig {
    /// Default configuration writing to `filename`.
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    /// Start building a configuration for `filename`.
    pub fn builder(filename: impl Into<PathBuf>) -> FileLoggerConfigBuilder {
        FileLoggerConfigBuilder {
            config: Self::new(filename),
        }
    }

    /// Parse a serialized key/value config document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] on malformed input and
    /// [`Error::Configuration`] when `filename` is missing.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    /// Validate and normalize: `filename` is required; the buffer floor is
    /// enforced.
    pub(crate) fn validated(mut self) -> Result<Self> {
        if self.filename.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "config must have filename".to_string(),
            ));
        }
        if self.buffer_size < MIN_BUFFER_SIZE {
            self.buffer_size = MIN_BUFFER_SIZE;
        }
        Ok(self)
    }
}

/// Builder for [`FileLoggerConfig`].
#[derive(Debug, Clone)]
pub struct FileLoggerConfigBuilder {
    config: FileLoggerConfig,
}

impl FileLoggerConfigBuilder {
    /// Rotate at this many lines (0 disables).
    #[must_use]
    pub fn max_lines(mut self, max_lines: u64) -> Self {
        self.config.max_lines = max_lines;
        self
    }

    /// Rotate at this many bytes (0 disables).
    #[must_use]
    pub fn max_size(mut self, max_size: u64) -> Self {
        self.config.max_size = max_size;
        self
    }

    /// Rotate on calendar date change.
    #[must_use]
    pub fn daily(mut self, daily: bool) -> Self {
        self.config.daily = daily;
        self
    }

    /// Retention window in days (0 disables the sweep).
    #[must_use]
    pub fn max_days(mut self, max_days: u64) -> Self {
        self.config.max_days = max_days;
        self
    }

    /// Master switch for rotation.
    #[must_use]
    pub fn rotate(mut self, rotate: bool) -> Self {
        self.config.rotate = rotate;
        self
    }

    /// Minimum severity accepted by the sink.
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    /// Batch writes through the double buffer.
    #[must_use]
    pub fn async_buffer(mut self, async_buffer: bool) -> Self {
        self.config.async_buffer = async_buffer;
        self
    }

    /// Capacity of each buffer slot, in bytes (floored at
    /// [`MIN_BUFFER_SIZE`]).
    #[must_use]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.config.buffer_size = buffer_size;
        self
    }

    /// Validate and produce the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when `filename` is empty.
    pub fn build(self) -> Result<FileLoggerConfig> {
        self.config.validated()
    }
}

fn level_from_number_or_name<'de, D>(deserializer: D) -> std::result::Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Name(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => {
            Level::from_number(n).ok_or_else(|| D::Error::custom(format!("level out of range: {n}")))
        }
        Raw::Name(name) => name.parse().map_err(D::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_field_names_and_defaults() {
        let config = FileLoggerConfig::from_json(r#"{"filename": "logs/app.log"}"#).unwrap();
        assert_eq!(config.filename, PathBuf::from("logs/app.log"));
        assert_eq!(config.max_lines, DEFAULT_MAX_LINES);
        assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
        assert!(config.daily);
        assert_eq!(config.max_days, DEFAULT_MAX_DAYS);
        assert!(config.rotate);
        assert_eq!(config.level, Level::Info);
        assert!(!config.async_buffer);
        assert_eq!(config.buffer_size, MIN_BUFFER_SIZE);
    }

    #[test]
    fn serialized_overrides() {
        let config = FileLoggerConfig::from_json(
            r#"{
                "filename": "app.log",
                "maxlines": 2,
                "maxsize": 1024,
                "daily": false,
                "maxdays": 3,
                "rotate": false,
                "level": "warn",
                "asyncbuffer": true,
                "buffersize": 65536
            }"#,
        )
        .unwrap();
        assert_eq!(config.max_lines, 2);
        assert_eq!(config.max_size, 1024);
        assert!(!config.daily);
        assert_eq!(config.max_days, 3);
        assert!(!config.rotate);
        assert_eq!(config.level, Level::Warn);
        assert!(config.async_buffer);
        assert_eq!(config.buffer_size, 65536);
    }

    #[test]
    fn numeric_levels_accepted() {
        let config =
            FileLoggerConfig::from_json(r#"{"filename": "app.log", "level": 2}"#).unwrap();
        assert_eq!(config.level, Level::Warn);
        assert!(FileLoggerConfig::from_json(r#"{"filename": "a", "level": 9}"#).is_err());
    }

    #[test]
    fn missing_filename_is_fatal() {
        let err = FileLoggerConfig::from_json("{}").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn malformed_document_is_fatal() {
        let err = FileLoggerConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn buffer_floor_enforced() {
        let config =
            FileLoggerConfig::from_json(r#"{"filename": "app.log", "buffersize": 16}"#).unwrap();
        assert_eq!(config.buffer_size, MIN_BUFFER_SIZE);

        let config = FileLoggerConfig::builder("app.log")
            .buffer_size(1)
            .build()
            .unwrap();
        assert_eq!(config.buffer_size, MIN_BUFFER_SIZE);
    }
}
