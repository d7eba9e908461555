//! Failure taxonomy for the file sink
//!
//! Construction problems (bad config, unopenable file) abort sink
//! creation outright; no partial sink exists afterward. Write-path and
//! rotation failures surface to whoever called the write or flush entry
//! point. Rotation exhaustion and retention-sweep failures are downgraded
//! to operator-visible warnings at the call sites that hit them and never
//! reach the application.

use std::io;
use std::path::PathBuf;

/// Convenience alias used throughout the file sink.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while putting log bytes on disk.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An open, write, stat, or sync on the log file failed
    #[error("log file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The directory that should hold the log file could not be made
    #[error("could not create log directory {path}: {source}")]
    CreateDirectory {
        /// Directory that could not be created
        path: PathBuf,
        /// What the filesystem reported
        source: io::Error,
    },

    /// The rename or reopen step of a rotation failed; the previous
    /// handle keeps receiving writes
    #[error("rotation failed: {0}")]
    Rotation(String),

    /// Every numbered rotation name for the day is taken
    #[error("no free rotation slot for {path}: suffixes 001-999 all in use")]
    RotationExhausted {
        /// The file that could not be rotated
        path: PathBuf,
    },

    /// The sink was configured inconsistently
    #[error("invalid sink configuration: {0}")]
    Configuration(String),

    /// The file handle has been closed
    #[error("log file is closed")]
    Closed,

    /// The background flusher is gone
    #[error("buffer handoff failed: flusher task gone")]
    ChannelClosed,

    /// A serialized config document could not be parsed
    #[error("could not parse logger config: {0}")]
    Serialization(#[from] serde_json::Error),
}
