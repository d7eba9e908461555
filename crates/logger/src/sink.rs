//! Sink contract
//!
//! The narrow seam between the façade and concrete outputs. Construction
//! of a sink is a fallible `new` on the concrete type; there is no
//! separate `init` step and no partially constructed sink.

use crate::level::Level;

/// Boxed error for object-safe sink methods.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// A destination for rendered log messages.
pub trait Sink: Send + Sync + 'static {
    /// Write one rendered message at `level`.
    ///
    /// Implementations drop the message silently when `level` is below
    /// their own threshold and return `Ok`.
    ///
    /// # Errors
    ///
    /// Returns the underlying write error, if any. Callers on the logging
    /// fast path report rather than propagate these.
    fn write_msg(&self, msg: &str, level: Level) -> Result<(), SinkError>;

    /// Drain pending data and force a durability sync.
    ///
    /// # Errors
    ///
    /// Returns the underlying sync error, if any.
    fn flush(&self) -> Result<(), SinkError>;

    /// Release underlying resources. Pending buffered data is not
    /// drained; call [`Sink::flush`] first.
    ///
    /// # Errors
    ///
    /// Returns the underlying close error, if any.
    fn close(&self) -> Result<(), SinkError>;
}
