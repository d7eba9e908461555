//! Logger façade
//!
//! An explicitly constructed instance, passed by reference; there is no
//! process-wide singleton. Applications that want a global compose one
//! themselves at the edge.

use crate::caller::{CallerResolver, StackResolver};
use crate::fields::{FieldValue, Fields, render_suffix};
use crate::format::Template;
use crate::level::Level;
use crate::record::Record;
use crate::sink::{Sink, SinkError};
use std::sync::Arc;

/// Default caller-resolution target: this file, meaning records resolve
/// to the direct caller of the façade.
const DEFAULT_TARGET: &str = file!();

// Expanded in place so each public entry point is the only façade frame on
// the stack; the caller walk depends on that.
macro_rules! emit {
    ($logger:expr, $level:expr, $message:expr) => {{
        let record = Record::capture($level, $message, $logger.resolver.as_ref(), &$logger.target);
        let rendered = $logger.template.render(&record);
        for sink in &$logger.sinks {
            if let Err(error) = sink.write_msg(&rendered, $level) {
                tracing::warn!(%error, "log sink write failed");
            }
        }
    }};
}

/// Level-filtered logging front end dispatching rendered messages to an
/// ordered list of sinks.
pub struct Logger {
    template: Template,
    min_level: Level,
    target: String,
    resolver: Arc<dyn CallerResolver>,
    sinks: Vec<Arc<dyn Sink>>,
}

impl Logger {
    /// Start building a logger.
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Whether a message at `level` would be emitted.
    #[inline(always)]
    #[must_use]
    pub fn is_enabled(&self, level: Level) -> bool {
        level.is_enabled(self.min_level)
    }

    /// Emit a message at `level`.
    ///
    /// Per-sink write failures are reported through `tracing` and never
    /// raised to the application.
    pub fn log(&self, level: Level, message: impl Into<String>) {
        if self.is_enabled(level) {
            emit!(self, level, message.into());
        }
    }

    /// Log at debug level.
    pub fn debug(&self, message: impl Into<String>) {
        if self.is_enabled(Level::Debug) {
            emit!(self, Level::Debug, message.into());
        }
    }

    /// Log at info level.
    pub fn info(&self, message: impl Into<String>) {
        if self.is_enabled(Level::Info) {
            emit!(self, Level::Info, message.into());
        }
    }

    /// Log at warn level.
    pub fn warn(&self, message: impl Into<String>) {
        if self.is_enabled(Level::Warn) {
            emit!(self, Level::Warn, message.into());
        }
    }

    /// Log at error level.
    pub fn error(&self, message: impl Into<String>) {
        if self.is_enabled(Level::Error) {
            emit!(self, Level::Error, message.into());
        }
    }

    /// Log at fatal level. Does not terminate the process; the caller
    /// decides whether the condition is fatal.
    pub fn fatal(&self, message: impl Into<String>) {
        if self.is_enabled(Level::Fatal) {
            emit!(self, Level::Fatal, message.into());
        }
    }

    /// Log at panic level. Does not unwind.
    pub fn panic(&self, message: impl Into<String>) {
        if self.is_enabled(Level::Panic) {
            emit!(self, Level::Panic, message.into());
        }
    }

    /// Attach a single field; returns an entry builder.
    #[must_use]
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<FieldValue>) -> Entry<'_> {
        Entry {
            logger: self,
            fields: Fields::new(),
        }
        .field(key, value)
    }

    /// Attach a prebuilt field map; returns an entry builder.
    #[must_use]
    pub fn with_fields(&self, fields: Fields) -> Entry<'_> {
        Entry {
            logger: self,
            fields,
        }
    }

    /// Flush every sink, in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first sink failure; later sinks are still flushed.
    pub fn flush(&self) -> Result<(), SinkError> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.flush() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Close every sink, in registration order. Does not drain pending
    /// buffers; flush first.
    ///
    /// # Errors
    ///
    /// Returns the first sink failure; later sinks are still closed.
    pub fn close(&self) -> Result<(), SinkError> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.close() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("template", &self.template.source())
            .field("min_level", &self.min_level)
            .field("target", &self.target)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

/// Field-attachment builder, consumed by a level method.
#[must_use]
pub struct Entry<'a> {
    logger: &'a Logger,
    fields: Fields,
}

impl Entry<'_> {
    /// Attach another field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Log at debug level with the attached fields.
    pub fn debug(self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    /// Log at info level with the attached fields.
    pub fn info(self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    /// Log at warn level with the attached fields.
    pub fn warn(self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }

    /// Log at error level with the attached fields.
    pub fn error(self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    /// Log at fatal level with the attached fields.
    pub fn fatal(self, message: impl Into<String>) {
        self.log(Level::Fatal, message);
    }

    /// Log at the given level with the attached fields.
    pub fn log(self, level: Level, message: impl Into<String>) {
        if self.logger.is_enabled(level) {
            let mut message = message.into();
            message.push_str(&render_suffix(&self.fields));
            emit!(self.logger, level, message);
        }
    }
}

/// Builder for [`Logger`].
#[derive(Default)]
pub struct LoggerBuilder {
    template: Option<Template>,
    min_level: Option<Level>,
    target: Option<String>,
    resolver: Option<Arc<dyn CallerResolver>>,
    sinks: Vec<Arc<dyn Sink>>,
}

impl LoggerBuilder {
    /// Set the render template (defaults to
    /// [`crate::format::DEFAULT_TEMPLATE`]).
    #[must_use]
    pub fn template(mut self, format: &str) -> Self {
        self.template = Some(Template::compile(format));
        self
    }

    /// Set the minimum level (defaults to `Info`).
    #[must_use]
    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = Some(level);
        self
    }

    /// Set the caller-resolution target: the file the application
    /// considers itself located in, typically its own logging wrapper.
    /// Defaults to reporting the façade's direct caller.
    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Swap the caller resolver (defaults to the stack walker).
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn CallerResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Append a sink. Dispatch follows registration order.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Build the logger.
    #[must_use]
    pub fn build(self) -> Logger {
        Logger {
            template: self.template.unwrap_or_default(),
            min_level: self.min_level.unwrap_or(Level::Info),
            target: self.target.unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            resolver: self.resolver.unwrap_or_else(|| Arc::new(StackResolver)),
            sinks: self.sinks,
        }
    }
}
