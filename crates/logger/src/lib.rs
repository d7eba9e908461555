//! Core logging types: leveled records, the format-template compiler, and
//! stack-walking call-site resolution.
//!
//! This crate provides:
//! - A template compiler turning a small `%`-code format language into a
//!   reusable, thread-safe render plan
//! - A call-site resolver that finds the true application caller across
//!   arbitrary wrapping layers
//! - An immutable per-call record snapshot consumed by the render plan
//! - A level-filtered [`Logger`] façade with key/value field attachments,
//!   dispatching rendered messages to ordered [`Sink`]s
//!
//! File output with buffering, rotation, and retention lives in the
//! sibling `scribe-logger-file` crate.

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod caller;
mod fields;
mod format;
mod level;
mod logger;
mod record;
mod sink;
mod stdout;
pub mod test_support;

pub use caller::{CallSite, CallerResolver, FixedResolver, StackResolver};
pub use fields::{FieldValue, Fields};
pub use format::{DEFAULT_TEMPLATE, Template};
pub use level::{Level, ParseLevelError};
pub use logger::{Entry, Logger, LoggerBuilder};
pub use record::Record;
pub use sink::{Sink, SinkError};
pub use stdout::StdoutSink;
