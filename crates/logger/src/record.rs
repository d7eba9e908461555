//! Log record type

use crate::caller::{CallSite, CallerResolver};
use crate::level::Level;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// An immutable snapshot of a single log call.
///
/// Assembled once per call, read by the render plan, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Log level
    pub level: Level,
    /// When the log call was made
    pub timestamp: DateTime<Local>,
    /// Source file of the resolved call site
    pub source_file: String,
    /// Line number of the resolved call site
    pub source_line: u32,
    /// The log message
    pub message: String,
    /// Fully qualified path of the calling function
    pub func_path: String,
    /// Package path of the calling function
    pub package_path: String,
}

impl Record {
    /// Assemble a record from an already-resolved call site, stamped now.
    pub fn assemble(level: Level, message: impl Into<String>, site: CallSite) -> Self {
        Self {
            level,
            timestamp: Local::now(),
            source_file: site.file,
            source_line: site.line,
            message: message.into(),
            func_path: site.func_path,
            package_path: site.package_path,
        }
    }

    /// Assemble a record, resolving the call site against `target`.
    pub fn capture(
        level: Level,
        message: impl Into<String>,
        resolver: &dyn CallerResolver,
        target: &str,
    ) -> Self {
        Self::assemble(level, message, resolver.resolve(target))
    }

    /// Builder-style timestamp override; for tests and replay paths.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::FixedResolver;

    #[test]
    fn capture_uses_resolved_site() {
        let site = CallSite {
            file: "pkg/app.rs".to_string(),
            line: 42,
            func_path: "pkg::app::run".to_string(),
            package_path: "pkg::app".to_string(),
        };
        let resolver = FixedResolver::new(site);

        let record = Record::capture(Level::Warn, "boom", &resolver, "");
        assert_eq!(record.level, Level::Warn);
        assert_eq!(record.source_file, "pkg/app.rs");
        assert_eq!(record.source_line, 42);
        assert_eq!(record.func_path, "pkg::app::run");
        assert_eq!(record.package_path, "pkg::app");
        assert_eq!(record.message, "boom");
    }
}
