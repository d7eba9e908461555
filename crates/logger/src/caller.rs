//! Call-site resolution
//!
//! A log call may be separated from this crate by any number of wrapping
//! layers (an application package that re-exports a shared logger
//! instance). The resolver walks the live stack to report the line in
//! *application* code that issued the call, not a line inside a wrapper or
//! inside this crate itself.

use backtrace::Backtrace;
use serde::{Deserialize, Serialize};
use std::fmt;

/// File marker identifying this module's own frames on the stack.
const SELF_MARKER: &str = file!();

const UNKNOWN: &str = "_";

/// A resolved call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// Source file of the call
    pub file: String,
    /// Line number of the call
    pub line: u32,
    /// Fully qualified path of the calling function
    pub func_path: String,
    /// `func_path` minus its trailing function-name component
    pub package_path: String,
}

impl CallSite {
    /// Placeholder site used when the stack cannot be resolved.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            file: UNKNOWN.to_string(),
            line: 0,
            func_path: UNKNOWN.to_string(),
            package_path: UNKNOWN.to_string(),
        }
    }
}

/// Pluggable call-site resolution.
///
/// The stack walk is inherently introspective; keeping it behind this seam
/// lets environments without usable stack introspection (stripped release
/// builds, exotic targets) swap in [`FixedResolver`].
pub trait CallerResolver: fmt::Debug + Send + Sync {
    /// Resolve the call site of the frame following `target`.
    ///
    /// `target` names the file the application considers itself located in
    /// (typically the file of its own logging wrapper). An empty target
    /// means "report this module's direct caller".
    fn resolve(&self, target: &str) -> CallSite;
}

/// Resolver that walks the live stack.
///
/// Walking outward from this module's own frame, the resolver counts frames
/// whose file matches this module; a second occurrence calibrates away any
/// extra internal frames sitting beneath the real caller. The walk then
/// continues until a frame's file matches `target`, and the caller is the
/// frame one past it, adjusted by the calibration offset. This holds
/// regardless of how many indirection layers sit between the application
/// and this crate, since the resolver's own frame is always present.
///
/// Requires debug info for file names and line numbers; without it the
/// resolver degrades to [`CallSite::unknown`] rather than failing.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackResolver;

impl CallerResolver for StackResolver {
    fn resolve(&self, target: &str) -> CallSite {
        let target = if target.is_empty() { SELF_MARKER } else { target };

        // Flatten frames outward-first; inlined callees come before their
        // callers, matching a logical walk.
        let trace = Backtrace::new();
        let mut frames = Vec::new();
        for frame in trace.frames() {
            for symbol in frame.symbols() {
                let file = symbol
                    .filename()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let line = symbol.lineno().unwrap_or(0);
                let name = symbol
                    .name()
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                frames.push((file, line, name));
            }
        }

        // The capture machinery's own frames sit below this module's; the
        // walk begins at frame 0 = this module, like a runtime caller walk.
        let Some(first) = frames
            .iter()
            .position(|(file, _, _)| file.contains(SELF_MARKER))
        else {
            return CallSite::unknown();
        };
        let frames = &frames[first..];

        let mut marker_hits = 0usize;
        let mut offset = 0usize;
        let mut depth = None;
        for (i, (file, _, _)) in frames.iter().enumerate() {
            if file.contains(SELF_MARKER) {
                marker_hits += 1;
                if marker_hits == 2 {
                    // Number of internal frames beneath the real caller.
                    offset = i;
                }
            }
            if file.contains(target) {
                depth = Some((i + 1).saturating_sub(offset));
                break;
            }
        }

        // Re-walk to the resolved depth from the calibrated origin.
        let Some((file, line, symbol)) = depth.and_then(|d| frames.get(offset + d)) else {
            return CallSite::unknown();
        };

        let func_path = trim_symbol(symbol);
        let package_path = parent_path(&func_path);
        CallSite {
            file: file.clone(),
            line: *line,
            func_path,
            package_path,
        }
    }
}

/// Resolver reporting a fixed call site; for environments without stack
/// introspection.
#[derive(Debug, Clone)]
pub struct FixedResolver {
    site: CallSite,
}

impl FixedResolver {
    /// Create a resolver that always reports `site`.
    #[must_use]
    pub const fn new(site: CallSite) -> Self {
        Self { site }
    }
}

impl CallerResolver for FixedResolver {
    fn resolve(&self, _target: &str) -> CallSite {
        self.site.clone()
    }
}

/// Strip the compiler's trailing `::h<hash>` segment from a demangled
/// symbol, when present.
fn trim_symbol(raw: &str) -> String {
    if raw.is_empty() {
        return UNKNOWN.to_string();
    }
    match raw.rsplit_once("::") {
        Some((head, tail))
            if tail.len() == 17
                && tail.starts_with('h')
                && tail[1..].bytes().all(|b| b.is_ascii_hexdigit()) =>
        {
            head.to_string()
        }
        _ => raw.to_string(),
    }
}

/// `a::b::c` -> `a::b`
fn parent_path(func_path: &str) -> String {
    match func_path.rsplit_once("::") {
        Some((head, _)) => head.to_string(),
        None => UNKNOWN.to_string(),
    }
}
