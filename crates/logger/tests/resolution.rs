//! Call-site resolution through the façade
//!
//! These walk the real stack, so they need debug info (the default for
//! test profiles).

use scribe_logger::test_support::CaptureSink;
use scribe_logger::{Level, Logger};
use std::sync::Arc;

/// Simulates an application-local package that re-exports a shared logger.
mod wrapper {
    use scribe_logger::Logger;

    /// File identity the application would configure as its target.
    pub const TARGET: &str = file!();

    pub fn log_through(logger: &Logger, msg: &str) {
        logger.info(msg);
    }

    /// Line of the `log_through` call inside [`log_nested`].
    pub const NESTED_CALL_LINE: u32 = line!() + 2;
    pub fn log_nested(logger: &Logger, msg: &str) {
        log_through(logger, msg);
    }
}

fn capture_logger(target: Option<&str>) -> (Arc<CaptureSink>, Logger) {
    let capture = Arc::new(CaptureSink::new());
    let mut builder = Logger::builder()
        .template("%s %M")
        .min_level(Level::Debug)
        .sink(capture.clone());
    if let Some(target) = target {
        builder = builder.target(target);
    }
    (capture, builder.build())
}

#[test]
fn direct_caller_is_reported_by_default() {
    let (capture, logger) = capture_logger(None);

    let call_line = line!() + 1;
    logger.info("direct hello");

    let logs = capture.logs();
    assert!(
        logs.contains(&format!("resolution.rs:{call_line} direct hello")),
        "unexpected call site: {logs}"
    );
}

#[test]
fn wrapper_frames_are_skipped_with_target() {
    let (capture, logger) = capture_logger(Some(wrapper::TARGET));

    let call_line = line!() + 1;
    wrapper::log_through(&logger, "wrapped hello");

    let logs = capture.logs();
    assert!(
        logs.contains(&format!("resolution.rs:{call_line} wrapped hello")),
        "unexpected call site: {logs}"
    );
}

#[test]
fn nested_wrapper_frames_resolve_past_the_first_match() {
    let (capture, logger) = capture_logger(Some(wrapper::TARGET));

    wrapper::log_nested(&logger, "nested hello");

    // The first target match walking outward is the innermost wrapper
    // frame; the reported site is its caller, the `log_through` call
    // inside `log_nested`.
    let logs = capture.logs();
    assert!(
        logs.contains(&format!(
            "resolution.rs:{} nested hello",
            wrapper::NESTED_CALL_LINE
        )),
        "unexpected call site: {logs}"
    );
}
