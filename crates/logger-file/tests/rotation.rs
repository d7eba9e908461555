//! Rotation behavior of the file sink

use chrono::Local;
use scribe_logger::Level;
use scribe_logger_file::{FileLogger, FileLoggerConfig};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

fn sync_config(path: &Path) -> FileLoggerConfig {
    let mut config = FileLoggerConfig::new(path);
    config.daily = false;
    config
}

#[test]
fn line_count_rotation_after_second_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let mut config = sync_config(&path);
    config.max_lines = 2;
    let sink = FileLogger::new(config).unwrap();

    sink.write_message("one\n", Level::Info).unwrap();
    sink.write_message("two\n", Level::Info).unwrap();
    sink.write_message("three\n", Level::Info).unwrap();

    let rotated = dir.path().join(format!("app.log.{}.001", today()));
    assert_eq!(
        fs::read_to_string(&rotated).unwrap(),
        "one\ntwo\n",
        "pre-rotation file keeps the first two messages"
    );
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "three\n",
        "reopened file holds only the third message"
    );
    assert!(
        !dir.path()
            .join(format!("app.log.{}.002", today()))
            .exists(),
        "exactly one rotation happened"
    );
}

#[test]
fn size_rotation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let mut config = sync_config(&path);
    config.max_size = 10;
    let sink = FileLogger::new(config).unwrap();

    sink.write_message("0123456789\n", Level::Info).unwrap();
    sink.write_message("next\n", Level::Info).unwrap();

    let rotated = dir.path().join(format!("app.log.{}.001", today()));
    assert_eq!(fs::read_to_string(&rotated).unwrap(), "0123456789\n");
    assert_eq!(fs::read_to_string(&path).unwrap(), "next\n");
}

#[test]
fn rotation_disabled_lets_the_file_grow() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let mut config = sync_config(&path);
    config.max_lines = 1;
    config.rotate = false;
    let sink = FileLogger::new(config).unwrap();

    sink.write_message("one\n", Level::Info).unwrap();
    sink.write_message("two\n", Level::Info).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    assert!(!dir.path().join(format!("app.log.{}.001", today())).exists());
}

#[test]
fn lowest_free_suffix_is_used() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    fs::write(dir.path().join(format!("app.log.{}.001", today())), "x\n").unwrap();

    let mut config = sync_config(&path);
    config.max_lines = 1;
    let sink = FileLogger::new(config).unwrap();

    sink.write_message("one\n", Level::Info).unwrap();

    let rotated = dir.path().join(format!("app.log.{}.002", today()));
    assert_eq!(fs::read_to_string(&rotated).unwrap(), "one\n");
}

#[test]
fn exhausted_suffixes_keep_logging_to_the_active_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    for n in 1..=999 {
        fs::write(
            dir.path().join(format!("app.log.{}.{n:03}", today())),
            "x\n",
        )
        .unwrap();
    }

    let mut config = sync_config(&path);
    config.max_lines = 1;
    let sink = FileLogger::new(config).unwrap();

    // Each write trips the trigger; rotation is exhausted and skipped.
    sink.write_message("one\n", Level::Info).unwrap();
    sink.write_message("two\n", Level::Info).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "one\ntwo\n",
        "active file is unchanged and still receives writes"
    );
    for n in 1..=999 {
        let numbered = dir.path().join(format!("app.log.{}.{n:03}", today()));
        assert_eq!(fs::read_to_string(&numbered).unwrap(), "x\n");
    }
}

#[test]
fn missing_terminator_is_added() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let sink = FileLogger::new(sync_config(&path)).unwrap();

    sink.write_message("bare", Level::Info).unwrap();
    sink.write_message("terminated\n", Level::Info).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "bare\nterminated\n");
}
