//! Retention sweep
//!
//! Runs detached after a successful rotation: deletes files next to the
//! active log whose names share its basename as a prefix and whose
//! modification time has aged out. One undeletable file never aborts the
//! sweep for the rest.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Spawn a detached sweep for `filename`'s directory.
///
/// Prefers the ambient Tokio runtime (the sweep is blocking work); sinks
/// running off-runtime fall back to a plain thread.
pub(crate) fn spawn_sweep(filename: PathBuf, max_days: u64) {
    if max_days == 0 {
        return;
    }
    let task = move || sweep(&filename, max_days);
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(task);
        }
        Err(_) => {
            std::thread::spawn(task);
        }
    }
}

/// Delete expired rotated files next to `filename`.
pub(crate) fn sweep(filename: &Path, max_days: u64) {
    if max_days == 0 {
        return;
    }
    let cutoff = SystemTime::now() - Duration::from_secs(max_days * 86_400);
    sweep_before(filename, cutoff);
}

/// Sweep with an explicit cutoff: delete iff the basename starts with
/// `filename`'s basename and mtime is older than `cutoff`.
pub(crate) fn sweep_before(filename: &Path, cutoff: SystemTime) {
    let dir = match filename.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let Some(base) = filename.file_name().and_then(|n| n.to_str()) else {
        return;
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::warn!(
                %error,
                dir = %dir.display(),
                "retention sweep could not read log directory"
            );
            return;
        }
    };

    for entry in entries {
        let Ok(entry) = entry else { continue };
        if let Err(error) = remove_if_expired(&entry, base, cutoff) {
            tracing::warn!(
                %error,
                path = %entry.path().display(),
                "retention sweep could not delete file"
            );
        }
    }
}

fn remove_if_expired(
    entry: &fs::DirEntry,
    base: &str,
    cutoff: SystemTime,
) -> std::io::Result<()> {
    let meta = entry.metadata()?;
    if !meta.is_file() {
        return Ok(());
    }
    let name = entry.file_name();
    let Some(name) = name.to_str() else {
        return Ok(());
    };
    if name.starts_with(base) && meta.modified()? < cutoff {
        fs::remove_file(entry.path())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn expired_prefixed_files_are_removed() {
        let dir = tempdir().unwrap();
        let active = dir.path().join("app.log");
        let rotated = dir.path().join("app.log.2000-01-01.001");
        let unrelated = dir.path().join("other.log");
        fs::write(&active, "a\n").unwrap();
        fs::write(&rotated, "b\n").unwrap();
        fs::write(&unrelated, "c\n").unwrap();

        // Everything on disk is older than a cutoff in the future.
        let cutoff = SystemTime::now() + Duration::from_secs(3600);
        sweep_before(&active, cutoff);

        assert!(!active.exists());
        assert!(!rotated.exists());
        assert!(unrelated.exists(), "non-prefixed files are kept");
    }

    #[test]
    fn fresh_files_are_kept() {
        let dir = tempdir().unwrap();
        let active = dir.path().join("app.log");
        let rotated = dir.path().join("app.log.2000-01-01.001");
        fs::write(&active, "a\n").unwrap();
        fs::write(&rotated, "b\n").unwrap();

        // Nothing is older than a cutoff in the past.
        let cutoff = SystemTime::now() - Duration::from_secs(3600);
        sweep_before(&active, cutoff);

        assert!(active.exists());
        assert!(rotated.exists());
    }

    #[test]
    fn zero_retention_window_disables_the_sweep() {
        let dir = tempdir().unwrap();
        let rotated = dir.path().join("app.log.2000-01-01.001");
        fs::write(&rotated, "b\n").unwrap();

        sweep(&dir.path().join("app.log"), 0);
        assert!(rotated.exists());
    }
}
