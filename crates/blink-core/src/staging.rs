//! Payload staging: writing the engine binary to disk before start.
//!
//! Every run stages into its own fresh directory `<root>/<prefix><random>/`
//! and removes it synchronously when the `StagedPayload` is dropped, after
//! the core has shut down. While staged, the directory's lock file is held
//! exclusively. Directories left behind by runs that crashed are swept by
//! age; a directory whose lock is held belongs to a live run and is skipped.

use std::fs::{self, File, TryLockError};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use blink_common::StagingError;

/// Held by the owning run for as long as its directory is in use.
const LOCK_FILE: &str = ".lock";

/// A staged engine binary. Its directory is removed on drop.
#[derive(Debug)]
pub struct StagedPayload {
    // Released before the directory goes.
    lock: File,
    dir: tempfile::TempDir,
    file: PathBuf,
}

impl StagedPayload {
    /// Path to the staged binary.
    pub fn path(&self) -> &Path {
        &self.file
    }

    /// The versioned directory holding the binary.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the staging directory now, reporting failures.
    pub fn remove(self) -> Result<(), StagingError> {
        let Self { lock, dir, .. } = self;
        drop(lock);
        let path = dir.path().to_path_buf();
        dir.close()?;
        tracing::debug!(dir = %path.display(), "staging directory removed");
        Ok(())
    }
}

/// Write `bytes` as `file_name` into a fresh directory under `root`.
pub fn stage_payload(
    root: &Path,
    prefix: &str,
    file_name: &str,
    bytes: &[u8],
) -> Result<StagedPayload, StagingError> {
    validate_file_name(file_name)?;
    fs::create_dir_all(root)?;

    let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(root)?;
    let lock = File::create(dir.path().join(LOCK_FILE))?;
    lock.try_lock().map_err(|e| match e {
        TryLockError::Error(e) => e,
        TryLockError::WouldBlock => std::io::Error::from(std::io::ErrorKind::WouldBlock),
    })?;
    let file = dir.path().join(file_name);
    fs::write(&file, bytes)?;
    make_executable(&file)?;

    tracing::info!(
        path = %file.display(),
        size = bytes.len(),
        "engine payload staged"
    );
    Ok(StagedPayload { lock, dir, file })
}

fn validate_file_name(file_name: &str) -> Result<(), StagingError> {
    let plain = Path::new(file_name)
        .file_name()
        .is_some_and(|name| name == file_name);
    if file_name.is_empty() || !plain || file_name == LOCK_FILE {
        return Err(StagingError::InvalidName(file_name.to_string()));
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Whether a live run holds the lock file in `dir`. Directories without
/// one predate locking or died mid-staging, and count as free.
fn held_by_live_run(dir: &Path) -> bool {
    let Ok(lock) = File::options().write(true).open(dir.join(LOCK_FILE)) else {
        return false;
    };
    match lock.try_lock() {
        Ok(()) => false,
        Err(TryLockError::WouldBlock) => true,
        Err(TryLockError::Error(e)) => {
            tracing::debug!(dir = %dir.display(), error = %e, "staging lock unreadable; leaving directory");
            true
        }
    }
}

/// Remove staging directories under `root` whose names start with `prefix`
/// and that were last modified more than `older_than` ago. `keep` and
/// directories locked by a live run are never removed. Failures are logged
/// and skipped. Returns the removed paths.
pub fn sweep_stale(
    root: &Path,
    prefix: &str,
    older_than: Duration,
    keep: Option<&Path>,
) -> Vec<PathBuf> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(root = %root.display(), error = %e, "nothing to sweep");
            return Vec::new();
        }
    };

    let now = SystemTime::now();
    let mut removed = Vec::new();
    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(prefix) || !path.is_dir() {
            continue;
        }
        if keep.is_some_and(|keep| keep == path.as_path()) {
            continue;
        }
        let age = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .ok()
            .map(|modified| now.duration_since(modified).unwrap_or(Duration::ZERO));
        if !age.is_some_and(|age| age >= older_than) {
            continue;
        }
        if held_by_live_run(&path) {
            tracing::debug!(dir = %path.display(), "staging directory in use; skipping");
            continue;
        }
        match fs::remove_dir_all(&path) {
            Ok(()) => {
                tracing::info!(dir = %path.display(), "removed stale staging directory");
                removed.push(path);
            }
            Err(e) => {
                tracing::warn!(dir = %path.display(), error = %e, "failed to remove stale staging directory");
            }
        }
    }
    removed
}
