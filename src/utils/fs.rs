//! File system helpers

use crate::error::{RelayError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Create `path` and any missing parents
///
/// An existing directory is not an error. Anything else that prevents the
/// directory from existing afterwards is reported with the path.
#[instrument]
pub fn create_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        debug!("directory already exists: {}", path.display());
        return Ok(());
    }

    match fs::create_dir_all(path) {
        Ok(()) => {
            debug!("Created directory: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(RelayError::directory(path, e)),
    }
}

/// Absolute form of `path`
///
/// Symlinks are resolved when the path exists; otherwise the path is
/// joined onto the current directory without touching the file system.
pub fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Whether `path` is a regular file with any execute bit set
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Whether `path` is a regular file with any execute bit set
#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    false
}
