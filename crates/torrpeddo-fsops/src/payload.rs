//! Payload path helpers.
//!
//! # Design
//! - `payload_path` only ever yields a direct child of the save directory, so a hostile or
//!   empty engine-reported name can never widen a recursive delete to the directory itself.
//! - Removal treats an already-missing path as success; deletes can be retried freely.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{FsOpsError, FsOpsResult};

/// Outcome of [`remove_payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The path existed and was deleted.
    Removed,
    /// Nothing was there to delete.
    AlreadyAbsent,
}

/// Whether anything (file, directory or link) exists at `path`.
#[must_use]
pub fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Whether `path` is an existing directory.
#[must_use]
pub fn is_directory(path: &Path) -> bool {
    path.is_dir()
}

/// Join a payload name onto its save directory.
///
/// # Errors
///
/// Returns [`FsOpsError::InvalidInput`] when `name` is empty or is not a single plain path
/// component (separators, `.` or `..`).
pub fn payload_path(directory: &Path, name: &str) -> FsOpsResult<PathBuf> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FsOpsError::invalid_input(
            "name",
            "must not be empty",
            None,
        ));
    }
    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(directory.join(trimmed)),
        _ => Err(FsOpsError::invalid_input(
            "name",
            "must be a single path component",
            Some(trimmed.to_string()),
        )),
    }
}

/// Recursively delete a payload file or directory.
///
/// # Errors
///
/// Returns [`FsOpsError::Io`] when the path exists but cannot be removed.
pub fn remove_payload(path: &Path) -> FsOpsResult<Removal> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "payload already absent");
            return Ok(Removal::AlreadyAbsent);
        }
        Err(err) => return Err(FsOpsError::io("inspect_payload", path, err)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(Removal::Removed),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Removal::AlreadyAbsent),
        Err(err) => Err(FsOpsError::io("remove_payload", path, err)),
    }
}

/// Create `path` (and parents) if missing.
///
/// # Errors
///
/// Returns [`FsOpsError::Io`] when the directory cannot be created, or
/// [`FsOpsError::InvalidInput`] when something other than a directory is already there.
pub fn ensure_directory(path: &Path) -> FsOpsResult<()> {
    if path_exists(path) && !path.is_dir() {
        return Err(FsOpsError::invalid_input(
            "directory",
            "path exists and is not a directory",
            Some(path.display().to_string()),
        ));
    }
    fs::create_dir_all(path).map_err(|err| FsOpsError::io("create_directory", path, err))
}

/// Folder to show for a payload: the payload directory itself, the parent of a single-file
/// payload, or the save directory when the payload is unnamed or missing.
#[must_use]
pub fn folder_to_open(save_path: &Path, name: Option<&str>) -> PathBuf {
    let Some(full) = name.and_then(|name| payload_path(save_path, name).ok()) else {
        return save_path.to_path_buf();
    };
    if full.is_dir() {
        full
    } else if full.exists() {
        full.parent().map_or_else(|| save_path.to_path_buf(), Path::to_path_buf)
    } else {
        save_path.to_path_buf()
    }
}
