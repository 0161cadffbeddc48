//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use fs2::FileExt;

use crate::{Error, Result};

/// Read the raw bytes of a file.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::io(path, e))
}

/// Read a file as UTF-8 text.
///
/// Unlike `fs::read_to_string`, invalid UTF-8 is reported as
/// [`Error::Encoding`] rather than an I/O error, so callers can tell an
/// unreadable file from one they must not rewrite.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = read_bytes(path)?;
    String::from_utf8(bytes).map_err(|_| Error::Encoding {
        path: path.to_path_buf(),
    })
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so readers never observe a partial file.
/// When the target already exists its permission bits are copied onto the
/// temp file before the rename, so `0600` daemon configs stay `0600`.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    write_atomic_with_permissions(path, content, None)
}

/// Like [`write_atomic`], but the written file gets `permissions` instead of
/// those of the file it replaces.
///
/// Used for backups, which are new files that must not be more readable
/// than the config they copy. The permissions are applied before any content
/// is written.
pub fn write_atomic_with_permissions(
    path: &Path,
    content: &[u8],
    permissions: Option<fs::Permissions>,
) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let permissions = permissions.or_else(|| fs::metadata(path).ok().map(|m| m.permissions()));

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let result = write_temp(&temp_path, path, content, permissions);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
        return result;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io(path, e)
    })?;

    tracing::trace!(path = %path.display(), bytes = content.len(), "atomic write complete");
    Ok(())
}

fn write_temp(
    temp_path: &Path,
    target: &Path,
    content: &[u8],
    permissions: Option<fs::Permissions>,
) -> Result<()> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;

    if let Some(permissions) = permissions {
        fs::set_permissions(temp_path, permissions).map_err(|e| Error::io(temp_path, e))?;
    }

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;

    Ok(())
}

/// Write text content to a file atomically.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}
