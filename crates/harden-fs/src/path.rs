//! Path helpers for backup naming and target identity

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::NaiveDate;

use crate::{Error, Result};

/// Suffix inserted between a config path and its backup date.
pub const BACKUP_MARKER: &str = ".backup.";

/// Derive the dated backup location for a target file.
///
/// `/etc/ssh/sshd_config` on `2025-04-25` becomes
/// `/etc/ssh/sshd_config.backup.2025-04-25`. Same-day calls return the same
/// path, so the last snapshot of a day wins.
pub fn backup_path(target: &Path, date: NaiveDate) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(BACKUP_MARKER);
    name.push(date.format("%Y-%m-%d").to_string());
    PathBuf::from(name)
}

/// Re-anchor an absolute path under `root`.
///
/// `rebase("/srv/image", "/etc/ssh/sshd_config")` yields
/// `/srv/image/etc/ssh/sshd_config`. Relative paths are joined as-is.
pub fn rebase(root: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    root.join(relative)
}

/// Identity used to decide whether two targets touch the same file.
///
/// Resolves symlinks and `..` when the file exists; falls back to the path
/// as given otherwise, which is still a stable key for the same input.
pub fn lane_key(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// The file a write to `path` should land in.
///
/// A symlink resolves to its final target so that writes replace the real
/// file rather than the link. Anything else, including a missing path, is
/// returned as given.
pub fn resolve_link(path: &Path) -> Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            dunce::canonicalize(path).map_err(|e| Error::io(path, e))
        }
        _ => Ok(path.to_path_buf()),
    }
}
