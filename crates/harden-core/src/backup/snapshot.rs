//! Snapshot creation, restore and listing

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate};
use harden_fs::{RetryPolicy, checksum, io};
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::{Error, Result};

/// An immutable copy of a target's bytes, already persisted to disk.
#[derive(Debug, Clone)]
pub struct Snapshot {
    target: PathBuf,
    backup: PathBuf,
    taken_at: DateTime<Local>,
    checksum: String,
    bytes: Vec<u8>,
}

impl Snapshot {
    /// File the snapshot restores into, with symlinks resolved
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Where the snapshot lives on disk
    pub fn backup(&self) -> &Path {
        &self.backup
    }

    pub fn taken_at(&self) -> DateTime<Local> {
        self.taken_at
    }

    /// `sha256:<hex>` of the captured bytes
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A backup file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub date: NaiveDate,
    pub size: u64,
}

/// Writes, restores and lists dated backups.
pub struct BackupManager {
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl Default for BackupManager {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl BackupManager {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Backup location for `target` as of today.
    pub fn backup_path_for(&self, target: &Path) -> PathBuf {
        harden_fs::backup_path(target, self.clock.today())
    }

    /// Persist `bytes` as today's backup of `target`.
    ///
    /// The backup is named after `target` as given, while the snapshot
    /// restores into the file `target` resolves to when it is a symlink.
    /// The backup gets the permissions of that file, so a `0600` config is
    /// never copied into a world-readable backup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if `target` is a symlink that cannot be
    /// resolved, and [`Error::Write`] if the backup cannot be written.
    /// Callers must not modify the target in either case.
    pub fn take(&self, target: &Path, bytes: Vec<u8>) -> Result<Snapshot> {
        let taken_at = self.clock.now();
        let backup = harden_fs::backup_path(target, taken_at.date_naive());
        let resolved = harden_fs::resolve_link(target).map_err(|source| Error::Read {
            path: target.to_path_buf(),
            source,
        })?;
        let permissions = fs::metadata(&resolved).ok().map(|m| m.permissions());

        if backup.exists() {
            tracing::info!(backup = %backup.display(), "overwriting same-day backup");
        }

        self.retry
            .run("write backup", || {
                io::write_atomic_with_permissions(&backup, &bytes, permissions.clone())
            })
            .map_err(|source| Error::Write {
                path: backup.clone(),
                source,
            })?;

        tracing::debug!(
            target = %resolved.display(),
            backup = %backup.display(),
            bytes = bytes.len(),
            "snapshot written"
        );

        Ok(Snapshot {
            target: resolved,
            backup,
            taken_at,
            checksum: checksum::compute_bytes_checksum(&bytes),
            bytes,
        })
    }

    /// Write the snapshot's bytes back over its target and verify them.
    ///
    /// Restores from the in-memory copy, so a backup file that was tampered
    /// with after the snapshot was taken does not matter.
    pub fn restore(&self, snapshot: &Snapshot) -> harden_fs::Result<()> {
        let target = snapshot.target();
        self.retry.run("restore snapshot", || {
            io::write_atomic(target, snapshot.bytes())?;
            let actual = checksum::compute_file_checksum(target)?;
            if actual != snapshot.checksum() {
                return Err(harden_fs::Error::ChecksumMismatch {
                    path: target.to_path_buf(),
                    expected: snapshot.checksum().to_string(),
                    actual,
                });
            }
            Ok(())
        })?;

        tracing::info!(target = %target.display(), "snapshot restored");
        Ok(())
    }

    /// All dated backups of `target`, oldest first.
    pub fn list(&self, target: &Path) -> Result<Vec<BackupEntry>> {
        let Some(file_name) = target.file_name().and_then(|n| n.to_str()) else {
            return Ok(Vec::new());
        };
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let prefix = format!("{file_name}{}", harden_fs::path::BACKUP_MARKER);
        let entries = fs::read_dir(dir).map_err(|e| harden_fs::Error::io(dir, e))?;

        let mut backups = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(
                        dir = %dir.display(),
                        error = %e,
                        "skipping unreadable directory entry"
                    );
                    continue;
                }
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(date) = name
                .strip_prefix(&prefix)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                continue;
            };
            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    tracing::debug!(
                        backup = %entry.path().display(),
                        error = %e,
                        "backup size unavailable"
                    );
                    0
                }
            };
            backups.push(BackupEntry {
                path: entry.path(),
                date,
                size,
            });
        }

        backups.sort_by_key(|b| b.date);
        Ok(backups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::clock::FixedClock;

    fn manager_on(y: i32, m: u32, d: u32) -> BackupManager {
        let instant = Local.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap();
        BackupManager::new(Arc::new(FixedClock(instant))).with_retry(RetryPolicy::none())
    }

    #[test]
    fn take_writes_dated_backup() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("sshd_config");

        let snapshot = manager_on(2025, 4, 25)
            .take(&target, b"Port 22\n".to_vec())
            .unwrap();

        assert_eq!(
            snapshot.backup(),
            temp.path().join("sshd_config.backup.2025-04-25")
        );
        assert_eq!(fs::read(snapshot.backup()).unwrap(), b"Port 22\n");
        assert!(snapshot.checksum().starts_with("sha256:"));
    }

    #[test]
    fn same_day_backup_is_overwritten() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("sshd_config");
        let manager = manager_on(2025, 4, 25);

        manager.take(&target, b"first\n".to_vec()).unwrap();
        let second = manager.take(&target, b"second\n".to_vec()).unwrap();

        assert_eq!(fs::read(second.backup()).unwrap(), b"second\n");
        assert_eq!(manager.list(&target).unwrap().len(), 1);
    }

    #[test]
    fn restore_writes_snapshot_bytes_back() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("sshd_config");
        fs::write(&target, "Port 22\n").unwrap();
        let manager = manager_on(2025, 4, 25);

        let snapshot = manager.take(&target, fs::read(&target).unwrap()).unwrap();
        fs::write(&target, "garbage\n").unwrap();
        manager.restore(&snapshot).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "Port 22\n");
    }

    #[test]
    fn list_returns_backups_oldest_first() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("sshd_config");

        manager_on(2025, 5, 1).take(&target, b"b\n".to_vec()).unwrap();
        manager_on(2025, 4, 25).take(&target, b"a\n".to_vec()).unwrap();
        fs::write(temp.path().join("sshd_config.backup.notadate"), "x").unwrap();
        fs::write(temp.path().join("ssh_config.backup.2025-04-25"), "x").unwrap();

        let dates: Vec<String> = manager_on(2025, 5, 2)
            .list(&target)
            .unwrap()
            .iter()
            .map(|b| b.date.to_string())
            .collect();
        assert_eq!(dates, vec!["2025-04-25", "2025-05-01"]);
    }

    #[test]
    fn list_of_missing_directory_is_empty() {
        let backups = manager_on(2025, 4, 25)
            .list(Path::new("/nonexistent/dir/sshd_config"))
            .unwrap();
        assert!(backups.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn backup_inherits_target_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let target = temp.path().join("sshd_config");
        fs::write(&target, "PermitRootLogin yes\n").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o600)).unwrap();

        let snapshot = manager_on(2025, 4, 25)
            .take(&target, fs::read(&target).unwrap())
            .unwrap();

        let mode = fs::metadata(snapshot.backup()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_target_is_backed_up_beside_link_and_restored_through_it() {
        let temp = TempDir::new().unwrap();
        let real_dir = temp.path().join("real");
        fs::create_dir(&real_dir).unwrap();
        let real = real_dir.join("sshd_config");
        fs::write(&real, "Port 22\n").unwrap();
        let link = temp.path().join("sshd_config");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        let manager = manager_on(2025, 4, 25);

        let snapshot = manager.take(&link, fs::read(&link).unwrap()).unwrap();
        assert_eq!(snapshot.backup(), temp.path().join("sshd_config.backup.2025-04-25"));

        fs::write(&real, "garbage\n").unwrap();
        manager.restore(&snapshot).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "Port 22\n");
    }
}
