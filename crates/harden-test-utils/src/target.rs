//! [`TestTarget`]: a temporary directory holding config files under test.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory with helpers for writing and inspecting config
/// files.
///
/// # Example
///
/// ```rust,no_run
/// use harden_test_utils::TestTarget;
///
/// let target = TestTarget::new();
/// let path = target.write("sshd_config", "PermitRootLogin yes\n");
/// assert_eq!(target.read("sshd_config"), "PermitRootLogin yes\n");
/// # let _ = path;
/// ```
pub struct TestTarget {
    temp_dir: TempDir,
}

impl Default for TestTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTarget {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` inside the directory.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `content` to `relative`, creating parents, and return its path.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Lay out `etc/ssh/sshd_config` and `etc/ssh/ssh_config` as if this
    /// directory were a filesystem root.
    pub fn with_etc_ssh(self, sshd: &str, ssh: &str) -> Self {
        self.write("etc/ssh/sshd_config", sshd);
        self.write("etc/ssh/ssh_config", ssh);
        self
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn read_bytes(&self, relative: &str) -> Vec<u8> {
        fs::read(self.path(relative)).unwrap()
    }

    /// File names in the directory containing `relative`, sorted.
    pub fn siblings(&self, relative: &str) -> Vec<String> {
        let dir = self
            .path(relative)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root().to_path_buf());
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
