//! Per-platform locations of SSH config files and their checkers

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::validate::CommandValidator;

/// Config files the tool knows how to find on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigFile {
    /// Daemon config, `sshd_config`
    #[serde(alias = "sshd")]
    SshdConfig,
    /// Client config, `ssh_config`
    #[serde(alias = "ssh")]
    SshConfig,
}

impl fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SshdConfig => f.write_str("sshd_config"),
            Self::SshConfig => f.write_str("ssh_config"),
        }
    }
}

/// Resolves well-known files and checker binaries for one platform.
pub trait PathResolver: Send + Sync {
    fn platform(&self) -> Platform;

    fn config_path(&self, file: ConfigFile) -> PathBuf;

    /// Path to the `sshd` binary used for `sshd -t`.
    fn sshd_binary(&self) -> PathBuf;

    /// Path to the `ssh` client binary used for `ssh -G`.
    fn ssh_binary(&self) -> PathBuf;

    /// The checker that understands `file`.
    fn validator_for(&self, file: ConfigFile) -> CommandValidator {
        match file {
            ConfigFile::SshdConfig => CommandValidator::sshd(self.sshd_binary()),
            ConfigFile::SshConfig => CommandValidator::ssh_client(self.ssh_binary()),
        }
    }
}

/// Target operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    #[serde(alias = "darwin")]
    Macos,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::Macos
        } else {
            Self::Linux
        }
    }

    /// Resolver for this platform, optionally re-rooted under `root`.
    pub fn resolver(self, root: Option<&Path>) -> Box<dyn PathResolver> {
        let root = root.map(Path::to_path_buf);
        match self {
            Self::Linux => Box::new(LinuxPaths { root }),
            Self::Macos => Box::new(MacPaths { root }),
        }
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" | "mac" => Ok(Self::Macos),
            other => Err(Error::Profile {
                message: format!("unknown platform '{other}' (expected linux or macos)"),
            }),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => f.write_str("linux"),
            Self::Macos => f.write_str("macos"),
        }
    }
}

fn rooted(root: Option<&PathBuf>, path: &str) -> PathBuf {
    match root {
        Some(root) => harden_fs::rebase(root, Path::new(path)),
        None => PathBuf::from(path),
    }
}

/// Amazon Linux, RHEL and other OpenSSH-on-Linux layouts.
///
/// With a root set, config paths are resolved under it (useful for image
/// build trees). Binaries are always the host's.
#[derive(Debug, Clone, Default)]
pub struct LinuxPaths {
    pub root: Option<PathBuf>,
}

impl PathResolver for LinuxPaths {
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    fn config_path(&self, file: ConfigFile) -> PathBuf {
        match file {
            ConfigFile::SshdConfig => rooted(self.root.as_ref(), "/etc/ssh/sshd_config"),
            ConfigFile::SshConfig => rooted(self.root.as_ref(), "/etc/ssh/ssh_config"),
        }
    }

    fn sshd_binary(&self) -> PathBuf {
        PathBuf::from("/usr/sbin/sshd")
    }

    fn ssh_binary(&self) -> PathBuf {
        PathBuf::from("/usr/bin/ssh")
    }
}

/// macOS layout (Apple's bundled OpenSSH).
#[derive(Debug, Clone, Default)]
pub struct MacPaths {
    pub root: Option<PathBuf>,
}

impl PathResolver for MacPaths {
    fn platform(&self) -> Platform {
        Platform::Macos
    }

    fn config_path(&self, file: ConfigFile) -> PathBuf {
        match file {
            ConfigFile::SshdConfig => rooted(self.root.as_ref(), "/private/etc/ssh/sshd_config"),
            ConfigFile::SshConfig => rooted(self.root.as_ref(), "/private/etc/ssh/ssh_config"),
        }
    }

    fn sshd_binary(&self) -> PathBuf {
        PathBuf::from("/usr/sbin/sshd")
    }

    fn ssh_binary(&self) -> PathBuf {
        PathBuf::from("/usr/bin/ssh")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn linux_paths() {
        let paths = LinuxPaths::default();
        assert_eq!(
            paths.config_path(ConfigFile::SshdConfig),
            PathBuf::from("/etc/ssh/sshd_config")
        );
        assert_eq!(
            paths.config_path(ConfigFile::SshConfig),
            PathBuf::from("/etc/ssh/ssh_config")
        );
    }

    #[test]
    fn mac_paths_use_private_etc() {
        let paths = MacPaths::default();
        assert_eq!(
            paths.config_path(ConfigFile::SshdConfig),
            PathBuf::from("/private/etc/ssh/sshd_config")
        );
    }

    #[test]
    fn root_prefix_rebases_config_paths() {
        let resolver = Platform::Linux.resolver(Some(Path::new("/tmp/image")));
        assert_eq!(
            resolver.config_path(ConfigFile::SshConfig),
            PathBuf::from("/tmp/image/etc/ssh/ssh_config")
        );
        assert_eq!(resolver.sshd_binary(), PathBuf::from("/usr/sbin/sshd"));
    }

    #[test]
    fn validator_for_sshd_runs_config_test() {
        let v = LinuxPaths::default().validator_for(ConfigFile::SshdConfig);
        assert_eq!(v.program(), Path::new("/usr/sbin/sshd"));
        assert_eq!(v.args_for(Path::new("/x")), vec!["-t", "-f", "/x"]);
    }

    #[test]
    fn platform_parses_aliases() {
        assert_eq!("Darwin".parse::<Platform>().unwrap(), Platform::Macos);
        assert_eq!("linux".parse::<Platform>().unwrap(), Platform::Linux);
        assert!("windows".parse::<Platform>().is_err());
    }
}
