//! Hardening profiles: declarative target and directive sets
//!
//! Which algorithms are acceptable is policy, so it lives in data. A profile
//! lists targets; each names a file (a well-known one or an explicit path),
//! how to validate it, and the directives to enforce.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use harden_fs::ConfigStore;
use serde::{Deserialize, Serialize};

use crate::directive::{self, Directive};
use crate::orchestrator::{Target, TargetFile};
use crate::paths::{ConfigFile, PathResolver, Platform};
use crate::validate::{CommandValidator, NoopValidator, Validator};
use crate::{Error, Result};

const BUILTIN: &[(&str, &str)] = &[(
    "openssh-modern",
    include_str!("../profiles/openssh-modern.toml"),
)];

/// Named validators a profile can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorName {
    /// The checker matching the well-known file
    #[default]
    Auto,
    Sshd,
    Ssh,
    None,
}

/// How a target's result is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidatorSpec {
    Named(ValidatorName),
    Command {
        /// Program and arguments; `{path}` is replaced by the target path
        command: Vec<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl Default for ValidatorSpec {
    fn default() -> Self {
        Self::Named(ValidatorName::Auto)
    }
}

/// One file in a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Well-known file (`sshd` or `ssh`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<ConfigFile>,
    /// Explicit path, used instead of `file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub validator: ValidatorSpec,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

/// A named set of targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Platform whose paths to use when the caller does not choose one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
}

impl Profile {
    /// Load a profile from a TOML, JSON or YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let profile: Self = ConfigStore::new().load(path)?;
        profile.check()?;
        Ok(profile)
    }

    /// A profile shipped with the tool.
    pub fn builtin(name: &str) -> Result<Self> {
        let source = Self::builtin_source(name).ok_or_else(|| Error::Profile {
            message: format!(
                "no built-in profile named '{name}' (available: {})",
                Self::builtin_names().join(", ")
            ),
        })?;
        let profile: Self = ConfigStore::parse(Path::new(name), "toml", source)?;
        profile.check()?;
        Ok(profile)
    }

    /// Raw TOML of a built-in profile.
    pub fn builtin_source(name: &str) -> Option<&'static str> {
        BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, source)| *source)
    }

    pub fn builtin_names() -> Vec<&'static str> {
        BUILTIN.iter().map(|(name, _)| *name).collect()
    }

    /// Structural checks that do not depend on a platform.
    pub fn check(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(self.error("profile has no targets"));
        }
        for (index, target) in self.targets.iter().enumerate() {
            match (&target.file, &target.path) {
                (Some(_), Some(_)) => {
                    return Err(self.error(&format!(
                        "target {index} sets both 'file' and 'path'"
                    )));
                }
                (None, None) => {
                    return Err(self.error(&format!(
                        "target {index} needs either 'file' or 'path'"
                    )));
                }
                _ => {}
            }
            let auto = target.validator == ValidatorSpec::Named(ValidatorName::Auto);
            if target.path.is_some() && auto {
                return Err(self.error(&format!(
                    "target {index} uses an explicit path; \
                     choose a validator (sshd, ssh, none or a command)"
                )));
            }
            if let ValidatorSpec::Command { command, .. } = &target.validator
                && command.is_empty()
            {
                return Err(self.error(&format!("target {index} has an empty validator command")));
            }
            directive::validate_set(&target.directives)?;
        }
        Ok(())
    }

    /// Turn the profile into runnable targets.
    ///
    /// `default_timeout` applies to every command validator that does not set
    /// its own.
    pub fn targets(
        &self,
        resolver: &dyn PathResolver,
        default_timeout: Option<Duration>,
    ) -> Result<Vec<Target>> {
        self.check()?;
        self.targets
            .iter()
            .map(|spec| {
                let file = match (&spec.file, &spec.path) {
                    (Some(known), _) => TargetFile::Known(*known),
                    (None, Some(path)) => TargetFile::Path(path.clone()),
                    (None, None) => return Err(self.error("target without a file")),
                };
                let validator = build_validator(spec, resolver, default_timeout)
                    .ok_or_else(|| self.error("target validator could not be built"))?;
                Ok(Target::new(file, spec.directives.clone(), validator))
            })
            .collect()
    }

    fn error(&self, message: &str) -> Error {
        Error::Profile {
            message: format!("{}: {message}", self.name),
        }
    }
}

fn build_validator(
    spec: &TargetSpec,
    resolver: &dyn PathResolver,
    default_timeout: Option<Duration>,
) -> Option<Arc<dyn Validator>> {
    let with_timeout = |v: CommandValidator, timeout: Option<Duration>| -> Arc<dyn Validator> {
        match timeout {
            Some(timeout) => Arc::new(v.with_timeout(timeout)),
            None => Arc::new(v),
        }
    };

    match &spec.validator {
        ValidatorSpec::Named(ValidatorName::None) => Some(Arc::new(NoopValidator)),
        ValidatorSpec::Named(ValidatorName::Auto) => {
            let file = spec.file?;
            Some(with_timeout(resolver.validator_for(file), default_timeout))
        }
        ValidatorSpec::Named(ValidatorName::Sshd) => Some(with_timeout(
            resolver.validator_for(ConfigFile::SshdConfig),
            default_timeout,
        )),
        ValidatorSpec::Named(ValidatorName::Ssh) => Some(with_timeout(
            resolver.validator_for(ConfigFile::SshConfig),
            default_timeout,
        )),
        ValidatorSpec::Command {
            command,
            timeout_secs,
        } => {
            let (program, args) = command.split_first()?;
            let timeout = timeout_secs.map(Duration::from_secs).or(default_timeout);
            Some(with_timeout(
                CommandValidator::new(program, args.iter().cloned()),
                timeout,
            ))
        }
    }
}
