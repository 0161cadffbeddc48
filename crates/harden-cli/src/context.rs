//! Run context built from global flags
//!
//! Resolves which profile to use, which platform layout applies, and wires
//! up the orchestrator every command works through.

use std::time::Duration;

use harden_core::{ApplyOrchestrator, Platform, Profile, SafetyGuard, Target};

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Everything a command needs to act on the selected targets.
pub struct RunContext {
    pub profile: Profile,
    pub platform: Platform,
    pub orchestrator: ApplyOrchestrator,
    pub targets: Vec<Target>,
}

impl RunContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        if cli.workers == 0 {
            return Err(CliError::user("--workers must be at least 1"));
        }

        let profile = load_profile(cli)?;

        // Flag beats profile, profile beats the host
        let platform = match &cli.platform {
            Some(name) => name.parse::<Platform>()?,
            None => profile.platform.unwrap_or_else(Platform::current),
        };

        let resolver = platform.resolver(cli.root.as_deref());
        let timeout = Duration::from_secs(cli.validator_timeout);
        let targets = profile.targets(resolver.as_ref(), Some(timeout))?;

        tracing::debug!(
            profile = %profile.name,
            %platform,
            targets = targets.len(),
            "run context ready"
        );

        let orchestrator = ApplyOrchestrator::new(SafetyGuard::default(), resolver)
            .with_max_workers(cli.workers);

        Ok(Self {
            profile,
            platform,
            orchestrator,
            targets,
        })
    }
}

/// The profile named by `--profile`, or the selected built-in.
pub fn load_profile(cli: &Cli) -> Result<Profile> {
    let profile = match &cli.profile {
        Some(path) => Profile::load(path)?,
        None => Profile::builtin(&cli.builtin)?,
    };
    Ok(profile)
}
