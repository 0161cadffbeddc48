//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// harden - Idempotent SSH configuration hardening with verified rollback
#[derive(Parser, Debug)]
#[command(name = "harden")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Profile file (TOML, JSON or YAML) to use instead of a built-in one
    #[arg(long, global = true, env = "HARDEN_PROFILE", conflicts_with = "builtin")]
    pub profile: Option<PathBuf>,

    /// Built-in profile to use
    #[arg(long, global = true, default_value = "openssh-modern")]
    pub builtin: String,

    /// Platform whose file layout to use (linux or macos)
    #[arg(long, global = true)]
    pub platform: Option<String>,

    /// Resolve well-known config files under this directory instead of /
    #[arg(long, global = true, env = "HARDEN_ROOT")]
    pub root: Option<PathBuf>,

    /// Maximum number of files processed at once
    #[arg(long, global = true, default_value_t = 1)]
    pub workers: usize,

    /// Seconds a validator may run before it counts as failed
    #[arg(long, global = true, default_value_t = 30)]
    pub validator_timeout: u64,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Reconcile every target, validating and rolling back on rejection
    ///
    /// Each file is backed up to <file>.backup.<YYYY-MM-DD> first.
    ///
    /// Examples:
    ///   harden apply                        # Built-in profile, live system
    ///   harden apply --root /mnt/image      # Harden an image build tree
    ///   harden apply --profile site.toml    # Site-specific profile
    Apply,

    /// Show the diff each target would receive without writing anything
    Plan,

    /// Report targets whose directives are not in place (exit 2 on drift)
    Check,

    /// List dated backups of every target
    Backups,

    /// Inspect hardening profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

/// Profile subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ProfileAction {
    /// List built-in profiles
    List,

    /// Print the selected profile
    Show,
}
