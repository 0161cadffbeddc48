//! Idempotent SSH configuration reconciliation with verified rollback
//!
//! This crate implements the reconcile / verify / roll back loop for
//! line-oriented `key value` configuration files such as `sshd_config` and
//! `ssh_config`:
//!
//! - **ConfigReconciler**: rewrites or appends one line per directive and
//!   reports, per directive, whether anything changed
//! - **SafetyGuard**: snapshot before, validate after, restore on rejection
//! - **ApplyOrchestrator**: runs the guard across many targets, resolving
//!   well-known files through a per-platform [`PathResolver`]
//!
//! # Architecture
//!
//! ```text
//!              harden-cli
//!                  |
//!             harden-core
//!   profile -> orchestrator -> guard -> reconcile -> document
//!                                |
//!                     backup / validate / clock
//!                  |
//!              harden-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use harden_core::{Directive, NoopValidator, SafetyGuard};
//!
//! # fn main() -> harden_core::Result<()> {
//! let guard = SafetyGuard::default();
//! let result = guard.apply(
//!     Path::new("/etc/ssh/sshd_config"),
//!     &[Directive::set("PermitRootLogin", "no")],
//!     &NoopValidator,
//! )?;
//! assert!(!result.rolled_back);
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod clock;
pub mod directive;
pub mod document;
pub mod error;
pub mod guard;
pub mod orchestrator;
pub mod paths;
pub mod profile;
pub mod reconcile;
pub mod validate;

pub use backup::{BackupEntry, BackupManager, Snapshot};
pub use clock::{Clock, FixedClock, SystemClock};
pub use directive::{Directive, DirectiveValue};
pub use document::{ConfigDocument, LineKind};
pub use error::{Error, Result};
pub use guard::{ApplyResult, SafetyGuard};
pub use harden_fs::RetryPolicy;
pub use orchestrator::{
    ApplyOrchestrator, RunReport, Target, TargetFile, TargetReport, TargetStatus,
};
pub use paths::{ConfigFile, LinuxPaths, MacPaths, PathResolver, Platform};
pub use profile::{Profile, TargetSpec, ValidatorName, ValidatorSpec};
pub use reconcile::{ChangeKind, ConfigReconciler, DirectiveChange, Plan, Reconciliation};
pub use validate::{CommandValidator, NoopValidator, ValidationOutcome, Validator};
