//! Command implementations for harden-cli

pub mod apply;
pub mod backups;
pub mod check;
pub mod plan;
pub mod profile;

pub use apply::run_apply;
pub use backups::run_backups;
pub use check::run_check;
pub use plan::run_plan;
pub use profile::{run_profile_list, run_profile_show};

use colored::Colorize;
use harden_core::{ChangeKind, DirectiveChange, TargetStatus};
use serde::Serialize;

use crate::error::Result;

/// Every target ended as intended.
pub const EXIT_OK: i32 = 0;
/// A target was rolled back, could not be processed, or has drifted.
pub const EXIT_ATTENTION: i32 = 2;
/// A rollback failed or a target was interrupted; a file may be left broken.
pub const EXIT_ROLLBACK_FAILED: i32 = 3;

/// Process exit code for the most severe target status of a run.
pub fn exit_code(worst: TargetStatus) -> i32 {
    match worst {
        TargetStatus::Success => EXIT_OK,
        TargetStatus::RolledBack | TargetStatus::Failed => EXIT_ATTENTION,
        TargetStatus::Interrupted | TargetStatus::RollbackFailed => EXIT_ROLLBACK_FAILED,
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One indented line describing a directive change.
pub fn print_change(change: &DirectiveChange) {
    match change.kind {
        ChangeKind::Replaced => {
            println!(
                "   {} {} {}",
                "~".yellow(),
                change.current,
                format!(
                    "(line {}, was: {})",
                    change.line + 1,
                    change.previous.as_deref().unwrap_or("")
                )
                .dimmed()
            );
        }
        ChangeKind::Appended => {
            println!("   {} {}", "+".green(), change.current);
        }
        ChangeKind::Unchanged => {}
    }
}
