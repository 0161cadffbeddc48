//! Apply command: reconcile, validate, roll back on rejection

use std::path::PathBuf;

use colored::Colorize;
use harden_core::{
    ApplyResult, ConfigFile, Error, Platform, TargetFile, TargetReport, TargetStatus,
    ValidationOutcome,
};
use serde::Serialize;

use super::{exit_code, print_change, print_json};
use crate::context::RunContext;
use crate::error::Result;

/// JSON view of one target's outcome
#[derive(Debug, Serialize)]
struct TargetSummary<'a> {
    path: &'a PathBuf,
    status: TargetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a ApplyResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a TargetReport> for TargetSummary<'a> {
    fn from(report: &'a TargetReport) -> Self {
        Self {
            path: &report.path,
            status: report.status(),
            result: report.outcome.as_ref().ok(),
            error: report.outcome.as_ref().err().map(ToString::to_string),
        }
    }
}

/// Run the apply command
///
/// Returns the process exit code.
pub fn run_apply(ctx: &RunContext, json: bool) -> Result<i32> {
    if !json {
        println!(
            "{} Applying profile {} ({}, {} targets)...",
            "=>".blue().bold(),
            ctx.profile.name.cyan(),
            ctx.platform,
            ctx.targets.len()
        );
    }

    let report = ctx.orchestrator.run(&ctx.targets);

    if json {
        let summaries: Vec<TargetSummary> = report.targets.iter().map(Into::into).collect();
        print_json(&summaries)?;
        return Ok(exit_code(report.worst()));
    }

    for target in &report.targets {
        print_target(target);
    }

    println!();
    println!(
        "{} succeeded, {} rolled back, {} failed, {} interrupted, {} rollback failed",
        report.count(TargetStatus::Success).to_string().green(),
        report.count(TargetStatus::RolledBack).to_string().yellow(),
        report.count(TargetStatus::Failed).to_string().red(),
        report.count(TargetStatus::Interrupted).to_string().red(),
        report.count(TargetStatus::RollbackFailed).to_string().red().bold(),
    );

    let sshd_changed = ctx
        .targets
        .iter()
        .zip(&report.targets)
        .any(|(target, report)| {
            target.file == TargetFile::Known(ConfigFile::SshdConfig)
                && matches!(&report.outcome, Ok(r) if r.is_success() && r.changed() > 0)
        });
    if sshd_changed {
        println!();
        println!(
            "sshd_config changed. Restart the daemon to pick it up: {}",
            restart_hint(ctx.platform).cyan()
        );
    }

    Ok(exit_code(report.worst()))
}

fn print_target(target: &TargetReport) {
    let path = target.path.display().to_string();
    match &target.outcome {
        Ok(result) if result.rolled_back => {
            println!(
                "{} {}: validator rejected the change, original restored",
                "ROLLED BACK".yellow().bold(),
                path.cyan()
            );
            for line in result.validation.diagnostics().lines() {
                println!("   {} {}", "|".yellow(), line);
            }
        }
        Ok(result) => {
            let verdict = match &result.validation {
                ValidationOutcome::Passed { .. } => "validated",
                ValidationOutcome::Skipped => "not validated",
                ValidationOutcome::Failed { .. } => "",
            };
            if result.changed() == 0 {
                println!(
                    "{} {}: already hardened ({} directives, {verdict})",
                    "OK".green().bold(),
                    path.cyan(),
                    result.unchanged()
                );
            } else {
                println!(
                    "{} {}: {} changed, {} unchanged ({verdict})",
                    "OK".green().bold(),
                    path.cyan(),
                    result.changed(),
                    result.unchanged()
                );
                for change in &result.changes {
                    print_change(change);
                }
                println!("   {} {}", "backup:".dimmed(), result.backup.display());
            }
        }
        Err(e @ Error::RollbackFailed { .. }) => {
            println!("{} {}: {}", "ROLLBACK FAILED".red().bold(), path.cyan(), e);
        }
        Err(e @ Error::Interrupted { .. }) => {
            println!("{} {}: {}", "INTERRUPTED".red().bold(), path.cyan(), e);
            println!("   {} inspect the file and its latest backup", "!".red());
        }
        Err(e) => {
            println!("{} {}: {}", "ERROR".red().bold(), path.cyan(), e);
        }
    }
}

fn restart_hint(platform: Platform) -> &'static str {
    match platform {
        Platform::Linux => "systemctl restart sshd",
        Platform::Macos => "launchctl kickstart -k system/com.openssh.sshd",
    }
}
