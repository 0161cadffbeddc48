//! Backups command: list dated backups per target

use colored::Colorize;
use harden_core::BackupEntry;
use serde::Serialize;

use super::{EXIT_OK, print_json};
use crate::context::RunContext;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct TargetBackups {
    path: std::path::PathBuf,
    backups: Vec<BackupEntry>,
}

/// Run the backups command
pub fn run_backups(ctx: &RunContext, json: bool) -> Result<i32> {
    let backups = ctx.orchestrator.guard().backups();

    let mut listing = Vec::with_capacity(ctx.targets.len());
    for target in &ctx.targets {
        let path = ctx.orchestrator.resolve(&target.file);
        let entries = backups.list(&path)?;
        listing.push(TargetBackups {
            path,
            backups: entries,
        });
    }

    if json {
        print_json(&listing)?;
        return Ok(EXIT_OK);
    }

    for target in &listing {
        println!("{}", target.path.display().to_string().cyan().bold());
        if target.backups.is_empty() {
            println!("   {}", "no backups".dimmed());
        }
        for entry in &target.backups {
            println!(
                "   {} {} {}",
                entry.date.to_string().green(),
                entry.path.display(),
                format!("({} bytes)", entry.size).dimmed()
            );
        }
    }

    Ok(EXIT_OK)
}
