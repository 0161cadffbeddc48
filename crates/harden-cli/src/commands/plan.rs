//! Plan command: show the diff apply would produce

use std::path::PathBuf;

use colored::Colorize;
use harden_core::DirectiveChange;
use serde::Serialize;

use super::{EXIT_ATTENTION, EXIT_OK, print_json};
use crate::context::RunContext;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct PlanSummary<'a> {
    path: &'a PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    changes: Option<&'a [DirectiveChange]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run the plan command
///
/// Nothing is written, not even backups.
pub fn run_plan(ctx: &RunContext, json: bool) -> Result<i32> {
    let plans = ctx.orchestrator.plan(&ctx.targets);
    let failed = plans.iter().any(|(_, plan)| plan.is_err());
    let code = if failed { EXIT_ATTENTION } else { EXIT_OK };

    if json {
        let summaries: Vec<PlanSummary> = plans
            .iter()
            .map(|(path, plan)| match plan {
                Ok(plan) => PlanSummary {
                    path,
                    changes: Some(plan.changes.as_slice()),
                    diff: Some(plan.diff.as_str()),
                    error: None,
                },
                Err(e) => PlanSummary {
                    path,
                    changes: None,
                    diff: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();
        print_json(&summaries)?;
        return Ok(code);
    }

    println!(
        "{} Planning profile {} (dry run)...",
        "=>".blue().bold(),
        ctx.profile.name.cyan()
    );

    for (path, plan) in &plans {
        let path = path.display().to_string();
        match plan {
            Ok(plan) if plan.is_noop() => {
                println!("{} {}: no changes", "OK".green().bold(), path.cyan());
            }
            Ok(plan) => {
                println!("{} {}:", "~".yellow().bold(), path.cyan());
                print_diff(&plan.diff);
            }
            Err(e) => {
                println!("{} {}: {}", "ERROR".red().bold(), path.cyan(), e);
            }
        }
    }

    Ok(code)
}

fn print_diff(diff: &str) {
    for line in diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else {
            println!("{line}");
        }
    }
}
