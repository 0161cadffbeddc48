//! Check command: report drift without writing

use std::path::PathBuf;

use colored::Colorize;
use harden_core::DirectiveChange;
use serde::Serialize;

use super::{EXIT_ATTENTION, EXIT_OK, print_change, print_json};
use crate::context::RunContext;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct CheckSummary<'a> {
    path: &'a PathBuf,
    converged: bool,
    drift: Vec<&'a DirectiveChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run the check command
///
/// Exits with [`EXIT_ATTENTION`] when any target would change or cannot be
/// read.
pub fn run_check(ctx: &RunContext, json: bool) -> Result<i32> {
    let plans = ctx.orchestrator.plan(&ctx.targets);

    let summaries: Vec<CheckSummary> = plans
        .iter()
        .map(|(path, plan)| match plan {
            Ok(plan) => {
                let drift: Vec<_> = plan.changes.iter().filter(|c| c.is_change()).collect();
                CheckSummary {
                    path,
                    converged: drift.is_empty(),
                    drift,
                    error: None,
                }
            }
            Err(e) => CheckSummary {
                path,
                converged: false,
                drift: Vec::new(),
                error: Some(e.to_string()),
            },
        })
        .collect();

    let code = if summaries.iter().all(|s| s.converged) {
        EXIT_OK
    } else {
        EXIT_ATTENTION
    };

    if json {
        print_json(&summaries)?;
        return Ok(code);
    }

    println!(
        "{} Checking profile {}...",
        "=>".blue().bold(),
        ctx.profile.name.cyan()
    );

    for summary in &summaries {
        let path = summary.path.display().to_string();
        if let Some(error) = &summary.error {
            println!("{} {}: {}", "ERROR".red().bold(), path.cyan(), error);
        } else if summary.converged {
            println!("{} {}: hardened", "OK".green().bold(), path.cyan());
        } else {
            println!(
                "{} {}: {} directives not in place",
                "DRIFTED".red().bold(),
                path.cyan(),
                summary.drift.len()
            );
            for change in &summary.drift {
                print_change(change);
            }
        }
    }

    if code != EXIT_OK {
        println!();
        println!("Run {} to repair.", "harden apply".cyan());
    }

    Ok(code)
}
