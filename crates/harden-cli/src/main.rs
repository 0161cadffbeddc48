//! harden CLI
//!
//! Applies a hardening profile to SSH configuration files, validating every
//! change and rolling back anything the validator rejects.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, ProfileAction};
use context::RunContext;
use error::Result;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    logging::init(cli.verbose)?;

    match &cli.command {
        Some(cmd) => execute_command(&cli, cmd),
        None => {
            // No command provided - show help hint
            println!("{} SSH configuration hardening", "harden".green().bold());
            println!();
            println!("Run {} for available commands.", "harden --help".cyan());
            Ok(commands::EXIT_OK)
        }
    }
}

fn execute_command(cli: &Cli, cmd: &Commands) -> Result<i32> {
    match cmd {
        Commands::Apply => commands::run_apply(&RunContext::from_cli(cli)?, cli.json),
        Commands::Plan => commands::run_plan(&RunContext::from_cli(cli)?, cli.json),
        Commands::Check => commands::run_check(&RunContext::from_cli(cli)?, cli.json),
        Commands::Backups => commands::run_backups(&RunContext::from_cli(cli)?, cli.json),
        Commands::Profile { action } => match action {
            ProfileAction::List => commands::run_profile_list(cli.json),
            ProfileAction::Show => {
                let profile = context::load_profile(cli)?;
                commands::run_profile_show(&profile, cli.json)
            }
        },
    }
}
