//! Profile commands: list built-ins, print the selected profile

use colored::Colorize;
use harden_core::Profile;

use super::{EXIT_OK, print_json};
use crate::error::Result;

/// Run `profile list`
pub fn run_profile_list(json: bool) -> Result<i32> {
    let names = Profile::builtin_names();
    if json {
        print_json(&names)?;
        return Ok(EXIT_OK);
    }

    for name in names {
        let description = Profile::builtin(name)
            .map(|p| p.description)
            .unwrap_or_default();
        println!("{} {}", name.green().bold(), description.dimmed());
    }
    Ok(EXIT_OK)
}

/// Run `profile show`
pub fn run_profile_show(profile: &Profile, json: bool) -> Result<i32> {
    if json {
        print_json(profile)?;
    } else {
        print!("{}", toml::to_string_pretty(profile)?);
    }
    Ok(EXIT_OK)
}
