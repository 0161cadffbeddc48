//! CLI end-to-end tests that invoke the compiled `harden` binary.
//!
//! Every test points `--root` at a temporary directory laid out like `/`, so
//! nothing outside it is touched.

use std::path::Path;

use assert_cmd::Command;
use harden_test_utils::{TestTarget, fixtures};
use predicates::prelude::*;
use pretty_assertions::assert_eq;

const NO_VALIDATOR_PROFILE: &str = r#"
name = "e2e"
platform = "linux"

[[targets]]
file = "sshd"
validator = "none"

[[targets.directives]]
key = "PermitRootLogin"
value = "no"

[[targets.directives]]
key = "MACs"
value = ["hmac-sha2-512-etm@openssh.com", "hmac-sha2-256-etm@openssh.com"]
"#;

const REJECTING_PROFILE: &str = r#"
name = "e2e-reject"
platform = "linux"

[[targets]]
file = "sshd"
validator = { command = ["/bin/sh", "-c", "echo 'line 3: Bad configuration option' >&2; exit 1"] }

[[targets.directives]]
key = "PermitRootLogin"
value = "no"
"#;

// Replaces the file with a non-empty directory so it cannot be restored
const CLOBBERING_PROFILE: &str = r#"
name = "e2e-clobber"
platform = "linux"

[[targets]]
file = "sshd"

[targets.validator]
command = ["/bin/sh", "-c", "rm -f \"$0\" && mkdir -p \"$0/x\"; echo bad >&2; exit 1", "{path}"]

[[targets.directives]]
key = "PermitRootLogin"
value = "no"
"#;

/// `harden` with a clean environment rooted at `root`.
fn harden(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_harden"));
    cmd.env_remove("HARDEN_PROFILE")
        .env_remove("HARDEN_ROOT")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .arg("--root")
        .arg(root)
        .arg("--platform")
        .arg("linux");
    cmd
}

fn system() -> TestTarget {
    TestTarget::new().with_etc_ssh(fixtures::SSHD_CONFIG_RHEL, fixtures::SSH_CONFIG_DEBIAN)
}

#[test]
fn help_lists_commands() {
    Command::new(env!("CARGO_BIN_EXE_harden"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apply").and(predicate::str::contains("plan")));
}

#[test]
fn version_flag() {
    Command::new(env!("CARGO_BIN_EXE_harden"))
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("harden"));
}

#[test]
fn profile_list_includes_builtin() {
    Command::new(env!("CARGO_BIN_EXE_harden"))
        .args(["profile", "list"])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("openssh-modern"));
}

#[test]
fn profile_show_json() {
    let output = Command::new(env!("CARGO_BIN_EXE_harden"))
        .args(["profile", "show", "--json"])
        .env_remove("HARDEN_PROFILE")
        .output()
        .unwrap();
    assert!(output.status.success());

    let profile: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(profile["name"], "openssh-modern");
    assert_eq!(profile["targets"].as_array().unwrap().len(), 2);
}

#[test]
fn plan_shows_diff_and_writes_nothing() {
    let target = system();

    harden(target.root())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("+PermitRootLogin prohibit-password"))
        .stdout(predicate::str::contains("-PermitRootLogin yes"));

    assert_eq!(target.read("etc/ssh/sshd_config"), fixtures::SSHD_CONFIG_RHEL);
    assert_eq!(
        target.siblings("etc/ssh/sshd_config"),
        vec!["ssh_config", "sshd_config"]
    );
}

#[test]
fn check_reports_drift_with_exit_code() {
    let target = system();

    harden(target.root())
        .arg("check")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("DRIFTED"))
        .stdout(predicate::str::contains("harden apply"));
}

#[test]
fn apply_then_check_is_clean() {
    let target = system();
    let profile = target.write("profile.toml", NO_VALIDATOR_PROFILE);

    harden(target.root())
        .arg("--profile")
        .arg(&profile)
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"))
        .stdout(predicate::str::contains("systemctl restart sshd"));

    let hardened = target.read("etc/ssh/sshd_config");
    assert!(hardened.contains("\nPermitRootLogin no\n"));
    assert!(hardened.ends_with(
        "MACs hmac-sha2-512-etm@openssh.com,hmac-sha2-256-etm@openssh.com\n"
    ));
    assert!(
        target
            .siblings("etc/ssh/sshd_config")
            .iter()
            .any(|name| name.starts_with("sshd_config.backup."))
    );

    harden(target.root())
        .arg("--profile")
        .arg(&profile)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("hardened"));

    // A second apply changes nothing and needs no restart
    harden(target.root())
        .arg("--profile")
        .arg(&profile)
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("already hardened"))
        .stdout(predicate::str::contains("systemctl").not());
    assert_eq!(target.read("etc/ssh/sshd_config"), hardened);
}

#[cfg(unix)]
#[test]
fn rejected_change_is_rolled_back() {
    let target = system();
    let profile = target.write("profile.toml", REJECTING_PROFILE);

    harden(target.root())
        .arg("--profile")
        .arg(&profile)
        .arg("apply")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("ROLLED BACK"))
        .stdout(predicate::str::contains("Bad configuration option"));

    assert_eq!(
        target.read_bytes("etc/ssh/sshd_config"),
        fixtures::SSHD_CONFIG_RHEL.as_bytes()
    );
}

#[cfg(unix)]
#[test]
fn failed_rollback_exits_with_three() {
    let target = system();
    let profile = target.write("profile.toml", CLOBBERING_PROFILE);

    harden(target.root())
        .arg("--profile")
        .arg(&profile)
        .arg("apply")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("ROLLBACK FAILED"))
        .stdout(predicate::str::contains("sshd_config.backup."));

    // The dated backup still holds the original for manual recovery
    let backup = target
        .siblings("etc/ssh/sshd_config")
        .into_iter()
        .find(|name| name.starts_with("sshd_config.backup."))
        .unwrap();
    assert_eq!(
        target.read(&format!("etc/ssh/{backup}")),
        fixtures::SSHD_CONFIG_RHEL
    );
}

#[test]
fn apply_json_reports_each_target() {
    let target = system();
    let profile = target.write("profile.toml", NO_VALIDATOR_PROFILE);

    let output = harden(target.root())
        .arg("--profile")
        .arg(&profile)
        .args(["apply", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let first = &report[0];
    assert_eq!(first["status"], "success");
    assert_eq!(first["result"]["validation"]["status"], "skipped");
    assert_eq!(first["result"]["rolled_back"], false);
    assert_eq!(first["result"]["changes"][0]["kind"], "replaced");
    assert_eq!(first["result"]["changes"][1]["kind"], "appended");
}

#[test]
fn missing_target_fails_without_aborting() {
    let target = TestTarget::new();
    target.write("etc/ssh/ssh_config", fixtures::SSH_CONFIG_DEBIAN);

    harden(target.root())
        .arg("check")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("ERROR"))
        .stdout(predicate::str::contains("ssh_config"));
}

#[test]
fn backups_are_listed_after_apply() {
    let target = system();
    let profile = target.write("profile.toml", NO_VALIDATOR_PROFILE);

    harden(target.root())
        .arg("--profile")
        .arg(&profile)
        .arg("backups")
        .assert()
        .success()
        .stdout(predicate::str::contains("no backups"));

    harden(target.root())
        .arg("--profile")
        .arg(&profile)
        .arg("apply")
        .assert()
        .success();

    harden(target.root())
        .arg("--profile")
        .arg(&profile)
        .arg("backups")
        .assert()
        .success()
        .stdout(predicate::str::contains("sshd_config.backup."));
}

#[test]
fn unreadable_profile_is_a_user_error() {
    let target = system();

    harden(target.root())
        .arg("--profile")
        .arg(target.path("missing.toml"))
        .arg("apply")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn zero_workers_is_rejected() {
    let target = system();

    harden(target.root())
        .args(["--workers", "0", "plan"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--workers must be at least 1"));
}
