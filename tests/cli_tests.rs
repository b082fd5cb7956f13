// CLI behaviour: each subcommand runs against defaults in an empty directory

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn buildbridge(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("buildbridge").unwrap();
    cmd.current_dir(dir.path()).env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_roles_lists_every_role_with_step_count() {
    let dir = TempDir::new().unwrap();
    buildbridge(&dir)
        .arg("roles")
        .assert()
        .success()
        .stdout(predicate::str::contains("individual"))
        .stdout(predicate::str::contains("3 steps"))
        .stdout(predicate::str::contains("engineering_office"))
        .stdout(predicate::str::contains("organization"));
}

#[test]
fn test_steps_for_supplier() {
    let dir = TempDir::new().unwrap();
    buildbridge(&dir)
        .args(["steps", "--role", "supplier"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Supplier onboarding"))
        .stdout(predicate::str::contains("7. "))
        .stdout(predicate::str::contains("bank_name, iban"));
}

#[test]
fn test_unknown_role_is_rejected() {
    let dir = TempDir::new().unwrap();
    buildbridge(&dir)
        .args(["steps", "--role", "banker"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown role: banker"));
}

#[test]
fn test_stage_prints_snapshot_json() {
    let dir = TempDir::new().unwrap();
    buildbridge(&dir)
        .args([
            "stage",
            "--project",
            "published",
            "--offer",
            "accepted",
            "--contract",
            "approved_awaiting_signatures",
            "--contract-id",
            "c-77",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"stage\": \"contract_signing\""))
        .stdout(predicate::str::contains("\"route\": \"/contracts/c-77/sign\""));
}

#[test]
fn test_negotiate_runs_to_signed_contract() {
    let dir = TempDir::new().unwrap();
    buildbridge(&dir)
        .arg("negotiate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed - Active"))
        .stdout(predicate::str::contains("Contract saved at version 7"));
}

#[test]
fn test_config_reads_file_and_env_overrides() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("buildbridge.toml"), "[otp]\ncode_length = 4\n").unwrap();
    buildbridge(&dir)
        .arg("config")
        .env("BUILDBRIDGE_OTP__RESEND_COOLDOWN_SECONDS", "15")
        .assert()
        .success()
        .stdout(predicate::str::contains("code_length = 4"))
        .stdout(predicate::str::contains("resend_cooldown_seconds = 15"));
}
