use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn custody(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("custody").unwrap();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .args(["--state", "ledger.json", "--payouts", "payouts.jsonl"]);
    cmd
}

fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    custody(dir.path())
        .args(["init", "--operator", "owner", "--fee-recipient", "company"])
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized"));
    dir
}

#[test]
fn deposit_send_withdraw_round() {
    let dir = initialized();

    custody(dir.path())
        .args(["deposit", "--caller", "bob", "1"])
        .assert()
        .success()
        .stdout("bob: 1\n");

    custody(dir.path())
        .args(["send", "--caller", "bob", "--to", "alice", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sent 0.999 to alice (fee 0.001 → company)"));

    custody(dir.path())
        .args(["withdraw", "--caller", "alice", "0.5"])
        .assert()
        .success()
        .stdout("alice: 0.499\n");

    custody(dir.path())
        .args(["balance", "company"])
        .assert()
        .success()
        .stdout("company: 0.001\n");

    let log = fs::read_to_string(dir.path().join("payouts.jsonl")).unwrap();
    let lines: Vec<serde_json::Value> = log
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["to"], "alice");
    assert_eq!(lines[0]["amount"], "500000000000000000");
}

#[test]
fn rejected_calls_leave_state_file_untouched() {
    let dir = initialized();
    let state = dir.path().join("ledger.json");
    let before = fs::read(&state).unwrap();

    custody(dir.path())
        .args(["withdraw", "--caller", "bob", "0.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("insufficient funds"));

    custody(dir.path())
        .args(["send", "--caller", "bob", "--to", "alice", "0.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("insufficient funds"));

    custody(dir.path())
        .args(["set-fee", "--caller", "bob", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not the operator"));

    custody(dir.path())
        .args(["set-fee", "--caller", "owner", "100000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceed base"));

    assert_eq!(fs::read(&state).unwrap(), before);
    assert!(!dir.path().join("payouts.jsonl").exists());
}

#[test]
fn operator_sets_fee_and_events_are_listed() {
    let dir = initialized();

    custody(dir.path())
        .args(["set-fee", "--caller", "owner", "1000"])
        .assert()
        .success()
        .stdout("fee rate: 1000 bps\n");

    custody(dir.path())
        .args(["--raw", "deposit", "--caller", "bob", "10000"])
        .assert()
        .success()
        .stdout("bob: 10000\n");

    custody(dir.path())
        .args(["--raw", "send", "--caller", "bob", "--to", "bob", "10000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sent 9000 to bob (fee 1000 → company)"));

    let output = custody(dir.path()).arg("events").output().unwrap();
    assert!(output.status.success());
    let events: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["type"], "fee_updated");
    assert_eq!(events[0]["fee_basis_points"], 1000);
    assert_eq!(events[2]["type"], "sent");
    assert_eq!(events[2]["amount"], "9000");
}

#[test]
fn init_refuses_to_overwrite_and_validates_rate() {
    let dir = initialized();
    custody(dir.path())
        .args(["init", "--operator", "x", "--fee-recipient", "y"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let fresh = TempDir::new().unwrap();
    custody(fresh.path())
        .args(["init", "--operator", "x", "--fee-recipient", "y", "--fee-bps", "10001"])
        .assert()
        .failure();
    assert!(!fresh.path().join("ledger.json").exists());
}

#[test]
fn corrupted_state_is_rejected() {
    let dir = initialized();
    let state = dir.path().join("ledger.json");
    let mut snapshot: serde_json::Value =
        serde_json::from_slice(&fs::read(&state).unwrap()).unwrap();
    snapshot["balances"]["mallory"] = serde_json::json!("1000");
    fs::write(&state, serde_json::to_vec(&snapshot).unwrap()).unwrap();

    custody(dir.path())
        .args(["balance", "mallory"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid snapshot"));
}
