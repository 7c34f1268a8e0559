//! Integration tests for the `mempool` binary

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn mempool() -> Command {
    let mut cmd = Command::cargo_bin("mempool").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("MEMPOOL_CONFIG");
    cmd
}

#[test]
fn list_prints_values_and_stats() {
    mempool()
        .args(["list", "--insert", "1,2,3", "--delete", "2", "--search", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list: [1, 3]"))
        .stdout(predicate::str::contains("count: 2"))
        .stdout(predicate::str::contains("search 3: found"))
        .stdout(predicate::str::contains("Pool Statistics:"));
}

#[test]
fn list_reports_missing_values() {
    mempool()
        .args(["list", "--insert", "5", "--delete", "9", "--search", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("delete 9: not in list"))
        .stdout(predicate::str::contains("search 7: not in list"));
}

#[test]
fn list_fails_when_pool_is_too_small() {
    mempool()
        .args(["list", "--size", "16", "--insert", "1,2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to insert 2"));
}

#[test]
fn inspect_merges_both_ways_by_default() {
    mempool()
        .args(["inspect", "--size", "90", "--alloc", "30,30,30", "--free", "0,1"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"\b0\s+60\s+free").unwrap())
        .stdout(predicate::str::is_match(r"\b60\s+30\s+used").unwrap());
}

#[test]
fn inspect_forward_flag_keeps_predecessor() {
    mempool()
        .args(["--coalesce", "forward", "inspect", "--size", "90", "--alloc", "30,30,30", "--free", "0,1"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"\b0\s+30\s+free").unwrap())
        .stdout(predicate::str::is_match(r"\b30\s+30\s+free").unwrap());
}

#[test]
fn inspect_reports_failed_allocation() {
    mempool()
        .args(["inspect", "--size", "64", "--alloc", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alloc #0 (100 bytes)"));
}

#[test]
fn config_file_sets_pool_policy() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[pool]\ncoalesce = \"forward\"").unwrap();

    mempool()
        .arg("--config")
        .arg(file.path())
        .args(["inspect", "--size", "90", "--alloc", "30,30,30", "--free", "0,1"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"\b30\s+30\s+free").unwrap());
}

#[test]
fn config_file_with_unknown_key_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[allocator]\nsize = 1").unwrap();

    mempool()
        .arg("--config")
        .arg(file.path())
        .args(["inspect", "--alloc", "8"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn missing_config_file_is_reported() {
    mempool()
        .args(["--config", "/nonexistent/mempool.toml", "inspect"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn stress_verifies_invariants() {
    mempool()
        .args(["stress", "--threads", "3", "--iterations", "300"])
        .assert()
        .success()
        .stdout(predicate::str::contains("invariants: ok"));
}
