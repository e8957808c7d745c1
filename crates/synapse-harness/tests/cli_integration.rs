//! Integration tests for the synapse-check CLI.

use rstest as _;
use synapse_core as _;
use synapse_harness as _;
use thiserror as _;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("synapse-check")
}

fn create_temp_file(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn run_prints_register_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(
        temp_dir.path(),
        "count.s",
        "addi x1, x0, 5\naddi x2, x1, 2\nhalt: jal x0, halt\n",
    );

    let result = Command::new(binary_path())
        .args(["run", source.to_str().unwrap()])
        .output()
        .expect("failed to run synapse-check");

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(result.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("Retired 3 instruction(s), pc = 0x00000008 (self-loop)"));
    assert!(stdout.contains("x1 = 0x00000005"));
    assert!(stdout.contains("x2 = 0x00000007"));
}

#[test]
fn run_trace_goes_to_stderr() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "trace.s", "addi x1, x0, 1\n");

    let result = Command::new(binary_path())
        .args(["run", source.to_str().unwrap(), "-n", "1", "--trace"])
        .output()
        .expect("failed to run synapse-check");

    assert!(result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("00000000: 00100093  addi x1, x0, 1"));
    assert!(stderr.contains("x1 <- 0x00000001"));
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("(cycle limit)"));
}

#[test]
fn run_reports_fault() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "bad.s", ".word 0\n");

    let result = Command::new(binary_path())
        .args(["run", source.to_str().unwrap()])
        .output()
        .expect("failed to run synapse-check");

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("fault: illegal instruction encoding"));
}

#[test]
fn run_reports_parse_errors() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "err.s", "addi x1, x0\n");

    let result = Command::new(binary_path())
        .args(["run", source.to_str().unwrap()])
        .output()
        .expect("failed to run synapse-check");

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("error: line 1"));
}

#[test]
fn run_reports_missing_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("missing.s");

    let result = Command::new(binary_path())
        .args(["run", missing.to_str().unwrap()])
        .output()
        .expect("failed to run synapse-check");

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("failed to read"));
}

#[test]
fn test_with_passing_checks() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(
        temp_dir.path(),
        "pass.s",
        "addi x1, x0, 1\nexpect x1 == 1\nadd x2, x1, x1\nexpect x2 == 2\nexpect pc == 8\n",
    );

    let result = Command::new(binary_path())
        .args(["test", source.to_str().unwrap()])
        .output()
        .expect("failed to run synapse-check");

    let stdout = String::from_utf8_lossy(&result.stdout);
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        result.status.success(),
        "test should pass\nstdout: {stdout}\nstderr: {stderr}"
    );
    assert!(stdout.contains("PASS"));
    assert!(stdout.contains("Test Summary: 3 passed, 0 failed"));
}

#[test]
fn test_reports_failing_checks() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(
        temp_dir.path(),
        "fail.s",
        "addi x1, x0, 5\nexpect x1 == 4\n",
    );

    let result = Command::new(binary_path())
        .args(["test", source.to_str().unwrap()])
        .output()
        .expect("failed to run synapse-check");

    assert!(!result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("FAIL (line 2, cycle 1)"));
    assert!(stdout.contains("actual 0x00000005"));
}

#[test]
fn test_honours_cycle_limit() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(
        temp_dir.path(),
        "far.s",
        "nop\nexpect @5000 x1 == 0\n",
    );

    let rejected = Command::new(binary_path())
        .args(["test", source.to_str().unwrap()])
        .output()
        .expect("failed to run synapse-check");
    assert!(!rejected.status.success());
    let stderr = String::from_utf8_lossy(&rejected.stderr);
    assert!(stderr.contains("beyond the cycle limit of 1000"));

    let accepted = Command::new(binary_path())
        .args(["test", source.to_str().unwrap(), "-n", "5000"])
        .output()
        .expect("failed to run synapse-check");
    let stdout = String::from_utf8_lossy(&accepted.stdout);
    assert!(accepted.status.success(), "stdout: {stdout}");
}

#[test]
fn test_with_no_checks() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "plain.s", "nop\n");

    let result = Command::new(binary_path())
        .args(["test", source.to_str().unwrap()])
        .output()
        .expect("failed to run synapse-check");

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("No checks found"));
}

#[test]
fn alu_evaluates_by_mnemonic_and_selector() {
    let by_name = Command::new(binary_path())
        .args(["alu", "sra", "0xfffffff8", "1"])
        .output()
        .expect("failed to run synapse-check");
    assert!(by_name.status.success());
    let stdout = String::from_utf8_lossy(&by_name.stdout);
    assert!(stdout.contains("sra 0xfffffff8, 0x00000001 = 0xfffffffc"));

    let invalid = Command::new(binary_path())
        .args(["alu", "3", "5", "3"])
        .output()
        .expect("failed to run synapse-check");
    assert!(invalid.status.success());
    let stdout = String::from_utf8_lossy(&invalid.stdout);
    assert!(stdout.contains("invalid 0x00000005, 0x00000003 = 0x00000000"));
}

#[test]
fn alu_rejects_unknown_operation() {
    let result = Command::new(binary_path())
        .args(["alu", "frob", "1", "2"])
        .output()
        .expect("failed to run synapse-check");

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("unknown ALU operation 'frob'"));
}

#[test]
fn decode_prints_disassembly() {
    let result = Command::new(binary_path())
        .args(["decode", "0x4020_81b3"])
        .output()
        .expect("failed to run synapse-check");

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("0x402081b3: sub x3, x1, x2"));
}

#[test]
fn oracle_tables_pass() {
    let result = Command::new(binary_path())
        .arg("oracle")
        .output()
        .expect("failed to run synapse-check");

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(result.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("datapath oracle:"));
    assert!(stdout.contains("note: fault at cycle 13"));
    assert!(stdout.contains("alu oracle: 18 passed, 0 failed"));
}

#[test]
fn help_shows_usage() {
    let result = Command::new(binary_path())
        .arg("--help")
        .output()
        .expect("failed to run synapse-check");

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Commands:"));
    assert!(stdout.contains("oracle"));
}

#[test]
fn unknown_command_fails() {
    let result = Command::new(binary_path())
        .arg("frobnicate")
        .output()
        .expect("failed to run synapse-check");

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("unknown command"));
}
