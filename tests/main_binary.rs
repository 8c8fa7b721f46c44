//! Integration tests for the `asdf-yaml` binary (src/main.rs).
//!
//! Disabled under Miri and on WASI: both lack process spawning.
#![cfg(all(not(miri), not(target_os = "wasi")))]

use std::io::Write;
use std::process::Command;

/// Run the binary with `args` and return (stdout, stderr, exit_code).
fn run_binary(args: &[&str]) -> (String, String, i32) {
    let bin = env!("CARGO_BIN_EXE_asdf-yaml");
    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute binary");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    (stdout, stderr, code)
}

fn yaml_file(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn summarizes_a_valid_tree() {
    let file = yaml_file("--- !core/asdf-1.1.0\ndata: !core/ndarray-1.0.0 {shape: [2, 3]}\n");
    let (stdout, _, code) = run_binary(&[file.path().to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stdout.contains("root is mapping"), "{stdout}");
    assert!(stdout.contains("!core/ndarray-1.0.0 (1)"), "{stdout}");
    assert!(stdout.contains("Budget report:"), "{stdout}");
}

#[test]
fn missing_argument() {
    let (_, stderr, code) = run_binary(&[]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Expected a path"), "{stderr}");
}

#[test]
fn unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let (_, stderr, code) = run_binary(&[path.to_str().unwrap()]);
    assert_eq!(code, 2);
    assert!(stderr.contains("Failed to read"), "{stderr}");
}

#[test]
fn invalid_tree() {
    let file = yaml_file("a: *nowhere\n");
    let (stdout, stderr, code) = run_binary(&[file.path().to_str().unwrap()]);
    assert_eq!(code, 3);
    assert!(stderr.contains("invalid"), "{stderr}");
    assert!(!stdout.contains("Budget report:"), "{stdout}");
}
