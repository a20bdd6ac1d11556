//! Integration tests for the gridprep CLI
//!
//! These tests invoke the actual gridprep-cli binary and verify:
//! - Exit codes (0 = success, 1 = any failure)
//! - stdout/stderr output
//! - JSON output format
//! - Reading from stdin with `-`

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

// ── Helpers ───────────────────────────────────────────────

fn gridprep_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gridprep-cli"))
}

fn fixture_valid(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(format!("../../tests/fixtures/valid/{}", name))
}

fn fixture_invalid(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(format!("../../tests/fixtures/invalid/{}", name))
}

fn run_gridprep(args: &[&str]) -> std::process::Output {
    Command::new(gridprep_bin())
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to execute gridprep-cli")
}

fn run_with_stdin(args: &[&str], input: &str) -> std::process::Output {
    let mut child = Command::new(gridprep_bin())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn gridprep-cli");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for gridprep-cli")
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

// ── Version ───────────────────────────────────────────────

#[test]
fn test_version_command() {
    let output = run_gridprep(&["version"]);
    assert!(output.status.success(), "version should exit 0");
    let stdout = stdout_of(&output);
    assert!(stdout.contains("gridprep"), "should contain 'gridprep'");
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "should contain version");
    assert!(stdout.contains("gridprepass"), "should name the grammar");
}

#[test]
fn test_version_flag() {
    let output = run_gridprep(&["--version"]);
    assert!(output.status.success(), "--version should exit 0");
    assert!(stdout_of(&output).contains(env!("CARGO_PKG_VERSION")));
}

// ── Canonicalize ──────────────────────────────────────────

#[test]
fn test_canonicalize_lowercase_default() {
    let output = run_gridprep(&["canonicalize", fixture_valid("crlf.grid").to_str().unwrap()]);
    assert!(output.status.success(), "valid source should exit 0");
    assert_eq!(
        stdout_of(&output),
        "input word as text⎩1⎭\n[a1] := len(word) ⎩2⎭\n\n"
    );
}

#[test]
fn test_canonicalize_canonical_spelling() {
    let output = run_gridprep(&[
        "canonicalize",
        "--mode",
        "canonical-spelling",
        fixture_valid("crlf.grid").to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert_eq!(
        stdout_of(&output),
        "Input ❲word❳ as text  ⎩1⎭\n[❲a1❳] := ❲len❳(❲word❳)   ⎩2⎭\n\n"
    );
}

#[test]
fn test_canonicalize_keep_comments() {
    let output = run_gridprep(&[
        "canonicalize",
        "--keep-comments",
        fixture_valid("crlf.grid").to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("⎝ length⎠⎩2⎭"));
}

#[test]
fn test_canonicalize_stdin() {
    let output = run_with_stdin(&["canonicalize", "-"], "FOR x in y\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "for x in y⎩1⎭\n\n");
}

#[test]
fn test_canonicalize_json_output() {
    let output = run_gridprep(&[
        "canonicalize",
        "--json",
        fixture_valid("tyresize.grid").to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("should be valid JSON");
    assert_eq!(json["passes"], 1);
    assert_eq!(json["lines"], 18);
    assert_eq!(json["fingerprint"].as_str().map(str::len), Some(64));
    assert!(json["text"].as_str().unwrap().contains("if make = \"TOYO\" then ⎩8⎭\n"));
    assert_eq!(json["trace"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_canonicalize_trace_json() {
    let output = run_with_stdin(&["canonicalize", "--trace", "--json", "-"], "If x\n");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    let trace = json["trace"].as_array().unwrap();
    assert_eq!(trace[0]["event"], "enter");
    assert_eq!(trace[0]["production"], "Document");
    assert_eq!(trace[0]["pass"], 1);
}

#[test]
fn test_canonicalize_trace_to_stderr() {
    let output = run_with_stdin(&["canonicalize", "--trace", "-"], "x\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("enter Document"));
    assert!(stderr.contains("exit Newline"));
    assert_eq!(stdout_of(&output), "x⎩1⎭\n\n");
}

#[test]
fn test_canonicalize_config_file() {
    let dir = std::env::temp_dir().join(format!("gridprep-cli-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let config = dir.join("config.json");
    std::fs::write(&config, r#"{"mode": "canonical-spelling", "keep_comments": true}"#).unwrap();

    let output = run_with_stdin(
        &["canonicalize", "--config", config.to_str().unwrap(), "-"],
        "' note\n",
    );
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "⎝ note⎠  ⎩1⎭\n\n");

    let output = run_with_stdin(
        &[
            "canonicalize",
            "--config",
            config.to_str().unwrap(),
            "--mode",
            "lowercase",
            "-",
        ],
        "' note\n",
    );
    assert_eq!(stdout_of(&output), "⎝ note⎠⎩1⎭\n\n");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_canonicalize_bad_config_file() {
    let dir = std::env::temp_dir().join(format!("gridprep-cli-badcfg-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let config = dir.join("config.json");
    std::fs::write(&config, r#"{"max_passes": 0}"#).unwrap();

    let output = run_with_stdin(&["canonicalize", "--config", config.to_str().unwrap(), "-"], "x");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_passes"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_canonicalize_unterminated_string() {
    let output = run_gridprep(&[
        "canonicalize",
        fixture_invalid("unterminated-string.grid").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1), "syntax error should exit 1");
    assert!(output.stdout.is_empty(), "no partial output on failure");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "should mention error");
    assert!(stderr.contains("grammar = \"gridprepass\""));
    assert!(stderr.contains("Line 2, col 1"), "should point at end of input: {}", stderr);
}

#[test]
fn test_canonicalize_unknown_mode() {
    let output = run_gridprep(&[
        "canonicalize",
        "--mode",
        "upper",
        fixture_valid("crlf.grid").to_str().unwrap(),
    ]);
    assert!(!output.status.success());
}

#[test]
fn test_canonicalize_nonexistent_file() {
    let output = run_gridprep(&["canonicalize", "nonexistent.grid"]);
    assert_eq!(output.status.code(), Some(1), "missing file should exit 1");
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read"));
}

// ── Check ─────────────────────────────────────────────────

#[test]
fn test_check_valid_source() {
    let output = run_gridprep(&["check", fixture_valid("mixed-case.grid").to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("valid"));
}

#[test]
fn test_check_quiet_valid() {
    let output = run_gridprep(&[
        "--quiet",
        "check",
        fixture_valid("mixed-case.grid").to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(stdout_of(&output).is_empty(), "quiet mode should produce no stdout");
}

#[test]
fn test_check_json_valid() {
    let output = run_gridprep(&[
        "check",
        "--json",
        fixture_valid("mixed-case.grid").to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(json["valid"], true);
    assert_eq!(json["lines"], 7);
}

#[test]
fn test_check_json_invalid() {
    let output = run_gridprep(&[
        "check",
        "--json",
        fixture_invalid("unterminated-string.grid").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["error"]["kind"], "syntax");
    assert_eq!(json["error"]["detail"]["grammar"], "gridprepass");
    assert_eq!(json["error"]["detail"]["span"]["line"], 2);
}

#[test]
fn test_check_empty_source_fails() {
    let output = run_gridprep(&["check", fixture_invalid("empty.grid").to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
}

// ── Hash ──────────────────────────────────────────────────

#[test]
fn test_hash_valid_source() {
    let output = run_gridprep(&["hash", fixture_valid("tyresize.grid").to_str().unwrap()]);
    assert!(output.status.success(), "hash should exit 0");
    let stdout = stdout_of(&output).trim().to_string();
    assert_eq!(stdout.len(), 64, "SHA-256 hash should be 64 hex chars");
    assert!(stdout.chars().all(|c| c.is_ascii_hexdigit()), "hash should be hex");
}

#[test]
fn test_hash_ignores_source_casing() {
    let lower = run_with_stdin(&["hash", "-"], "let width = 195\n");
    let upper = run_with_stdin(&["hash", "-"], "LET Width = 195\n");
    assert_eq!(stdout_of(&lower), stdout_of(&upper));
}

#[test]
fn test_hash_depends_on_mode() {
    let path = fixture_valid("tyresize.grid");
    let path = path.to_str().unwrap();
    let lower = run_gridprep(&["hash", path]);
    let canonical = run_gridprep(&["hash", "--mode", "canonical-spelling", path]);
    assert_ne!(stdout_of(&lower), stdout_of(&canonical));
}

// ── All fixtures ──────────────────────────────────────────

#[test]
fn test_all_valid_fixtures_check() {
    let valid_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures/valid");

    for entry in std::fs::read_dir(&valid_dir).expect("read dir") {
        let path = entry.expect("entry").path();
        if path.extension().is_some_and(|e| e == "grid") {
            let output = run_gridprep(&["check", path.to_str().unwrap()]);
            assert!(output.status.success(), "fixture {:?} should check", path.file_name());
        }
    }
}

#[test]
fn test_all_invalid_fixtures_fail() {
    let invalid_dir =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures/invalid");

    for entry in std::fs::read_dir(&invalid_dir).expect("read dir") {
        let path = entry.expect("entry").path();
        if path.extension().is_some_and(|e| e == "grid") {
            let output = run_gridprep(&["check", path.to_str().unwrap()]);
            assert!(!output.status.success(), "fixture {:?} should fail", path.file_name());
        }
    }
}

// ── Determinism: CLI output ───────────────────────────────

#[test]
fn test_cli_canonicalize_determinism_100_iterations() {
    let path = fixture_valid("mixed-case.grid").to_str().unwrap().to_string();

    let first = run_gridprep(&["canonicalize", "--mode", "canonical-spelling", &path]);
    let first_stdout = stdout_of(&first);

    for i in 0..100 {
        let output = run_gridprep(&["canonicalize", "--mode", "canonical-spelling", &path]);
        assert_eq!(
            first_stdout,
            stdout_of(&output),
            "canonicalize determinism failure at iteration {}",
            i
        );
    }
}
