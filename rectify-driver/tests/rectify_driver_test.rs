// SPDX-License-Identifier: Apache-2.0

use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

const IMPL_BLIF: &str = "\
.model buggy
.inputs a b c
.outputs f
.names a b n1
11 1
.names n1 c f
1- 1
-1 1
.end
";

// n1 should be an XOR.
const SPEC_BLIF: &str = "\
.model golden
.inputs a b c
.outputs f
.names a b n1
10 1
01 1
.names n1 c f
1- 1
-1 1
.end
";

fn write_inputs(dir: &Path) {
    std::fs::write(dir.join("impl.blif"), IMPL_BLIF).unwrap();
    std::fs::write(dir.join("spec.blif"), SPEC_BLIF).unwrap();
}

fn run_driver(dir: &Path, args: &[&str]) -> Output {
    let driver = env!("CARGO_BIN_EXE_rectify");
    Command::new(driver)
        .current_dir(dir)
        .arg("--impl")
        .arg("impl.blif")
        .arg("--spec")
        .arg("spec.blif")
        .args(args)
        .output()
        .expect("rectify invocation should run")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn rectify_text_report() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_inputs(temp_dir.path());
    let output = run_driver(temp_dir.path(), &["--fix", "n1", "--stats"]);
    assert!(
        output.status.success(),
        "rectify failed: status={:?}\nstdout={}\nstderr={}",
        output.status,
        stdout_of(&output),
        String::from_utf8_lossy(&output.stderr),
    );
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Rectifying circuit: buggy"), "{}", stdout);
    assert!(stdout.contains("  Total parameters: 4"), "{}", stdout);
    assert!(stdout.contains("Status: SUCCESS"), "{}", stdout);
    assert!(stdout.contains("  n1: AND -> XOR"), "{}", stdout);
    assert!(stdout.contains("Circuit: golden"), "{}", stdout);
}

#[test]
fn rectify_json_output_and_rectified_blif() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_inputs(temp_dir.path());
    let output = run_driver(
        temp_dir.path(),
        &["--fix", "n1", "--json", "--check", "--output", "fixed.blif"],
    );
    assert!(output.status.success(), "{:?}", output);
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(value["report"]["success"], serde_json::json!(true));
    assert_eq!(value["report"]["fixes"][0]["gate"], serde_json::json!("n1"));
    assert_eq!(
        value["report"]["fixes"][0]["new_kind"],
        serde_json::json!("XOR")
    );
    assert_eq!(value["check_passed"], serde_json::json!(true));

    let fixed = rectify::blif::parse_blif_file(&temp_dir.path().join("fixed.blif")).unwrap();
    let spec = rectify::blif::parse_blif(SPEC_BLIF).unwrap();
    assert_eq!(
        rectify::circuit_sim::exhaustive_mismatch(&fixed, &spec).unwrap(),
        None
    );
}

#[test]
fn rectify_unknown_gate_lists_available() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_inputs(temp_dir.path());
    let output = run_driver(temp_dir.path(), &["--fix", "nope"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown gates to fix"), "{}", stderr);
    assert!(stderr.contains("available: n1, f"), "{}", stderr);
}

#[test]
fn rectify_requires_fix_selection() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_inputs(temp_dir.path());
    let output = run_driver(temp_dir.path(), &[]);
    assert!(!output.status.success());
}

#[test]
fn rectify_config_file_iteration_cap() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_inputs(temp_dir.path());
    std::fs::write(
        temp_dir.path().join("rectify.toml"),
        "max_iterations = 1\njson = true\n",
    )
    .unwrap();
    let output = run_driver(temp_dir.path(), &["--fix", "n1"]);
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(value["report"]["success"], serde_json::json!(false));
    assert_eq!(
        value["report"]["reason"],
        serde_json::json!("BudgetExhausted")
    );
    assert_eq!(value["report"]["iterations"], serde_json::json!(1));

    // The flag wins over the file.
    let output = run_driver(temp_dir.path(), &["--fix", "n1", "--max-iter", "100"]);
    assert!(output.status.success(), "{:?}", output);
}

#[test]
fn rectify_parse_error_reports_line() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_inputs(temp_dir.path());
    std::fs::write(
        temp_dir.path().join("impl.blif"),
        ".model bad\n.inputs a\n.outputs f\n.names a f\n1x 1\n.end\n",
    )
    .unwrap();
    let output = run_driver(temp_dir.path(), &["--fix-all"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 5"), "{}", stderr);
}
